//! Per-source loading: column aliases, coordinate normalization and tagging.
//!
//! Each [`SourceType`] has a static [`SourceAliases`] table listing the
//! spellings its raw files use for coordinates, names and category fields.
//! [`SourceAdapter`] reads rows through a [`RowReader`], keeps those whose
//! coordinates normalize into range, and writes canonical `latitude`,
//! `longitude` and `source_type` columns. Column types are inferred once
//! after filtering, so batch size never changes the resulting dataset.

use crate::coord::{normalize_pair, PairOutcome};
use crate::dataset::{Cell, CellRef, Column, Dataset, LATITUDE, LONGITUDE, SOURCE_TYPE};
use crate::models::SourceType;
use crate::reader::{CsvRowReader, RowReader};
use crate::stats::LoadStats;
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Column holding the reason a row was rejected, in the audit dataset.
pub const REJECTION_REASON: &str = "rejection_reason";

const OPERATIONAL_STATUS: &[&str] = &["Operational", "Operational Status", "Status"];
const FURNACE_TYPE: &[&str] = &["Furnance", "Furnace Type", "Furnace_Type"];

/// Column spellings used by one source.
#[derive(Debug)]
pub struct SourceAliases {
    pub latitude: &'static [&'static str],
    pub longitude: &'static [&'static str],
    pub name: &'static [&'static str],
    pub capacity: &'static [&'static str],
    pub furnace_type: &'static [&'static str],
    pub operational_status: &'static [&'static str],
    /// Fall back to substring matching on headers for coordinates and names
    pub fuzzy: bool,
}

static STEEL_PLANTS: SourceAliases = SourceAliases {
    latitude: &["Latitude"],
    longitude: &["Longitude"],
    name: &["Plant Name", "Plant"],
    capacity: &["Capacity"],
    furnace_type: FURNACE_TYPE,
    operational_status: OPERATIONAL_STATUS,
    fuzzy: false,
};

static STEEL_PLANTS_BF: SourceAliases = SourceAliases {
    latitude: &["Latitude"],
    longitude: &["Longitude"],
    name: &["Plant", "Plant Name"],
    capacity: &["Quantity", "Capacity"],
    furnace_type: FURNACE_TYPE,
    operational_status: OPERATIONAL_STATUS,
    fuzzy: false,
};

static GEOCODED_COMPANIES: SourceAliases = SourceAliases {
    latitude: &["Latitude", "latitude", "lat"],
    longitude: &["Longitude", "longitude", "lng", "lon"],
    name: &["Company_Name", "Company Name", "Company"],
    capacity: &["Capacity"],
    furnace_type: FURNACE_TYPE,
    operational_status: OPERATIONAL_STATUS,
    fuzzy: true,
};

static RICE_MILLS: SourceAliases = SourceAliases {
    latitude: &["lat"],
    longitude: &["lng"],
    name: &["name"],
    capacity: &["Capacity", "capacity"],
    furnace_type: &[],
    operational_status: OPERATIONAL_STATUS,
    fuzzy: false,
};

const NAME_HINTS: &[&str] = &["company", "name", "firm", "business"];
const DERIVED_COLUMNS: &[&str] = &[SOURCE_TYPE, LATITUDE, LONGITUDE, "state", "district"];

/// Exact match over all candidates first, then case-insensitive.
fn position_of(headers: &[&str], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| headers.iter().position(|h| h == c))
        .or_else(|| {
            candidates.iter().find_map(|c| {
                headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(c))
            })
        })
}

fn position_containing(headers: &[&str], needles: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let lower = h.to_lowercase();
        needles.iter().any(|n| lower.contains(n))
    })
}

impl SourceAliases {
    pub fn for_source(source: SourceType) -> &'static SourceAliases {
        match source {
            SourceType::SteelPlants => &STEEL_PLANTS,
            SourceType::SteelPlantsWithBf => &STEEL_PLANTS_BF,
            SourceType::GeocodedCompanies => &GEOCODED_COMPANIES,
            SourceType::RiceMills => &RICE_MILLS,
        }
    }

    /// Indices of the raw latitude and longitude headers.
    pub fn coordinate_positions(&self, headers: &[String]) -> Option<(usize, usize)> {
        let names: Vec<&str> = headers.iter().map(String::as_str).collect();
        let mut lat = position_of(&names, self.latitude);
        let mut lon = position_of(&names, self.longitude);
        if self.fuzzy {
            lat = lat.or_else(|| position_containing(&names, &["lat"]));
            lon = lon.or_else(|| position_containing(&names, &["lon", "lng"]));
        }
        Some((lat?, lon?))
    }

    /// First column present among `candidates`.
    pub fn resolve<'d>(&self, dataset: &'d Dataset, candidates: &[&str]) -> Option<&'d Column> {
        let names: Vec<&str> = dataset.column_names().collect();
        let pos = position_of(&names, candidates)?;
        dataset.columns().nth(pos)
    }

    /// Column naming each record. Sources with fuzzy headers fall back to the
    /// first raw column mentioning a company or name, then the first raw
    /// column.
    pub fn name_column<'d>(&self, dataset: &'d Dataset) -> Option<&'d Column> {
        if let Some(column) = self.resolve(dataset, self.name) {
            return Some(column);
        }
        if !self.fuzzy {
            return None;
        }
        let raw: Vec<&Column> = dataset
            .columns()
            .filter(|c| !DERIVED_COLUMNS.contains(&c.name()))
            .collect();
        let names: Vec<&str> = raw.iter().map(|c| c.name()).collect();
        position_containing(&names, NAME_HINTS)
            .map(|pos| raw[pos])
            .or_else(|| raw.first().copied())
    }
}

/// Result of loading one source. Failures are reported here rather than
/// returned, and leave `dataset` empty.
#[derive(Debug)]
pub struct SourceLoad {
    pub source: SourceType,
    pub dataset: Dataset,
    /// Rows dropped for bad coordinates, with their raw columns
    pub rejected: Dataset,
    pub stats: LoadStats,
    pub error: Option<anyhow::Error>,
}

impl SourceLoad {
    fn failed(source: SourceType, stats: LoadStats, err: anyhow::Error) -> Self {
        error!(source = %source, error = %format!("{:#}", err), "Failed to load source");
        Self {
            source,
            dataset: Dataset::empty(),
            rejected: Dataset::empty(),
            stats,
            error: Some(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SourceAdapter {
    source: SourceType,
    aliases: &'static SourceAliases,
}

impl SourceAdapter {
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            aliases: SourceAliases::for_source(source),
        }
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    /// Reads the whole input in one pass.
    pub fn load(&self, reader: &mut dyn RowReader) -> SourceLoad {
        self.load_batched(reader, usize::MAX)
    }

    /// Reads the input `chunk_size` rows at a time. The result equals
    /// [`load`](Self::load) for the same input.
    pub fn load_chunked(&self, reader: &mut dyn RowReader, chunk_size: usize) -> SourceLoad {
        self.load_batched(reader, chunk_size.max(1))
    }

    /// Opens a CSV file and loads it, chunked when `chunk_size` is set.
    pub fn load_path(&self, path: &Path, chunk_size: Option<usize>) -> SourceLoad {
        let mut reader = match CsvRowReader::open(path) {
            Ok(reader) => reader,
            Err(e) => return SourceLoad::failed(self.source, LoadStats::new(), e),
        };
        match chunk_size {
            Some(size) => self.load_chunked(&mut reader, size),
            None => self.load(&mut reader),
        }
    }

    fn load_batched(&self, reader: &mut dyn RowReader, batch_size: usize) -> SourceLoad {
        let mut stats = LoadStats::new();
        match self.read_rows(reader, batch_size, &mut stats) {
            Ok((dataset, rejected)) => {
                info!(
                    source = %self.source,
                    rows_read = stats.rows_read,
                    kept = stats.rows_kept,
                    unparsable = stats.dropped_unparsable,
                    out_of_range = stats.dropped_out_of_range,
                    batches = stats.batches,
                    "Source loaded"
                );
                SourceLoad {
                    source: self.source,
                    dataset,
                    rejected,
                    stats,
                    error: None,
                }
            }
            Err(e) => SourceLoad::failed(self.source, stats, e),
        }
    }

    fn read_rows(
        &self,
        reader: &mut dyn RowReader,
        batch_size: usize,
        stats: &mut LoadStats,
    ) -> Result<(Dataset, Dataset)> {
        let headers = reader.headers().to_vec();
        let (lat_pos, lon_pos) = self.aliases.coordinate_positions(&headers).ok_or_else(|| {
            anyhow!(
                "No coordinate columns for {} (looked for {:?} / {:?})",
                self.source,
                self.aliases.latitude,
                self.aliases.longitude
            )
        })?;

        let mut kept = Vec::new();
        let mut latitudes = Vec::new();
        let mut longitudes = Vec::new();
        let mut rejected = Vec::new();
        let mut reasons = Vec::new();

        loop {
            let batch = reader.next_batch(batch_size)?;
            if batch.is_empty() {
                break;
            }
            stats.inc_batches();
            stats.add_read(batch.len() as u64);
            debug!(source = %self.source, rows = batch.len(), "Read batch");

            for row in batch {
                let lat = row.get(lat_pos).map_or(CellRef::Null, Cell::view);
                let lon = row.get(lon_pos).map_or(CellRef::Null, Cell::view);
                match normalize_pair(lat, lon) {
                    PairOutcome::Valid(lat, lon) => {
                        stats.inc_kept();
                        latitudes.push(Some(lat));
                        longitudes.push(Some(lon));
                        kept.push(row);
                    }
                    PairOutcome::Unparsable => {
                        stats.inc_unparsable();
                        reasons.push(Some("unparsable".to_string()));
                        rejected.push(row);
                    }
                    PairOutcome::OutOfRange => {
                        stats.inc_out_of_range();
                        reasons.push(Some("out_of_range".to_string()));
                        rejected.push(row);
                    }
                }
            }
        }

        if stats.dropped() > 0 {
            warn!(
                source = %self.source,
                dropped = stats.dropped(),
                "Dropped rows with invalid coordinates"
            );
        }

        let count = kept.len();
        let dataset = Dataset::from_rows(&headers, kept)
            .with_column(Column::float(LATITUDE, latitudes))?
            .with_column(Column::float(LONGITUDE, longitudes))?
            .with_column(Column::constant_text(SOURCE_TYPE, self.source.label(), count))?;
        let rejected = Dataset::from_rows(&headers, rejected)
            .with_column(Column::text(REJECTION_REASON, reasons))?;

        Ok((dataset, rejected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::InMemoryRows;

    fn steel_rows() -> InMemoryRows {
        InMemoryRows::new(
            &["Plant Name", "Latitude", "Longitude", "Capacity"],
            &[
                &["Tata Steel", "22°48'0\"N", "86°12'0\"E", "10"],
                &["Bad Plant", "north", "86.0", "2"],
                &["Far Plant", "95.0", "86.0", "3"],
                &["JSW", "15.17", "76.67", "12"],
            ],
        )
    }

    #[test]
    fn steel_adapter_normalizes_and_tags() {
        let load = SourceAdapter::new(SourceType::SteelPlants).load(&mut steel_rows());
        assert!(load.is_ok());
        let ds = &load.dataset;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, SOURCE_TYPE), CellRef::Text("Steel Plants"));
        let lat = ds.cell(0, LATITUDE).as_f64().unwrap();
        assert!((lat - 22.8).abs() < 1e-9);
        assert_eq!(ds.cell(1, LONGITUDE), CellRef::Float(76.67));
        assert_eq!(ds.cell(1, "Plant Name"), CellRef::Text("JSW"));
    }

    #[test]
    fn rejected_rows_are_audited() {
        let load = SourceAdapter::new(SourceType::SteelPlants).load(&mut steel_rows());
        assert_eq!(load.stats.rows_read, 4);
        assert_eq!(load.stats.rows_kept, 2);
        assert_eq!(load.stats.dropped_unparsable, 1);
        assert_eq!(load.stats.dropped_out_of_range, 1);
        assert!(load.stats.is_balanced());

        assert_eq!(load.rejected.len(), 2);
        assert_eq!(load.rejected.cell(0, "Plant Name"), CellRef::Text("Bad Plant"));
        assert_eq!(load.rejected.cell(0, REJECTION_REASON), CellRef::Text("unparsable"));
        assert_eq!(load.rejected.cell(1, REJECTION_REASON), CellRef::Text("out_of_range"));
    }

    #[test]
    fn chunked_equals_single_pass() {
        let adapter = SourceAdapter::new(SourceType::SteelPlants);
        let whole = adapter.load(&mut steel_rows());
        for size in [1, 2, 3, 4, 100] {
            let chunked = adapter.load_chunked(&mut steel_rows(), size);
            assert_eq!(chunked.dataset, whole.dataset, "chunk size {}", size);
        }
        assert_eq!(adapter.load_chunked(&mut steel_rows(), 1).stats.batches, 4);
    }

    #[test]
    fn rice_mills_use_lat_lng() {
        let mut rows = InMemoryRows::new(
            &["name", "lat", "lng"],
            &[&["Mill A", "29.1", "75.7"], &["Mill B", "", "75.0"]],
        );
        let load = SourceAdapter::new(SourceType::RiceMills).load(&mut rows);
        assert_eq!(load.dataset.len(), 1);
        assert_eq!(load.dataset.cell(0, LATITUDE), CellRef::Float(29.1));
        assert_eq!(load.stats.dropped_unparsable, 1);
    }

    #[test]
    fn geocoded_companies_match_coordinate_substrings() {
        let mut rows = InMemoryRows::new(
            &["Firm", "geo_lat", "geo_lng"],
            &[&["Acme", "19.0", "72.8"]],
        );
        let load = SourceAdapter::new(SourceType::GeocodedCompanies).load(&mut rows);
        assert!(load.is_ok());
        assert_eq!(load.dataset.cell(0, LONGITUDE), CellRef::Float(72.8));
        let aliases = SourceAliases::for_source(SourceType::GeocodedCompanies);
        assert_eq!(aliases.name_column(&load.dataset).map(Column::name), Some("Firm"));
    }

    #[test]
    fn coordinate_aliases_fall_back_to_case_insensitive() {
        let headers = vec!["LATITUDE".to_string(), "longitude".to_string()];
        let aliases = SourceAliases::for_source(SourceType::SteelPlants);
        assert_eq!(aliases.coordinate_positions(&headers), Some((0, 1)));
    }

    #[test]
    fn missing_coordinate_columns_is_reported() {
        let mut rows = InMemoryRows::new(&["name", "x"], &[&["Mill", "1"]]);
        let load = SourceAdapter::new(SourceType::RiceMills).load(&mut rows);
        assert!(load.error.is_some());
        assert!(load.dataset.is_empty());
    }

    #[test]
    fn missing_file_yields_empty_dataset_and_error() {
        let load = SourceAdapter::new(SourceType::RiceMills)
            .load_path(Path::new("/nonexistent/ricemills.csv"), None);
        assert!(!load.is_ok());
        assert!(load.dataset.is_empty());
        assert_eq!(load.stats, LoadStats::new());
    }

    #[test]
    fn empty_input_keeps_headers() {
        let mut rows = InMemoryRows::new(&["name", "lat", "lng"], &[]);
        let load = SourceAdapter::new(SourceType::RiceMills).load(&mut rows);
        assert!(load.is_ok());
        assert!(load.dataset.is_empty());
        assert!(load.dataset.has_column(SOURCE_TYPE));
        assert_eq!(load.stats.batches, 0);
    }
}
