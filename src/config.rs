use crate::models::SourceType;
use crate::overlay::OverlayBuilder;
use crate::session::PaginationState;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Rows per batch for chunked source ingestion
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Overlay collections above this many features are truncated to a prefix
pub const DEFAULT_OVERLAY_FEATURE_LIMIT: usize = 5000;

/// Rows per page when the caller has not picked a size
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of non-null values inspected before dictionary-encoding a text column
pub const COMPACTION_SAMPLE_SIZE: usize = 10;

/// Text columns are dictionary-encoded when distinct/total falls below this ratio
pub const COMPACTION_CARDINALITY_RATIO: f64 = 0.5;

/// Initial map viewport (India-wide)
pub const VIEWPORT_CENTER_LAT: f64 = 20.5937;
pub const VIEWPORT_CENTER_LON: f64 = 78.9629;
pub const VIEWPORT_ZOOM: u8 = 4;
pub const VIEWPORT_HEIGHT: u32 = 600;
pub const MAP_STYLE: &str = "carto-positron";

/// Sentinel written into missing state/district cells
pub const UNKNOWN: &str = "Unknown";

/// Locations of the raw source files plus ingestion knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub steel_plants: PathBuf,
    pub steel_plants_bf: PathBuf,
    pub geocoded_companies: PathBuf,
    pub rice_mills: PathBuf,
    /// `None` loads each source in one pass
    pub chunk_size: Option<usize>,
    pub overlay_feature_limit: usize,
    pub default_page_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            steel_plants: PathBuf::from("data/raw/steel_plant_data.csv"),
            steel_plants_bf: PathBuf::from("data/raw/steel_plant_bf_data.csv"),
            geocoded_companies: PathBuf::from("data/external/geocoded_combined_companies.csv"),
            rice_mills: PathBuf::from("data/raw/ricemills.csv"),
            chunk_size: None,
            overlay_feature_limit: DEFAULT_OVERLAY_FEATURE_LIMIT,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open pipeline config: {:?}", path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse pipeline config: {:?}", path))
    }

    /// Same configuration, loading every source in [`DEFAULT_CHUNK_SIZE`]
    /// row batches.
    pub fn chunked(mut self) -> Self {
        self.chunk_size = Some(DEFAULT_CHUNK_SIZE);
        self
    }

    pub fn overlay_builder(&self) -> OverlayBuilder {
        OverlayBuilder::new(self.overlay_feature_limit)
    }

    pub fn pagination_state(&self) -> PaginationState {
        PaginationState::with_page_size(self.default_page_size)
    }

    pub fn path_for(&self, source: SourceType) -> &Path {
        match source {
            SourceType::SteelPlants => &self.steel_plants,
            SourceType::SteelPlantsWithBf => &self.steel_plants_bf,
            SourceType::GeocodedCompanies => &self.geocoded_companies,
            SourceType::RiceMills => &self.rice_mills,
        }
    }
}
