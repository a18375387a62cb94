//! Column-name reconciliation across sources.
//!
//! Sources disagree on casing and naming (`State` vs `state`, `Plant` vs
//! `Plant Name`, `detailed_district`, free-text `address`). [`normalize`]
//! makes every dataset expose both the canonical lowercase key and its
//! legacy-cased twin. Each rule only fires when its target is missing, which
//! makes the pass idempotent. A derived `state`/`district` also replaces its
//! legacy twin, so both read `Unknown` where the source was empty.

use crate::config::UNKNOWN;
use crate::dataset::{CellRef, Column, Dataset, DISTRICT, LATITUDE, LONGITUDE, STATE};
use anyhow::Result;
use tracing::debug;

/// Pairs of columns kept as mirror images when only one side exists.
const MIRRORS: &[(&str, &str)] = &[
    ("Plant Name", "Plant"),
    ("Latitude", LATITUDE),
    ("Longitude", LONGITUDE),
];

/// Second-to-last comma-separated segment of an address, trimmed.
pub fn district_from_address(address: CellRef<'_>) -> String {
    address
        .as_str()
        .filter(|a| a.contains(','))
        .and_then(|a| a.rsplit(',').nth(1))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Copy of `source` under `name`, with nulls read as [`UNKNOWN`].
fn derived_with_unknown(source: &Column, name: &str) -> Column {
    let values = source
        .cells()
        .map(|cell| Some(cell.display().unwrap_or_else(|| UNKNOWN.to_string())))
        .collect();
    Column::text(name, values)
}

fn derive_state(dataset: &Dataset) -> Column {
    let rows = dataset.len();
    ["State", "detailed_state"]
        .iter()
        .find_map(|alias| dataset.column(alias))
        .map(|source| derived_with_unknown(source, STATE))
        .unwrap_or_else(|| Column::constant_text(STATE, UNKNOWN, rows))
}

fn derive_district(dataset: &Dataset) -> Column {
    let rows = dataset.len();
    if let Some(source) = ["District", "detailed_district"]
        .iter()
        .find_map(|alias| dataset.column(alias))
    {
        return derived_with_unknown(source, DISTRICT);
    }
    match dataset.column("address") {
        Some(address) => {
            let values = address
                .cells()
                .map(|cell| Some(district_from_address(cell)))
                .collect();
            Column::text(DISTRICT, values)
        }
        None => Column::constant_text(DISTRICT, UNKNOWN, rows),
    }
}

/// Adds canonical and legacy-cased columns. Existing columns are kept,
/// except a legacy `State`/`District` whose canonical twin is derived here.
pub fn normalize(dataset: &Dataset) -> Result<Dataset> {
    let mut out = dataset.clone();

    if !out.has_column(STATE) {
        out = out.with_column(derive_state(&out))?;
        out = mirror(&out, STATE, "State")?;
    } else if !out.has_column("State") {
        out = mirror(&out, STATE, "State")?;
    }

    if !out.has_column(DISTRICT) {
        out = out.with_column(derive_district(&out))?;
        out = mirror(&out, DISTRICT, "District")?;
    } else if !out.has_column("District") {
        out = mirror(&out, DISTRICT, "District")?;
    }

    for (left, right) in MIRRORS {
        if out.has_column(left) && !out.has_column(right) {
            out = mirror(&out, left, right)?;
        } else if out.has_column(right) && !out.has_column(left) {
            out = mirror(&out, right, left)?;
        }
    }

    debug!(
        added = out.shared_columns().len() - dataset.shared_columns().len(),
        "Normalized columns"
    );
    Ok(out)
}

fn mirror(dataset: &Dataset, from: &str, to: &str) -> Result<Dataset> {
    match dataset.column(from) {
        Some(column) => dataset.with_column(column.renamed(to)),
        None => Ok(dataset.clone()),
    }
}
