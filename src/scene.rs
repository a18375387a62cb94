//! Scene assembly: point traces per source plus overlay layers.
//!
//! The output is a plain serializable description; drawing it is up to the
//! host's charting library.

use crate::config::{
    MAP_STYLE, UNKNOWN, VIEWPORT_CENTER_LAT, VIEWPORT_CENTER_LON, VIEWPORT_HEIGHT, VIEWPORT_ZOOM,
};
use crate::dataset::{Dataset, DISTRICT, LATITUDE, LONGITUDE, STATE};
use crate::models::SourceType;
use crate::overlay::OverlayLayer;
use crate::source::SourceAliases;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

pub const MARKER_SIZE: u8 = 10;
pub const MARKER_OPACITY: f64 = 0.8;
pub const DEFAULT_SOURCE_COLOR: &str = "#6B7280";

pub fn source_color(source: SourceType) -> &'static str {
    match source {
        SourceType::SteelPlants => "#8B5CF6",
        SourceType::SteelPlantsWithBf => "#EF4444",
        SourceType::GeocodedCompanies => "#10B981",
        SourceType::RiceMills => "#F59E0B",
    }
}

/// Trace color for a `source_type` label, grey for unrecognised labels.
pub fn label_color(label: &str) -> &'static str {
    SourceType::from_label(label).map_or(DEFAULT_SOURCE_COLOR, source_color)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub style: String,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center_lat: VIEWPORT_CENTER_LAT,
            center_lon: VIEWPORT_CENTER_LON,
            zoom: VIEWPORT_ZOOM,
            style: MAP_STYLE.to_string(),
            height: VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointTrace {
    pub source: SourceType,
    pub name: String,
    pub color: String,
    pub marker_size: u8,
    pub opacity: f64,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub hover_text: Vec<String>,
}

impl PointTrace {
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescriptor {
    pub points: Vec<PointTrace>,
    pub overlays: Vec<OverlayLayer>,
    pub viewport: Viewport,
}

impl SceneDescriptor {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize scene")
    }
}

/// First non-null display value among `columns`, else `Unknown`.
fn text_or_unknown(dataset: &Dataset, row: usize, columns: &[&str]) -> String {
    columns
        .iter()
        .find_map(|c| dataset.cell(row, c).display())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn point_trace(source: SourceType, part: &Dataset) -> Option<PointTrace> {
    let lat_column = part.column(LATITUDE)?;
    let lon_column = part.column(LONGITUDE)?;
    let name_column = SourceAliases::for_source(source).name_column(part);

    let mut trace = PointTrace {
        source,
        name: source.label().to_string(),
        color: source_color(source).to_string(),
        marker_size: MARKER_SIZE,
        opacity: MARKER_OPACITY,
        latitudes: Vec::with_capacity(part.len()),
        longitudes: Vec::with_capacity(part.len()),
        hover_text: Vec::with_capacity(part.len()),
    };

    for row in 0..part.len() {
        let (Some(lat), Some(lon)) = (lat_column.get(row).coerce_f64(), lon_column.get(row).coerce_f64())
        else {
            continue;
        };
        let name = name_column
            .and_then(|c| c.get(row).display())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let district = text_or_unknown(part, row, &[DISTRICT, "District"]);
        let state = text_or_unknown(part, row, &[STATE, "State"]);

        let hover = if source == SourceType::SteelPlantsWithBf {
            let capacity = part
                .cell(row, "Quantity")
                .display()
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "<b>{}</b><br>Capacity: {} Mtpa<br>District: {}<br>State: {}",
                name, capacity, district, state
            )
        } else {
            format!("<b>{}</b><br>District: {}<br>State: {}", name, district, state)
        };

        trace.latitudes.push(lat);
        trace.longitudes.push(lon);
        trace.hover_text.push(hover);
    }

    (!trace.is_empty()).then_some(trace)
}

/// One point trace per source present, in order of first appearance, plus
/// the given overlay layers. Rows without a source tag are not drawn.
pub fn compose(dataset: &Dataset, overlays: Vec<OverlayLayer>) -> SceneDescriptor {
    let points: Vec<PointTrace> = dataset
        .partition_by_source()
        .into_iter()
        .filter_map(|(source, part)| point_trace(source, &part))
        .collect();

    debug!(
        traces = points.len(),
        overlays = overlays.len(),
        "Composed scene"
    );

    SceneDescriptor {
        points,
        overlays,
        viewport: Viewport::default(),
    }
}
