//! Geometry collections to renderable overlay primitives.
//!
//! A collection is read as loosely typed JSON and each feature's geometry is
//! decoded on its own, so one malformed feature costs only itself. Polygons
//! keep their outer ring only. MultiPolygons yield one region per part.

use crate::config::DEFAULT_OVERLAY_FEATURE_LIMIT;
use crate::geometry::parse_geometry;
use anyhow::{Context, Result};
use geo::{Coord, Geometry, Polygon};
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

pub const MARKER_ALPHA: f64 = 0.5;
pub const FILL_ALPHA: f64 = 0.2;
pub const LINE_ALPHA: f64 = 0.8;

const POINT_MARKER_SIZE: u8 = 8;
const REGION_LINE_WIDTH: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Round-robin palette for overlay inputs.
pub const PALETTE: [OverlayColor; 6] = [
    OverlayColor::new(255, 165, 0),
    OverlayColor::new(0, 128, 255),
    OverlayColor::new(255, 0, 128),
    OverlayColor::new(0, 255, 128),
    OverlayColor::new(128, 0, 255),
    OverlayColor::new(255, 128, 0),
];

impl OverlayColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgba(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }

    pub fn marker(&self) -> String {
        self.rgba(MARKER_ALPHA)
    }

    pub fn fill(&self) -> String {
        self.rgba(FILL_ALPHA)
    }

    pub fn line(&self) -> String {
        self.rgba(LINE_ALPHA)
    }
}

/// Pairs each distinct input with a palette color, cycling after six.
/// Repeats are dropped and first-seen order is kept.
pub fn assign_colors<T: Clone + Eq + Hash>(inputs: &[T]) -> Vec<(T, OverlayColor)> {
    let mut seen = FxHashSet::default();
    inputs
        .iter()
        .filter(|input| seen.insert(*input))
        .enumerate()
        .map(|(i, input)| (input.clone(), PALETTE[i % PALETTE.len()]))
        .collect()
}

/// Features of one GeoJSON-like file, possibly cut to a prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Value>,
    pub truncated: bool,
    /// Feature count before truncation
    pub total_features: usize,
}

impl FeatureCollection {
    /// Keeps the first `max_features` features of `value["features"]`.
    pub fn from_value(value: Value, max_features: usize) -> Self {
        let mut features = match value {
            Value::Object(mut object) => match object.remove("features") {
                Some(Value::Array(features)) => features,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        let total_features = features.len();
        let truncated = total_features > max_features;
        if truncated {
            features.truncate(max_features);
        }
        Self {
            features,
            truncated,
            total_features,
        }
    }

    pub fn from_reader<R: Read>(reader: R, max_features: usize) -> Result<Self> {
        let value: Value =
            serde_json::from_reader(reader).context("Failed to parse feature collection")?;
        Ok(Self::from_value(value, max_features))
    }

    pub fn load(path: &Path, max_features: usize) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open overlay file: {:?}", path))?;
        let collection = Self::from_reader(BufReader::new(file), max_features)
            .with_context(|| format!("Failed to load overlay file: {:?}", path))?;
        if collection.truncated {
            warn!(
                path = ?path,
                total = collection.total_features,
                kept = collection.features.len(),
                "Large overlay truncated"
            );
        }
        Ok(collection)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl GeoFeature {
    pub fn from_value(feature: &Value) -> Result<Self> {
        let geometry = feature.get("geometry").context("missing geometry")?;
        let geometry = parse_geometry(geometry)?;
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            geometry,
            properties,
        })
    }

    fn label_list(&self, key: &str) -> Vec<String> {
        match self.properties.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Hover text from the `districts`/`states` properties.
    pub fn tooltip(&self, prefix: Option<&str>) -> String {
        let districts = self.label_list("districts");
        let states = self.label_list("states");

        let mut tooltip = prefix.map_or_else(String::new, |p| format!("<b>{}</b><br>", p));
        if !districts.is_empty() {
            tooltip.push_str(&format!("Districts: {}<br>", districts.join(", ")));
        }
        if !states.is_empty() {
            tooltip.push_str(&format!("States: {}", states.join(", ")));
        }
        if districts.is_empty() && states.is_empty() {
            tooltip.push_str("Location data unavailable");
        }
        tooltip
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimitiveKind {
    Marker,
    Region,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_size: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPrimitive {
    pub kind: PrimitiveKind,
    pub name: String,
    /// `(lat, lon)` pairs
    pub positions: Vec<(f64, f64)>,
    pub style: OverlayStyle,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLayer {
    pub source: String,
    pub color: OverlayColor,
    pub primitives: Vec<OverlayPrimitive>,
    pub truncated: bool,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayBuilder {
    max_features: usize,
}

impl Default for OverlayBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_FEATURE_LIMIT)
    }
}

impl OverlayBuilder {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Loads `path` and builds its layer, named after the file.
    pub fn build_file(&self, path: &Path, color: OverlayColor) -> Result<OverlayLayer> {
        let collection = FeatureCollection::load(path, self.max_features)?;
        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(self.build(&collection, &source, color))
    }

    pub fn build_value(&self, value: Value, source: &str, color: OverlayColor) -> OverlayLayer {
        let collection = FeatureCollection::from_value(value, self.max_features);
        self.build(&collection, source, color)
    }

    pub fn build(
        &self,
        collection: &FeatureCollection,
        source: &str,
        color: OverlayColor,
    ) -> OverlayLayer {
        let features = &collection.features[..collection.features.len().min(self.max_features)];
        let truncated =
            collection.truncated || collection.features.len() > self.max_features;

        let mut primitives = Vec::new();
        let mut skipped = 0;
        for (index, raw) in features.iter().enumerate() {
            match GeoFeature::from_value(raw) {
                Ok(feature) => primitives.extend(feature_primitives(&feature, source, color)),
                Err(e) => {
                    skipped += 1;
                    warn!(source, index, error = %e, "Skipped overlay feature");
                }
            }
        }

        info!(
            source,
            features = features.len(),
            primitives = primitives.len(),
            skipped,
            truncated,
            "Built overlay layer"
        );

        OverlayLayer {
            source: source.to_string(),
            color,
            primitives,
            truncated,
            skipped,
        }
    }
}

fn region(
    polygon: &Polygon<f64>,
    feature: &GeoFeature,
    name: String,
    prefix: &str,
    color: OverlayColor,
) -> Option<OverlayPrimitive> {
    let outer = polygon.exterior();
    if outer.0.is_empty() {
        return None;
    }
    Some(OverlayPrimitive {
        kind: PrimitiveKind::Region,
        name,
        positions: outer.0.iter().map(|&Coord { x, y }| (y, x)).collect(),
        style: OverlayStyle {
            fill_color: Some(color.fill()),
            line_color: Some(color.line()),
            line_width: Some(REGION_LINE_WIDTH),
            marker_color: None,
            marker_size: None,
        },
        tooltip: feature.tooltip(Some(prefix)),
    })
}

fn feature_primitives(
    feature: &GeoFeature,
    source: &str,
    color: OverlayColor,
) -> Vec<OverlayPrimitive> {
    match &feature.geometry {
        Geometry::Point(point) => vec![OverlayPrimitive {
            kind: PrimitiveKind::Marker,
            name: "GeoJSON Point".to_string(),
            positions: vec![(point.y(), point.x())],
            style: OverlayStyle {
                fill_color: None,
                line_color: None,
                line_width: None,
                marker_color: Some(color.marker()),
                marker_size: Some(POINT_MARKER_SIZE),
            },
            tooltip: feature.tooltip(None),
        }],
        Geometry::Polygon(polygon) => {
            region(polygon, feature, format!("Polygon ({})", source), "Polygon", color)
                .into_iter()
                .collect()
        }
        Geometry::MultiPolygon(parts) => parts
            .iter()
            .enumerate()
            .filter_map(|(i, polygon)| {
                let prefix = format!("MultiPolygon Part {}", i + 1);
                region(polygon, feature, format!("MultiPolygon ({})", source), &prefix, color)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_collection(n: usize) -> Value {
        let features: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [78.0 + i as f64 * 1e-4, 21.0]},
                    "properties": {}
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features})
    }

    #[test]
    fn large_collections_are_truncated_to_a_prefix() {
        let layer = OverlayBuilder::default().build_value(point_collection(6000), "pts", PALETTE[0]);
        assert!(layer.truncated);
        assert_eq!(layer.primitives.len(), 5000);
        assert_eq!(layer.primitives[0].positions, vec![(21.0, 78.0)]);

        let small = OverlayBuilder::default().build_value(point_collection(100), "pts", PALETTE[0]);
        assert!(!small.truncated);
        assert_eq!(small.primitives.len(), 100);
    }

    #[test]
    fn polygon_uses_outer_ring_only() {
        let value = json!({"features": [{
            "geometry": {"type": "Polygon", "coordinates": [
                [[77.0, 28.0], [78.0, 28.0], [78.0, 29.0], [77.0, 28.0]],
                [[77.2, 28.2], [77.3, 28.2], [77.3, 28.3], [77.2, 28.2]]
            ]},
            "properties": {"districts": ["Gurugram", "Faridabad"], "states": ["Haryana"]}
        }]});
        let layer = OverlayBuilder::default().build_value(value, "zones.geojson", PALETTE[1]);
        assert_eq!(layer.primitives.len(), 1);
        let region = &layer.primitives[0];
        assert_eq!(region.kind, PrimitiveKind::Region);
        assert_eq!(region.positions.len(), 4);
        assert_eq!(region.positions[1], (28.0, 78.0));
        assert_eq!(region.name, "Polygon (zones.geojson)");
        assert_eq!(
            region.tooltip,
            "<b>Polygon</b><br>Districts: Gurugram, Faridabad<br>States: Haryana"
        );
        assert_eq!(region.style.fill_color.as_deref(), Some("rgba(0, 128, 255, 0.2)"));
        assert_eq!(region.style.line_color.as_deref(), Some("rgba(0, 128, 255, 0.8)"));
    }

    #[test]
    fn multipolygon_parts_are_numbered() {
        let value = json!({"features": [{
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[70.0, 22.0], [71.0, 22.0], [71.0, 23.0], [70.0, 22.0]]],
                [[[72.0, 22.0], [73.0, 22.0], [73.0, 23.0], [72.0, 22.0]]]
            ]},
            "properties": {"states": ["Gujarat"]}
        }]});
        let layer = OverlayBuilder::default().build_value(value, "gj", PALETTE[2]);
        let tooltips: Vec<&str> = layer.primitives.iter().map(|p| p.tooltip.as_str()).collect();
        assert_eq!(
            tooltips,
            vec![
                "<b>MultiPolygon Part 1</b><br>States: Gujarat",
                "<b>MultiPolygon Part 2</b><br>States: Gujarat"
            ]
        );
        assert!(layer.primitives.iter().all(|p| p.name == "MultiPolygon (gj)"));
    }

    #[test]
    fn point_marker_and_missing_labels() {
        let value = json!({"features": [{
            "geometry": {"type": "Point", "coordinates": [88.3, 22.5]}
        }]});
        let layer = OverlayBuilder::default().build_value(value, "p", PALETTE[0]);
        let marker = &layer.primitives[0];
        assert_eq!(marker.kind, PrimitiveKind::Marker);
        assert_eq!(marker.name, "GeoJSON Point");
        assert_eq!(marker.positions, vec![(22.5, 88.3)]);
        assert_eq!(marker.tooltip, "Location data unavailable");
        assert_eq!(marker.style.marker_color.as_deref(), Some("rgba(255, 165, 0, 0.5)"));
    }

    #[test]
    fn malformed_features_are_skipped_not_fatal() {
        let value = json!({"features": [
            {"geometry": {"type": "Point", "coordinates": []}},
            {"geometry": {"type": "Point", "coordinates": ["a", "b"]}},
            {"geometry": {"type": "Polygon", "coordinates": [[[1.0]]]}},
            {"properties": {}},
            {"geometry": {"type": "Point", "coordinates": [80.0, 20.0]}}
        ]});
        let layer = OverlayBuilder::default().build_value(value, "mixed", PALETTE[0]);
        assert_eq!(layer.skipped, 4);
        assert_eq!(layer.primitives.len(), 1);
    }

    #[test]
    fn colors_cycle_through_palette() {
        let files: Vec<String> = (0..8).map(|i| format!("f{}.geojson", i)).collect();
        let assigned = assign_colors(&files);
        assert_eq!(assigned[0].1, PALETTE[0]);
        assert_eq!(assigned[6].1, PALETTE[0]);
        assert_eq!(assigned[7].1, PALETTE[1]);
        assert_eq!(PALETTE[4].marker(), "rgba(128, 0, 255, 0.5)");
    }

    #[test]
    fn repeated_inputs_share_one_color() {
        let files = ["a.geojson", "b.geojson", "a.geojson", "c.geojson"];
        let assigned = assign_colors(&files);
        assert_eq!(
            assigned,
            vec![
                ("a.geojson", PALETTE[0]),
                ("b.geojson", PALETTE[1]),
                ("c.geojson", PALETTE[2]),
            ]
        );
    }

    #[test]
    fn polygon_holes_are_dropped() {
        let value = json!({"features": [{
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                 [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]],
                [[]]
            ]}
        }]});
        let layer = OverlayBuilder::default().build_value(value, "holes", PALETTE[0]);
        assert_eq!(layer.skipped, 0);
        assert_eq!(layer.primitives.len(), 1);
        assert_eq!(layer.primitives[0].positions.len(), 4);
    }

    #[test]
    fn missing_features_key_is_empty() {
        let collection = FeatureCollection::from_value(json!({"type": "FeatureCollection"}), 10);
        assert!(collection.features.is_empty());
        assert!(!collection.truncated);
    }
}
