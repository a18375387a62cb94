//! Overlay files on disk: truncation, enrichment, skipped features and the
//! metadata catalog that describes them.

use plantatlas::metadata::MetadataCatalog;
use plantatlas::overlay::{assign_colors, FeatureCollection, OverlayBuilder, PrimitiveKind, PALETTE};
use plantatlas::region::{classify, enrich_collection};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn points(n: usize) -> Value {
    let features: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [75.0 + (i % 10) as f64 * 0.1, 20.0]},
                "properties": {}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

#[test]
fn large_file_is_truncated_to_limit() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "big.geojson", &points(6000));

    let layer = OverlayBuilder::default().build_file(&path, PALETTE[0]).unwrap();
    assert!(layer.truncated);
    assert_eq!(layer.primitives.len(), 5000);
    assert_eq!(layer.source, "big.geojson");

    let collection = FeatureCollection::load(&path, 5000).unwrap();
    assert_eq!(collection.total_features, 6000);
}

#[test]
fn small_file_is_kept_whole() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "small.geojson", &points(100));

    let layer = OverlayBuilder::default().build_file(&path, PALETTE[1]).unwrap();
    assert!(!layer.truncated);
    assert_eq!(layer.primitives.len(), 100);
    assert!(layer.primitives.iter().all(|p| p.kind == PrimitiveKind::Marker));
}

#[test]
fn limit_is_configurable() {
    let dir = TempDir::new().unwrap();
    let path = write_json(dir.path(), "pts.geojson", &points(100));
    let layer = OverlayBuilder::new(40).build_file(&path, PALETTE[2]).unwrap();
    assert!(layer.truncated);
    assert_eq!(layer.primitives.len(), 40);
}

#[test]
fn malformed_features_are_skipped() {
    let collection = json!({"features": [
        {"geometry": {"type": "Point", "coordinates": [80.0, 20.0]}},
        {"geometry": {"type": "Point", "coordinates": []}},
        {"geometry": {"type": "LineString", "coordinates": [[80.0, 20.0], [81.0, 21.0]]}},
        {"properties": {}},
    ]});
    let layer = OverlayBuilder::default().build_value(collection, "mixed", PALETTE[3]);
    assert_eq!(layer.primitives.len(), 1);
    assert_eq!(layer.skipped, 3);
}

#[test]
fn enriched_tooltips_carry_region_labels() {
    let raw = json!({"features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [77.5, 34.2]}, "properties": {}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [80.0, 20.0]},
         "properties": {"states": ["Custom"]}},
    ]});
    let enriched = enrich_collection(&raw);
    let expected = classify(34.2, 77.5);
    assert_eq!(
        enriched["features"][0]["properties"]["states"],
        Value::from(expected.states.clone())
    );
    assert_eq!(enriched["features"][1]["properties"]["states"], json!(["Custom"]));
    assert!(enriched["features"][1]["properties"].get("districts").is_none());

    let layer = OverlayBuilder::default().build_value(enriched, "pts", PALETTE[4]);
    assert!(layer.primitives[0]
        .tooltip
        .contains(&format!("States: {}", expected.states.join(", "))));
    assert!(layer.primitives[1].tooltip.contains("States: Custom"));
}

#[test]
fn colors_cycle_through_palette() {
    let files: Vec<String> = (0..8).map(|i| format!("f{}.geojson", i)).collect();
    let colored = assign_colors(&files);
    assert_eq!(colored[0].1, PALETTE[0]);
    assert_eq!(colored[6].1, PALETTE[0]);
    assert_eq!(colored[7].1, PALETTE[1]);
}

#[test]
fn metadata_names_original_files() {
    let dir = TempDir::new().unwrap();
    let path = write_json(
        dir.path(),
        "meta.json",
        &json!({
            "enhanced_kilns.geojson": {"source": "Survey", "recorded_time": "2021"},
            "enhanced_mines.geojson": {"original": "mines_raw.geojson"}
        }),
    );
    let catalog = MetadataCatalog::load(&path).unwrap();
    let kilns = catalog.get("enhanced_kilns.geojson").unwrap();
    assert_eq!(kilns.original.as_deref(), Some("kilns.geojson"));
    assert_eq!(kilns.recorded_time_or_default(), "2021");
    assert_eq!(
        catalog.get("enhanced_mines.geojson").and_then(|m| m.original.as_deref()),
        Some("mines_raw.geojson")
    );
}
