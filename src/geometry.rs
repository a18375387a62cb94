//! GeoJSON geometry decoding shared by overlay building and region labelling.
//!
//! Geometries are decoded with `geojson` and converted to `geo` types once;
//! callers work on [`geo::Geometry`] from then on.

use anyhow::{anyhow, bail, Context, Result};
use geo::{Centroid, Geometry, MultiPolygon, Point, Polygon};
use serde_json::Value;

fn is_empty_coordinates(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Decodes one GeoJSON geometry object. Only Point, Polygon and
/// MultiPolygon are accepted; empty coordinates are an error.
pub fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    if value.get("coordinates").map_or(true, is_empty_coordinates) {
        bail!("empty coordinates");
    }
    let geometry =
        geojson::Geometry::from_json_value(value.clone()).context("invalid geometry")?;
    match geometry.value {
        geojson::Value::Point(_) | geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {}
        _ => bail!(
            "unsupported geometry type {}",
            value.get("type").and_then(Value::as_str).unwrap_or("unknown")
        ),
    }
    geometry
        .value
        .try_into()
        .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))
}

fn outer(polygon: &Polygon<f64>) -> Polygon<f64> {
    Polygon::new(polygon.exterior().clone(), vec![])
}

/// The point itself, or the area-weighted centroid of the outer rings.
/// Holes are ignored. Other geometry kinds have no centroid.
pub fn outer_centroid(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    match geometry {
        Geometry::Point(point) => Some(*point),
        Geometry::Polygon(polygon) => outer(polygon).centroid(),
        Geometry::MultiPolygon(parts) => {
            MultiPolygon::new(parts.iter().map(outer).collect()).centroid()
        }
        _ => None,
    }
}
