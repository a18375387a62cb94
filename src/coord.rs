//! Coordinate parsing into decimal degrees.
//!
//! Accepts numeric cells, numeric text and sexagesimal text such as
//! `26°55'0"N`. Range checks are left to callers, since the sign of a
//! sexagesimal value depends on its direction token.

use crate::dataset::CellRef;

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Decimal degrees for a cell, or `None` when it cannot be parsed.
pub fn normalize(value: CellRef<'_>) -> Option<f64> {
    match value {
        CellRef::Null => None,
        CellRef::Text(s) => parse_coordinate(s),
        other => other.as_f64(),
    }
}

/// Parses a coordinate string. Text containing a degree sign is read as
/// `D°M'S"dir`; anything else must parse as a plain float.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    if raw.contains('°') {
        return parse_sexagesimal(raw);
    }
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_sexagesimal(raw: &str) -> Option<f64> {
    let spaced = raw.replace(['°', '\'', '"'], " ");
    let mut parts = spaced.split_whitespace();

    let degrees: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let direction = parts.next()?;

    let magnitude = degrees as f64 + minutes as f64 / 60.0 + seconds / 3600.0;
    match direction {
        "N" | "E" => Some(magnitude),
        "S" | "W" => Some(-magnitude),
        _ => None,
    }
}

pub fn is_valid_latitude(lat: f64) -> bool {
    (MIN_LAT..=MAX_LAT).contains(&lat)
}

pub fn is_valid_longitude(lon: f64) -> bool {
    (MIN_LON..=MAX_LON).contains(&lon)
}

/// Normalizes a latitude/longitude pair and keeps it only if both values
/// fall inside the valid ranges.
pub fn normalize_pair(lat: CellRef<'_>, lon: CellRef<'_>) -> PairOutcome {
    match (normalize(lat), normalize(lon)) {
        (Some(lat), Some(lon)) if is_valid_latitude(lat) && is_valid_longitude(lon) => {
            PairOutcome::Valid(lat, lon)
        }
        (Some(_), Some(_)) => PairOutcome::OutOfRange,
        _ => PairOutcome::Unparsable,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    Valid(f64, f64),
    Unparsable,
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn numeric_strings_match_float_parsing() {
        for s in ["12.5", "-7", "0", " 88.25 ", "1e1", "-179.999"] {
            assert_eq!(parse_coordinate(s), s.trim().parse::<f64>().ok());
        }
    }

    #[test]
    fn sexagesimal_north_and_south() {
        let north = parse_coordinate("26°55'0\"N").unwrap();
        let south = parse_coordinate("26°55'0\"S").unwrap();
        assert!(approx(north, 26.9167));
        assert!(approx(south, -26.9167));
    }

    #[test]
    fn sign_applies_after_combining_parts() {
        // -(75 + 30/60 + 36/3600), not -75 + 0.5 + 0.01
        let west = parse_coordinate("75°30'36\"W").unwrap();
        assert!(approx(west, -75.51));
    }

    #[test]
    fn sexagesimal_with_spaces_and_fractional_seconds() {
        let east = parse_coordinate("86° 12' 7.2\" E").unwrap();
        assert!(approx(east, 86.202));
    }

    #[test]
    fn malformed_input_is_none() {
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("north"), None);
        assert_eq!(parse_coordinate("26°55'N"), None);
        assert_eq!(parse_coordinate("26.5°55'0\"N"), None);
        assert_eq!(parse_coordinate("26°55'0\"X"), None);
        assert_eq!(parse_coordinate("NaN"), None);
    }

    #[test]
    fn range_is_not_checked_by_the_parser() {
        assert_eq!(parse_coordinate("123.0"), Some(123.0));
        assert_eq!(parse_coordinate("95°0'0\"N"), Some(95.0));
    }

    #[test]
    fn numeric_cells_pass_through() {
        assert_eq!(normalize(CellRef::Int(22)), Some(22.0));
        assert_eq!(normalize(CellRef::Float(-8.5)), Some(-8.5));
        assert_eq!(normalize(CellRef::Null), None);
    }

    #[test]
    fn pair_outcomes() {
        assert_eq!(
            normalize_pair(CellRef::Float(22.5), CellRef::Text("88°0'0\"E")),
            PairOutcome::Valid(22.5, 88.0)
        );
        assert_eq!(
            normalize_pair(CellRef::Float(91.0), CellRef::Float(10.0)),
            PairOutcome::OutOfRange
        );
        assert_eq!(
            normalize_pair(CellRef::Text("bad"), CellRef::Float(10.0)),
            PairOutcome::Unparsable
        );
    }
}
