//! Compound row filters over a fused dataset.
//!
//! Every active predicate is AND-ed. A predicate whose column is missing
//! from the dataset is skipped rather than treated as "no match".

use crate::dataset::{Column, Dataset, DISTRICT, SOURCE_TYPE, STATE};
use crate::models::SourceType;
use anyhow::{Context, Result};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::debug;

/// Columns searched by the name filter
pub const NAME_COLUMNS: &[&str] = &["Plant Name", "Plant", "name", "Company_Name"];

/// Candidate columns for the operational-status filter, in priority order
pub const OPERATIONAL_COLUMNS: &[&str] = &["Operational", "Operational Status", "Status"];

/// Candidate columns for the furnace-type token filter, in priority order
pub const FURNACE_COLUMNS: &[&str] = &["Furnance", "Furnace Type", "Furnace_Type"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub sources: Vec<SourceType>,
    pub states: Vec<String>,
    pub districts: Vec<String>,
    /// Case-insensitive substring of any name column
    pub name: Option<String>,
    pub operational: Vec<String>,
    /// Overrides the column picked from [`OPERATIONAL_COLUMNS`]
    pub operational_column: Option<String>,
    /// Whole-word tokens matched inside comma-joined furnace descriptions
    pub furnace_types: Vec<String>,
    /// Overrides the column picked from [`FURNACE_COLUMNS`]
    pub furnace_column: Option<String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_query(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// True when no predicate would remove a row.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
            && self.states.is_empty()
            && self.districts.is_empty()
            && self.name_query().is_none()
            && self.operational.is_empty()
            && self.furnace_types.is_empty()
    }
}

fn first_present<'d>(dataset: &'d Dataset, candidates: &[&str]) -> Option<&'d Column> {
    candidates.iter().find_map(|name| dataset.column(name))
}

pub fn operational_column<'d>(dataset: &'d Dataset, override_name: Option<&str>) -> Option<&'d Column> {
    match override_name {
        Some(name) => dataset.column(name),
        None => first_present(dataset, OPERATIONAL_COLUMNS),
    }
}

pub fn furnace_column<'d>(dataset: &'d Dataset, override_name: Option<&str>) -> Option<&'d Column> {
    match override_name {
        Some(name) => dataset.column(name),
        None => first_present(dataset, FURNACE_COLUMNS),
    }
}

/// Case-insensitive whole-word matcher for any of `tokens`.
pub fn token_matcher(tokens: &[String]) -> Result<Option<Regex>> {
    let escaped: Vec<String> = tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .with_context(|| format!("Failed to compile token pattern: {}", pattern))
}

fn retain_in(dataset: &Dataset, column: Option<&Column>, selected: &[String]) -> Dataset {
    let Some(column) = column else {
        return dataset.clone();
    };
    let selected: FxHashSet<&str> = selected.iter().map(String::as_str).collect();
    dataset.filter_rows(|row| {
        column
            .get(row)
            .display()
            .is_some_and(|v| selected.contains(v.as_str()))
    })
}

/// Applies every active predicate. With nothing selected the input comes
/// back unchanged; no match gives an empty dataset.
pub fn apply_filters(dataset: &Dataset, filters: &FilterSet) -> Result<Dataset> {
    if filters.is_empty() {
        return Ok(dataset.clone());
    }
    let mut out = dataset.clone();

    if !filters.sources.is_empty() {
        let labels: Vec<String> = filters.sources.iter().map(|s| s.label().to_string()).collect();
        out = retain_in(&out, out.column(SOURCE_TYPE), &labels);
    }
    if !filters.states.is_empty() {
        out = retain_in(&out, out.find_column(STATE), &filters.states);
    }
    if !filters.districts.is_empty() {
        out = retain_in(&out, out.find_column(DISTRICT), &filters.districts);
    }

    if let Some(query) = filters.name_query() {
        let needle = query.to_lowercase();
        let columns: Vec<&Column> = NAME_COLUMNS.iter().filter_map(|n| out.column(n)).collect();
        if !columns.is_empty() {
            out = out.filter_rows(|row| {
                columns.iter().any(|c| {
                    c.get(row)
                        .as_str()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
                })
            });
        }
    }

    if !filters.operational.is_empty() {
        let column = operational_column(&out, filters.operational_column.as_deref());
        out = retain_in(&out, column, &filters.operational);
    }

    if let Some(matcher) = token_matcher(&filters.furnace_types)? {
        if let Some(column) = furnace_column(&out, filters.furnace_column.as_deref()) {
            out = out.filter_rows(|row| {
                column
                    .get(row)
                    .display()
                    .is_some_and(|v| matcher.is_match(&v))
            });
        }
    }

    debug!(before = dataset.len(), after = out.len(), "Applied filters");
    Ok(out)
}

/// Distinct non-null values of a column in first-seen order.
pub fn distinct_values(dataset: &Dataset, column: &str) -> Vec<String> {
    let Some(column) = dataset.find_column(column) else {
        return Vec::new();
    };
    let mut seen = FxHashSet::default();
    column
        .cells()
        .filter_map(|cell| cell.display())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Sorted unique tokens of a comma-joined column such as furnace types.
pub fn combination_tokens(dataset: &Dataset, column: &str) -> Vec<String> {
    let Some(column) = dataset.column(column) else {
        return Vec::new();
    };
    let tokens: BTreeSet<String> = column
        .cells()
        .filter_map(|cell| cell.display())
        .flat_map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    tokens.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, CellRef};

    fn plants() -> Dataset {
        let headers: Vec<String> = ["Plant Name", "state", "district", "Operational", "Furnance", SOURCE_TYPE]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = [
            ["Tata Steel Jamshedpur", "Jharkhand", "East Singhbhum", "Yes", "BF, EAF", "Steel Plants"],
            ["JSW Vijayanagar", "Karnataka", "Bellary", "Yes", "BF", "Steel Plants"],
            ["tata metaliks", "West Bengal", "Kharagpur", "No", "MBF", "Steel Plants"],
            ["SAIL Bhilai", "Chhattisgarh", "Durg", "Yes", "EAF, IF", "Steel Plants with BF"],
        ];
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|v| Cell::parse(v)).collect())
            .collect();
        Dataset::from_rows(&headers, rows)
    }

    fn names(ds: &Dataset) -> Vec<String> {
        ds.column("Plant Name")
            .unwrap()
            .cells()
            .filter_map(|c| c.display())
            .collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let ds = plants();
        assert_eq!(apply_filters(&ds, &FilterSet::new()).unwrap(), ds);
        let blank_name = FilterSet {
            name: Some(String::new()),
            ..FilterSet::default()
        };
        assert_eq!(apply_filters(&ds, &blank_name).unwrap(), ds);
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let filters = FilterSet {
            name: Some("Tata".into()),
            ..FilterSet::default()
        };
        let out = apply_filters(&plants(), &filters).unwrap();
        assert_eq!(names(&out), vec!["Tata Steel Jamshedpur", "tata metaliks"]);
        for row in 0..out.len() {
            let name = out.cell(row, "Plant Name").as_str().unwrap().to_lowercase();
            assert!(name.contains("tata"));
        }
    }

    #[test]
    fn predicates_are_anded() {
        let filters = FilterSet {
            states: vec!["Jharkhand".into(), "Karnataka".into()],
            operational: vec!["Yes".into()],
            name: Some("jsw".into()),
            ..FilterSet::default()
        };
        let out = apply_filters(&plants(), &filters).unwrap();
        assert_eq!(names(&out), vec!["JSW Vijayanagar"]);
    }

    #[test]
    fn furnace_tokens_match_whole_words() {
        let filters = FilterSet {
            furnace_types: vec!["bf".into()],
            ..FilterSet::default()
        };
        let out = apply_filters(&plants(), &filters).unwrap();
        // MBF does not contain BF as a whole word
        assert_eq!(names(&out), vec!["Tata Steel Jamshedpur", "JSW Vijayanagar"]);
    }

    #[test]
    fn source_filter() {
        let filters = FilterSet {
            sources: vec![SourceType::SteelPlantsWithBf],
            ..FilterSet::default()
        };
        let out = apply_filters(&plants(), &filters).unwrap();
        assert_eq!(names(&out), vec!["SAIL Bhilai"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let filters = FilterSet {
            districts: vec!["Nowhere".into()],
            ..FilterSet::default()
        };
        let out = apply_filters(&plants(), &filters).unwrap();
        assert!(out.is_empty());
        assert!(out.has_column("Plant Name"));
    }

    #[test]
    fn missing_column_skips_predicate() {
        let filters = FilterSet {
            operational: vec!["Yes".into()],
            operational_column: Some("Status".into()),
            ..FilterSet::default()
        };
        assert_eq!(apply_filters(&plants(), &filters).unwrap().len(), 4);
    }

    #[test]
    fn input_is_not_mutated() {
        let ds = plants();
        let filters = FilterSet {
            name: Some("SAIL".into()),
            ..FilterSet::default()
        };
        let _ = apply_filters(&ds, &filters).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.cell(0, "Plant Name"), CellRef::Text("Tata Steel Jamshedpur"));
    }

    #[test]
    fn option_helpers() {
        let ds = plants();
        assert_eq!(distinct_values(&ds, "Operational"), vec!["Yes", "No"]);
        assert_eq!(combination_tokens(&ds, "Furnance"), vec!["BF", "EAF", "IF", "MBF"]);
        assert_eq!(
            operational_column(&ds, None).map(Column::name),
            Some("Operational")
        );
        assert!(furnace_column(&ds, Some("Furnace Type")).is_none());
    }

    #[test]
    fn token_matcher_escapes_input() {
        let matcher = token_matcher(&["C.R".to_string(), " ".to_string()])
            .unwrap()
            .unwrap();
        assert!(matcher.is_match("x, c.r mill"));
        assert!(!matcher.is_match("CxR mill"));
        assert!(token_matcher(&[]).unwrap().is_none());
    }
}
