//! Per-source summary statistics over a fused dataset.

use crate::dataset::{Column, Dataset};
use crate::filter::OPERATIONAL_COLUMNS;
use crate::models::SourceType;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

const TOP_N: usize = 10;
const SAMPLE_NAMES: usize = 10;

static COMPANY_NAME_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)company|name|firm|business").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityStats {
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameSummary {
    pub column: String,
    pub unique: usize,
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: SourceType,
    pub total_records: usize,
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub capacity: Option<CapacityStats>,
    pub operational_status: Vec<(String, usize)>,
    pub state_distribution: Vec<(String, usize)>,
    pub district_distribution: Vec<(String, usize)>,
    pub names: Option<NameSummary>,
    pub source_files: Vec<(String, usize)>,
}

/// Value counts, most frequent first. Ties keep first-seen order.
pub fn value_counts(column: &Column) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for value in column.cells().filter_map(|c| c.display()) {
        let count = counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }
    let mut out: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| {
            let n = counts.get(&v).copied().unwrap_or(0);
            (v, n)
        })
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

fn top(column: Option<&Column>, n: usize) -> Vec<(String, usize)> {
    column
        .map(|c| value_counts(c).into_iter().take(n).collect())
        .unwrap_or_default()
}

/// Sum, mean, min and max of the values that coerce to numbers.
pub fn capacity_stats(column: &Column) -> Option<CapacityStats> {
    let values: Vec<f64> = column.cells().filter_map(|c| c.coerce_f64()).collect();
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(CapacityStats {
        total,
        mean: total / values.len() as f64,
        min,
        max,
    })
}

fn name_summary(column: &Column) -> NameSummary {
    let values: Vec<String> = column.cells().filter_map(|c| c.display()).collect();
    let unique = values.iter().collect::<FxHashSet<_>>().len();
    NameSummary {
        column: column.name().to_string(),
        unique,
        samples: values.into_iter().take(SAMPLE_NAMES).collect(),
    }
}

fn name_column(source: SourceType, present: &[&Column]) -> Option<usize> {
    match source {
        SourceType::RiceMills => present
            .iter()
            .position(|c| c.name().to_lowercase().contains("name")),
        SourceType::GeocodedCompanies => present
            .iter()
            .position(|c| COMPANY_NAME_HINT.is_match(c.name())),
        _ => None,
    }
}

/// Summary of the rows of one source. Columns that are null throughout
/// belong to other sources of the fusion and are left out.
pub fn summarize_source(source: SourceType, part: &Dataset) -> SourceSummary {
    let present: Vec<&Column> = part
        .columns()
        .filter(|c| c.cells().any(|cell| !cell.is_null()))
        .collect();
    let by_name = |name: &str| present.iter().copied().find(|c| c.name() == name);
    let by_name_ci = |name: &str| {
        present
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    };

    let (numeric_columns, categorical_columns): (Vec<&Column>, Vec<&Column>) =
        present.iter().copied().partition(|c| c.data().is_numeric());

    let (capacity, operational_status) = if source.is_steel() {
        let operational = OPERATIONAL_COLUMNS.iter().find_map(|n| by_name(n));
        (
            by_name("Capacity").and_then(capacity_stats),
            operational.map(value_counts).unwrap_or_default(),
        )
    } else {
        (None, Vec::new())
    };

    let source_files = if source == SourceType::GeocodedCompanies {
        by_name("Source_File").map(value_counts).unwrap_or_default()
    } else {
        Vec::new()
    };

    SourceSummary {
        source,
        total_records: part.len(),
        columns: present.iter().map(|c| c.name().to_string()).collect(),
        numeric_columns: numeric_columns.iter().map(|c| c.name().to_string()).collect(),
        categorical_columns: categorical_columns
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        capacity,
        operational_status,
        state_distribution: top(by_name_ci("state"), TOP_N),
        district_distribution: top(by_name_ci("district"), TOP_N),
        names: name_column(source, &present).map(|pos| name_summary(present[pos])),
        source_files,
    }
}

/// One summary per selected source that has rows, in selection order.
pub fn summarize(dataset: &Dataset, sources: &[SourceType]) -> Vec<SourceSummary> {
    let parts = dataset.partition_by_source();
    sources
        .iter()
        .filter_map(|source| {
            parts
                .iter()
                .find(|(s, part)| s == source && !part.is_empty())
                .map(|(s, part)| summarize_source(*s, part))
        })
        .collect()
}

pub fn total_records(summaries: &[SourceSummary]) -> usize {
    summaries.iter().map(|s| s.total_records).sum()
}
