//! Concatenation of per-source datasets and memory compaction.

use crate::config::{COMPACTION_CARDINALITY_RATIO, COMPACTION_SAMPLE_SIZE};
use crate::dataset::{Column, ColumnData, ColumnKind, Dataset, DictColumn, IntColumn};
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Stacks `parts` in order and compacts the result. Columns are the union
/// of all parts in first-seen order; a part lacking a column contributes
/// nulls for it.
pub fn fuse(parts: &[Dataset]) -> Result<Dataset> {
    let combined = concat(parts)?;
    let compacted = compact(&combined);
    info!(
        parts = parts.len(),
        rows = compacted.len(),
        columns = compacted.shared_columns().len(),
        "Fused datasets"
    );
    Ok(compacted)
}

pub fn concat(parts: &[Dataset]) -> Result<Dataset> {
    match parts {
        [] => return Ok(Dataset::empty()),
        [only] => return Ok(only.clone()),
        _ => {}
    }

    let mut names: Vec<&str> = Vec::new();
    let mut seen = FxHashSet::default();
    for part in parts {
        for name in part.column_names() {
            if seen.insert(name) {
                names.push(name);
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let pieces: Vec<(usize, Option<&Column>)> =
                parts.iter().map(|p| (p.len(), p.column(name))).collect();
            concat_column(name, &pieces)
        })
        .collect();
    Dataset::from_columns(columns)
}

fn concat_column(name: &str, pieces: &[(usize, Option<&Column>)]) -> Column {
    let kinds: Vec<ColumnKind> = pieces
        .iter()
        .filter_map(|(_, c)| c.map(|c| c.data().kind()))
        .collect();

    if kinds.iter().all(|k| *k == ColumnKind::Int) {
        let mut values = Vec::new();
        for (len, column) in pieces {
            match column.map(|c| c.data()) {
                Some(ColumnData::Int(ints)) => values.extend(ints.to_i64()),
                _ => values.extend(std::iter::repeat(None).take(*len)),
            }
        }
        return Column::new(name, ColumnData::Int(IntColumn::I64(values)));
    }

    if kinds.iter().all(|k| matches!(k, ColumnKind::Int | ColumnKind::Float)) {
        let mut values = Vec::new();
        for (len, column) in pieces {
            match column {
                Some(c) => values.extend(c.cells().map(|cell| cell.as_f64())),
                None => values.extend(std::iter::repeat(None).take(*len)),
            }
        }
        return Column::float(name, values);
    }

    let mut values = Vec::new();
    for (len, column) in pieces {
        match column {
            Some(c) => values.extend(c.cells().map(|cell| cell.display())),
            None => values.extend(std::iter::repeat(None).take(*len)),
        }
    }
    Column::text(name, values)
}

/// Narrows integer columns and dictionary-encodes repetitive numeric-looking
/// text. Cell values are unchanged.
pub fn compact(dataset: &Dataset) -> Dataset {
    let rows = dataset.len();
    let columns = dataset
        .shared_columns()
        .iter()
        .map(|column| {
            let narrowed = match column.data() {
                ColumnData::Int(IntColumn::I64(values)) => narrow_ints(values).map(ColumnData::Int),
                ColumnData::Text(values) => dictionary_encode(values, rows).map(ColumnData::Dict),
                _ => None,
            };
            match narrowed {
                Some(data) => {
                    debug!(column = column.name(), dtype = data.dtype(), "Compacted column");
                    Arc::new(Column::new(column.name(), data))
                }
                None => Arc::clone(column),
            }
        })
        .collect();
    Dataset::from_shared(columns, rows)
}

fn cast<T: TryFrom<i64>>(values: &[Option<i64>]) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|v| match v {
            Some(v) => T::try_from(*v).ok().map(Some),
            None => Some(None),
        })
        .collect()
}

/// Smallest width for the column's range, with the same strict bounds as
/// the usual dtype downcast. `None` keeps i64.
pub fn narrow_ints(values: &[Option<i64>]) -> Option<IntColumn> {
    let min = values.iter().flatten().min().copied()?;
    let max = values.iter().flatten().max().copied()?;

    if min >= 0 {
        if max < u8::MAX as i64 {
            cast(values).map(IntColumn::U8)
        } else if max < u16::MAX as i64 {
            cast(values).map(IntColumn::U16)
        } else if max < u32::MAX as i64 {
            cast(values).map(IntColumn::U32)
        } else {
            None
        }
    } else if min > i8::MIN as i64 && max < i8::MAX as i64 {
        cast(values).map(IntColumn::I8)
    } else if min > i16::MIN as i64 && max < i16::MAX as i64 {
        cast(values).map(IntColumn::I16)
    } else if min > i32::MIN as i64 && max < i32::MAX as i64 {
        cast(values).map(IntColumn::I32)
    } else {
        None
    }
}

/// Digits once `.` and `-` are removed.
fn looks_numeric(value: &str) -> bool {
    let stripped: String = value.chars().filter(|c| *c != '.' && *c != '-').collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

pub fn dictionary_encode(values: &[Option<String>], rows: usize) -> Option<DictColumn> {
    if rows == 0 {
        return None;
    }

    let unsafe_sample = values
        .iter()
        .flatten()
        .take(COMPACTION_SAMPLE_SIZE)
        .any(|v| v.starts_with('#') || v.starts_with('$') || !looks_numeric(v));
    if unsafe_sample {
        return None;
    }

    let distinct: FxHashSet<&str> = values.iter().flatten().map(String::as_str).collect();
    if distinct.len() as f64 / rows as f64 >= COMPACTION_CARDINALITY_RATIO {
        return None;
    }

    let mut lookup: FxHashMap<&str, u32> = FxHashMap::default();
    let mut dict = Vec::new();
    let codes = values
        .iter()
        .map(|value| {
            value.as_deref().map(|v| {
                *lookup.entry(v).or_insert_with(|| {
                    dict.push(v.to_string());
                    (dict.len() - 1) as u32
                })
            })
        })
        .collect();
    Some(DictColumn { values: dict, codes })
}
