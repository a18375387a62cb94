//! Columnar, immutable record storage.
//!
//! A [`Dataset`] is a list of named, equally long columns. Columns sit behind
//! `Arc`, so cloning a dataset or deriving a new one from it (adding a
//! column, filtering rows, slicing a page) never touches the input. Every
//! pipeline stage takes `&Dataset` and returns a fresh `Dataset`.

use crate::config::UNKNOWN;
use crate::models::{CanonicalRecord, SourceType};
use crate::source::SourceAliases;
use anyhow::{bail, Result};
use std::ops::Range;
use std::sync::Arc;

pub const SOURCE_TYPE: &str = "source_type";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const STATE: &str = "state";
pub const DISTRICT: &str = "district";

/// Spellings a tabular reader treats as a missing value.
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// An owned raw value as read from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Types a raw text field: blank or NA spellings are null, then integer,
    /// then float, otherwise the text is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_VALUES.contains(&trimmed) {
            return Cell::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Cell::Float(f);
        }
        Cell::Text(raw.to_string())
    }

    pub fn view(&self) -> CellRef<'_> {
        match self {
            Cell::Null => CellRef::Null,
            Cell::Int(i) => CellRef::Int(*i),
            Cell::Float(f) => CellRef::Float(*f),
            Cell::Text(s) => CellRef::Text(s),
        }
    }
}

/// A borrowed view of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellRef<'a> {
    Null,
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl<'a> CellRef<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, CellRef::Null)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            CellRef::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of an int or float cell. Text is not parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellRef::Int(i) => Some(*i as f64),
            CellRef::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellRef::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Like [`as_f64`](Self::as_f64) but also parses numeric text.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            CellRef::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            other => other.as_f64(),
        }
    }

    /// Text rendering used for display, tooltips and set-membership filters.
    pub fn display(&self) -> Option<String> {
        match self {
            CellRef::Null => None,
            CellRef::Int(i) => Some(i.to_string()),
            CellRef::Float(f) if f.is_nan() => None,
            CellRef::Float(f) => Some(format_float(*f)),
            CellRef::Text(s) => Some((*s).to_string()),
        }
    }
}

/// Whole floats keep a trailing `.0` so `5.0` never reads as the int `5`.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

/// Integer storage at the narrowest width that holds the column's range.
#[derive(Debug, Clone, PartialEq)]
pub enum IntColumn {
    U8(Vec<Option<u8>>),
    U16(Vec<Option<u16>>),
    U32(Vec<Option<u32>>),
    I8(Vec<Option<i8>>),
    I16(Vec<Option<i16>>),
    I32(Vec<Option<i32>>),
    I64(Vec<Option<i64>>),
}

macro_rules! each_int {
    ($col:expr, $v:ident => $body:expr) => {
        match $col {
            IntColumn::U8($v) => $body,
            IntColumn::U16($v) => $body,
            IntColumn::U32($v) => $body,
            IntColumn::I8($v) => $body,
            IntColumn::I16($v) => $body,
            IntColumn::I32($v) => $body,
            IntColumn::I64($v) => $body,
        }
    };
}

macro_rules! map_int {
    ($col:expr, $v:ident => $body:expr) => {
        match $col {
            IntColumn::U8($v) => IntColumn::U8($body),
            IntColumn::U16($v) => IntColumn::U16($body),
            IntColumn::U32($v) => IntColumn::U32($body),
            IntColumn::I8($v) => IntColumn::I8($body),
            IntColumn::I16($v) => IntColumn::I16($body),
            IntColumn::I32($v) => IntColumn::I32($body),
            IntColumn::I64($v) => IntColumn::I64($body),
        }
    };
}

impl IntColumn {
    pub fn len(&self) -> usize {
        each_int!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<i64> {
        each_int!(self, v => v[row].map(i64::from))
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        map_int!(self, v => gather(v, indices))
    }

    pub fn to_i64(&self) -> Vec<Option<i64>> {
        (0..self.len()).map(|row| self.get(row)).collect()
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            IntColumn::U8(_) => "uint8",
            IntColumn::U16(_) => "uint16",
            IntColumn::U32(_) => "uint32",
            IntColumn::I8(_) => "int8",
            IntColumn::I16(_) => "int16",
            IntColumn::I32(_) => "int32",
            IntColumn::I64(_) => "int64",
        }
    }
}

/// Interned text: each distinct string is stored once and rows hold codes.
#[derive(Debug, Clone, PartialEq)]
pub struct DictColumn {
    pub values: Vec<String>,
    pub codes: Vec<Option<u32>>,
}

impl DictColumn {
    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes[row].map(|code| self.values[code as usize].as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Dict,
    Float,
    Int,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Dict(DictColumn),
    Float(Vec<Option<f64>>),
    Int(IntColumn),
}

impl ColumnData {
    /// Picks a storage type for raw cells: all-int becomes `Int`, all-numeric
    /// (or all-null) becomes `Float`, anything else becomes `Text` with
    /// numbers rendered as strings.
    pub fn infer(cells: Vec<Cell>) -> Self {
        let mut all_int = true;
        let mut all_numeric = true;
        for cell in &cells {
            match cell {
                Cell::Null => {}
                Cell::Int(_) => {}
                Cell::Float(_) => all_int = false,
                Cell::Text(_) => {
                    all_int = false;
                    all_numeric = false;
                }
            }
        }

        let has_values = cells.iter().any(|c| !matches!(c, Cell::Null));
        if all_int && has_values {
            let values = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(i) => Some(i),
                    _ => None,
                })
                .collect();
            ColumnData::Int(IntColumn::I64(values))
        } else if all_numeric {
            let values = cells
                .into_iter()
                .map(|c| c.view().as_f64())
                .collect();
            ColumnData::Float(values)
        } else {
            let values = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Text(s) => Some(s),
                    other => other.view().display(),
                })
                .collect();
            ColumnData::Text(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Dict(d) => d.codes.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Dict(_) => ColumnKind::Dict,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Int(_) => ColumnKind::Int,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind(), ColumnKind::Float | ColumnKind::Int)
    }

    pub fn get(&self, row: usize) -> CellRef<'_> {
        match self {
            ColumnData::Text(v) => v[row].as_deref().map_or(CellRef::Null, CellRef::Text),
            ColumnData::Dict(d) => d.get(row).map_or(CellRef::Null, CellRef::Text),
            ColumnData::Float(v) => v[row].map_or(CellRef::Null, CellRef::Float),
            ColumnData::Int(v) => v.get(row).map_or(CellRef::Null, CellRef::Int),
        }
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Text(v) => ColumnData::Text(gather(v, indices)),
            ColumnData::Dict(d) => ColumnData::Dict(DictColumn {
                values: d.values.clone(),
                codes: gather(&d.codes, indices),
            }),
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::Int(v) => ColumnData::Int(v.take(indices)),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "object",
            ColumnData::Dict(_) => "category",
            ColumnData::Float(_) => "float64",
            ColumnData::Int(v) => v.dtype(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn from_cells(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self::new(name, ColumnData::infer(cells))
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn constant_text(name: impl Into<String>, value: &str, len: usize) -> Self {
        Self::text(name, vec![Some(value.to_string()); len])
    }

    /// Same values under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.data.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize) -> CellRef<'_> {
        self.data.get(row)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> + '_ {
        (0..self.len()).map(move |row| self.get(row))
    }
}

/// Ordered, immutable table of records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Arc<Column>>,
    rows: usize,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            bail!(
                "Column '{}' has {} rows, expected {}",
                bad.name(),
                bad.len(),
                rows
            );
        }
        Ok(Self {
            columns: columns.into_iter().map(Arc::new).collect(),
            rows,
        })
    }

    /// Builds a dataset from a header row and typed cell rows. Short rows are
    /// padded with nulls; extra trailing cells are ignored.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Cell>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Vec<Cell>> = headers
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(Cell::Null));
            }
        }
        let columns = headers
            .iter()
            .zip(columns)
            .map(|(name, cells)| Arc::new(Column::from_cells(name.clone(), cells)))
            .collect();
        Self {
            columns,
            rows: row_count,
        }
    }

    pub(crate) fn from_shared(columns: Vec<Arc<Column>>, rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == rows));
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|c| c.as_ref())
    }

    pub(crate) fn shared_columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Exact column name first, then a case-insensitive match.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.column(name).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.name().eq_ignore_ascii_case(name))
                .map(|c| c.as_ref())
        })
    }

    /// Cell at `row` in column `name`; null when the column is absent.
    pub fn cell(&self, row: usize, name: &str) -> CellRef<'_> {
        self.column(name).map_or(CellRef::Null, |c| c.get(row))
    }

    /// Returns a dataset with `column` added, replacing any column of the
    /// same name in place.
    pub fn with_column(&self, column: Column) -> Result<Self> {
        if !self.columns.is_empty() && column.len() != self.rows {
            bail!(
                "Column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.rows
            );
        }
        let rows = column.len();
        let mut columns = self.columns.clone();
        match columns.iter().position(|c| c.name() == column.name()) {
            Some(pos) => columns[pos] = Arc::new(column),
            None => columns.push(Arc::new(column)),
        }
        Ok(Self { columns, rows })
    }

    /// Rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Arc::new(Column::new(c.name(), c.data().take(indices))))
            .collect();
        Self {
            columns,
            rows: indices.len(),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows);
        let start = range.start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        self.take(&indices)
    }

    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let indices: Vec<usize> = (0..self.rows).filter(|&row| keep(row)).collect();
        if indices.len() == self.rows {
            return self.clone();
        }
        self.take(&indices)
    }

    pub fn source_type(&self, row: usize) -> Option<SourceType> {
        self.cell(row, SOURCE_TYPE)
            .as_str()
            .and_then(SourceType::from_label)
    }

    /// Distinct source types in order of first appearance.
    pub fn sources(&self) -> Vec<SourceType> {
        let mut seen = Vec::new();
        for row in 0..self.rows {
            if let Some(source) = self.source_type(row) {
                if !seen.contains(&source) {
                    seen.push(source);
                }
            }
        }
        seen
    }

    /// One sub-dataset per source type, in order of first appearance.
    pub fn partition_by_source(&self) -> Vec<(SourceType, Dataset)> {
        self.sources()
            .into_iter()
            .map(|source| {
                let part = self.filter_rows(|row| self.source_type(row) == Some(source));
                (source, part)
            })
            .collect()
    }

    /// Typed view of one row. `None` when the row lacks a source tag or a
    /// valid coordinate pair.
    pub fn record(&self, row: usize) -> Option<CanonicalRecord> {
        let source_type = self.source_type(row)?;
        let latitude = self.cell(row, LATITUDE).as_f64()?;
        let longitude = self.cell(row, LONGITUDE).as_f64()?;
        let aliases = SourceAliases::for_source(source_type);
        let text = |column: Option<&Column>| column.and_then(|c| c.get(row).display());

        Some(CanonicalRecord {
            source_type,
            name: text(aliases.name_column(self)),
            state: self
                .cell(row, STATE)
                .display()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            district: self
                .cell(row, DISTRICT)
                .display()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            latitude,
            longitude,
            capacity: text(aliases.resolve(self, aliases.capacity)),
            furnace_type: text(aliases.resolve(self, aliases.furnace_type)),
            operational_status: text(aliases.resolve(self, aliases.operational_status)),
        })
    }

    pub fn records(&self) -> impl Iterator<Item = CanonicalRecord> + '_ {
        (0..self.rows).filter_map(move |row| self.record(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_types_raw_fields() {
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("  "), Cell::Null);
        assert_eq!(Cell::parse("NaN"), Cell::Null);
        assert_eq!(Cell::parse("42"), Cell::Int(42));
        assert_eq!(Cell::parse("-3.5"), Cell::Float(-3.5));
        assert_eq!(
            Cell::parse("26°55'0\"N"),
            Cell::Text("26°55'0\"N".to_string())
        );
    }

    #[test]
    fn infer_picks_narrowest_kind() {
        let ints = ColumnData::infer(vec![Cell::Int(1), Cell::Null, Cell::Int(3)]);
        assert_eq!(ints.kind(), ColumnKind::Int);

        let floats = ColumnData::infer(vec![Cell::Int(1), Cell::Float(2.5)]);
        assert_eq!(floats.kind(), ColumnKind::Float);
        assert_eq!(floats.get(0), CellRef::Float(1.0));

        let text = ColumnData::infer(vec![Cell::Int(7), Cell::Text("Tata".into())]);
        assert_eq!(text.kind(), ColumnKind::Text);
        assert_eq!(text.get(0), CellRef::Text("7"));

        let nulls = ColumnData::infer(vec![Cell::Null, Cell::Null]);
        assert_eq!(nulls.kind(), ColumnKind::Float);
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let ds = Dataset::from_rows(
            &headers(&["a", "b"]),
            vec![vec![Cell::Int(1)], vec![Cell::Int(2), Cell::Text("x".into())]],
        );
        assert_eq!(ds.len(), 2);
        assert!(ds.cell(0, "b").is_null());
        assert_eq!(ds.cell(1, "b"), CellRef::Text("x"));
    }

    #[test]
    fn with_column_does_not_touch_the_original() {
        let ds = Dataset::from_rows(&headers(&["a"]), vec![vec![Cell::Int(1)]]);
        let extended = ds
            .with_column(Column::constant_text("b", "y", 1))
            .unwrap();
        assert!(!ds.has_column("b"));
        assert_eq!(extended.cell(0, "b"), CellRef::Text("y"));
    }

    #[test]
    fn with_column_rejects_length_mismatch() {
        let ds = Dataset::from_rows(&headers(&["a"]), vec![vec![Cell::Int(1)]]);
        assert!(ds.with_column(Column::constant_text("b", "y", 3)).is_err());
    }

    #[test]
    fn slice_clamps_to_bounds() {
        let rows = (0..5).map(|i| vec![Cell::Int(i)]).collect();
        let ds = Dataset::from_rows(&headers(&["n"]), rows);
        let tail = ds.slice(3..10);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.cell(0, "n"), CellRef::Int(3));
        assert!(ds.slice(7..9).is_empty());
    }

    #[test]
    fn find_column_falls_back_to_case_insensitive() {
        let ds = Dataset::from_rows(&headers(&["State"]), vec![vec![Cell::parse("Goa")]]);
        assert_eq!(ds.find_column("state").map(Column::name), Some("State"));
        assert!(ds.column("state").is_none());
    }

    #[test]
    fn float_display_keeps_decimal_point() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(2.25), "2.25");
    }
}
