//! Row-oriented access to raw tabular sources.

use crate::dataset::Cell;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A tabular source yielding typed rows in batches.
pub trait RowReader {
    fn headers(&self) -> &[String];

    /// Up to `max` rows. An empty batch means the input is exhausted.
    fn next_batch(&mut self, max: usize) -> Result<Vec<Vec<Cell>>>;
}

pub struct CsvRowReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: StringRecord,
    row: u64,
}

impl CsvRowReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open source file: {:?}", path))?;
        Self::from_reader(BufReader::with_capacity(256 * 1024, file))
            .with_context(|| format!("Failed to read header row: {:?}", path))
    }
}

impl<R: Read> CsvRowReader<R> {
    pub fn from_reader(input: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
        let headers = reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            row: 0,
        })
    }
}

impl<R: Read> RowReader for CsvRowReader<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_batch(&mut self, max: usize) -> Result<Vec<Vec<Cell>>> {
        let mut batch = Vec::with_capacity(max.min(4096));
        while batch.len() < max {
            let more = self
                .reader
                .read_record(&mut self.record)
                .with_context(|| format!("Failed to read CSV record {}", self.row + 1))?;
            if !more {
                break;
            }
            self.row += 1;
            batch.push(self.record.iter().map(Cell::parse).collect());
        }
        Ok(batch)
    }
}

/// Rows already held in memory, typed the same way a file would be.
pub struct InMemoryRows {
    headers: Vec<String>,
    rows: std::vec::IntoIter<Vec<Cell>>,
}

impl InMemoryRows {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|raw| Cell::parse(raw)).collect())
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl RowReader for InMemoryRows {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_batch(&mut self, max: usize) -> Result<Vec<Vec<Cell>>> {
        Ok(self.rows.by_ref().take(max).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn csv_batches_respect_max() {
        let data = "a,b\n1,x\n2,y\n3,z\n";
        let mut reader = CsvRowReader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(reader.headers(), ["a", "b"]);

        assert_eq!(reader.next_batch(2).unwrap().len(), 2);
        let last = reader.next_batch(2).unwrap();
        assert_eq!(last, vec![vec![Cell::Int(3), Cell::Text("z".into())]]);
        assert!(reader.next_batch(2).unwrap().is_empty());
    }

    #[test]
    fn csv_handles_ragged_rows_and_quotes() {
        let data = "name,lat,lng\n\"Mill, North\",22.5\nOther,1,2,extra\n";
        let mut reader = CsvRowReader::from_reader(data.as_bytes()).unwrap();
        let rows = reader.next_batch(10).unwrap();
        assert_eq!(rows[0][0], Cell::Text("Mill, North".into()));
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 4);
    }

    #[test]
    fn open_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, " Latitude ,Longitude").unwrap();
        writeln!(file, "22.5,88.3").unwrap();
        let mut reader = CsvRowReader::open(file.path()).unwrap();
        assert_eq!(reader.headers(), ["Latitude", "Longitude"]);
        assert_eq!(reader.next_batch(100).unwrap().len(), 1);
    }

    #[test]
    fn open_missing_file_is_an_error() {
        assert!(CsvRowReader::open(Path::new("/nonexistent/plants.csv")).is_err());
    }

    #[test]
    fn in_memory_rows_drain_in_batches() {
        let mut rows = InMemoryRows::new(&["n"], &[&["1"], &["2"], &["3"]]);
        assert_eq!(rows.next_batch(2).unwrap().len(), 2);
        assert_eq!(rows.next_batch(2).unwrap(), vec![vec![Cell::Int(3)]]);
        assert!(rows.next_batch(2).unwrap().is_empty());
    }
}
