// src/table/mod.rs
pub mod csv_io;
pub mod parquet_io;

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::error::PipelineError;

pub use csv_io::{read_csv, read_csv_from, write_csv, write_csv_to};
pub use parquet_io::write_parquet;

/// An in-memory grid of string cells with one header row.
///
/// Cells are positional; an empty string is a blank cell. Rows may be shorter
/// than the header row, missing cells read as blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, from the first row of the source.
    pub headers: Vec<String>,
    /// Data rows below the header, in source order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn with_headers(headers: &[&str]) -> Self {
        Self::new(headers.iter().map(|h| h.to_string()).collect())
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest of the header row and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Fail unless the grid is at least `min` columns wide.
    pub fn require_width(&self, min: usize) -> Result<(), PipelineError> {
        let found = self.width();
        if found < min {
            return Err(PipelineError::SchemaMismatch {
                expected: min,
                found,
            });
        }
        Ok(())
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_blank(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_empty()
    }

    /// Write one cell, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let r = &mut self.rows[row];
        if r.len() <= col {
            r.resize(col + 1, String::new());
        }
        r[col] = value.into();
    }

    pub fn set_header(&mut self, col: usize, name: impl Into<String>) {
        if self.headers.len() <= col {
            self.headers.resize(col + 1, String::new());
        }
        self.headers[col] = name.into();
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Pad the header row and every data row to the same width.
    pub fn normalize(&mut self) {
        let width = self.width();
        self.headers.resize(width, String::new());
        for r in &mut self.rows {
            r.resize(width, String::new());
        }
    }
}

/// On-disk encoding of an output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    /// `.parquet` destinations get Parquet, everything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}

/// Persist `table` at `path` in the format its extension selects.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let format = OutputFormat::from_path(path);
    match format {
        OutputFormat::Csv => write_csv(table, path)?,
        OutputFormat::Parquet => {
            let bytes = write_parquet(table, path)?;
            info!(bytes, "parquet written");
        }
    }
    info!(
        path = %path.display(),
        rows = table.len(),
        ?format,
        "table written"
    );
    Ok(())
}
