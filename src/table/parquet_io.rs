// src/table/parquet_io.rs
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::ArrowWriter,
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    collections::HashSet,
    fs::{self, File},
    path::Path,
    sync::Arc,
};

use super::Table;

/// Parquet needs distinct, non-empty column names; the sheet layout repeats
/// `FILENAME` and may carry unnamed columns.
fn column_names(table: &Table, width: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    (0..width)
        .map(|i| {
            let base = match table.headers.get(i).map(|h| h.trim()) {
                Some(h) if !h.is_empty() => h.to_string(),
                _ => format!("column_{}", i + 1),
            };
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}

/// Write `table` as a single-batch Parquet file of nullable string columns.
/// Blank cells become nulls. Returns the size of the written file.
pub fn write_parquet(table: &Table, path: &Path) -> Result<u64> {
    let width = table.width();
    let fields: Vec<Field> = column_names(table, width)
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = (0..width)
        .map(|c| {
            let arr: StringArray = table
                .rows
                .iter()
                .map(|r| r.get(c).map(String::as_str).filter(|s| !s.is_empty()))
                .collect();
            Arc::new(arr) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file =
        File::create(path).with_context(|| format!("creating file {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let metadata = fs::metadata(path).context("getting file metadata")?;
    Ok(metadata.len())
}
