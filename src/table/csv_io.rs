// src/table/csv_io.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};
use tracing::debug;

use super::Table;
use crate::error::PipelineError;

/// Load a CSV file whose first record is the header row.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_csv(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(PipelineError::NoSourceSelected(path.to_path_buf()).into());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_csv_from(file).with_context(|| format!("reading {}", path.display()))
}

/// Parse CSV from any reader. Ragged records are kept as-is.
pub fn read_csv_from<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading header row")?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut table = Table::new(headers);

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        table.push_row(record.iter().map(|s| s.to_string()).collect());
    }

    debug!(rows = table.len(), width = table.width(), "loaded csv");
    Ok(table)
}

/// Write `table` to `path`, every record padded to the full grid width.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(table, file).with_context(|| format!("writing {}", path.display()))
}

pub fn write_csv_to<W: Write>(table: &Table, writer: W) -> Result<()> {
    let width = table.width();
    let mut wtr = WriterBuilder::new().flexible(false).from_writer(writer);

    let pad = |row: &[String]| -> Vec<String> {
        let mut out = row.to_vec();
        out.resize(width, String::new());
        out
    };

    wtr.write_record(pad(&table.headers))
        .context("writing header row")?;
    for row in &table.rows {
        wtr.write_record(pad(row)).context("writing record")?;
    }
    wtr.flush().context("flushing csv writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn reads_quoted_json_cells() -> Result<()> {
        let content = "workflow_name,annotations,subject_data\n\
            classify,\"[{\"\"value\"\":[]}]\",\"{\"\"1\"\":{\"\"Filename\"\":\"\"a.jpg\"\"}}\"\n\
            other,,\n";
        let t = read_csv_from(Cursor::new(content))?;
        assert_eq!(t.headers, vec!["workflow_name", "annotations", "subject_data"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 1), r#"[{"value":[]}]"#);
        assert_eq!(t.cell(0, 2), r#"{"1":{"Filename":"a.jpg"}}"#);
        assert!(t.is_blank(1, 2));
        Ok(())
    }

    #[test]
    fn ragged_rows_round_trip_padded() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.csv");

        let mut t = Table::with_headers(&["a", "b"]);
        t.push_row(vec!["1".into()]);
        t.set(1, 3, "far");
        write_csv(&t, &path)?;

        let back = read_csv(&path)?;
        assert_eq!(back.headers, vec!["a", "b", "", ""]);
        assert_eq!(back.rows[0], vec!["1", "", "", ""]);
        assert_eq!(back.rows[1], vec!["", "", "", "far"]);
        Ok(())
    }

    #[test]
    fn missing_source_is_reported() {
        let err = read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoSourceSelected(_))
        ));
    }
}
