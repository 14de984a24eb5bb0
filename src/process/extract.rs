// src/process/extract.rs
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::parse::{try_parse_annotations, try_parse_subject, AnnotationRecord};
use crate::table::Table;

pub const WORKFLOW_NAME_COLUMN: &str = "workflow_name";
pub const ANNOTATIONS_COLUMN: &str = "annotations";
pub const SUBJECT_DATA_COLUMN: &str = "subject_data";

/// Column order of the extracted table.
pub const EXTRACTED_HEADERS: [&str; 9] = [
    "FILENAME",
    "SPECIES 1",
    "HOW MANY OF SPECIES 1",
    "SPECIES 2",
    "HOW MANY OF SPECIES 2",
    "TIME OF DAY",
    "TEMPERATURE",
    "MONTH",
    "HABITAT",
];

/// User-supplied extraction parameters, checked before any row is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    start_row: usize,
    workflow_name: String,
}

impl ExtractOptions {
    pub fn new(
        start_row: Option<usize>,
        workflow_name: Option<String>,
    ) -> Result<Self, PipelineError> {
        let start_row = match start_row {
            Some(n) if n >= 1 => n,
            Some(n) => {
                return Err(PipelineError::MissingUserInput(format!(
                    "starting row must be 1 or greater, got {}",
                    n
                )))
            }
            None => {
                return Err(PipelineError::MissingUserInput(
                    "no starting row specified".into(),
                ))
            }
        };
        let workflow_name = match workflow_name {
            Some(w) if !w.is_empty() => w,
            _ => {
                return Err(PipelineError::MissingUserInput(
                    "no workflow name specified".into(),
                ))
            }
        };
        Ok(Self {
            start_row,
            workflow_name,
        })
    }

    /// 1-based data row to start from.
    pub fn start_row(&self) -> usize {
        self.start_row
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRow {
    pub filename: Option<String>,
    pub record: AnnotationRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub rows_scanned: usize,
    pub rows_matched: usize,
    pub malformed_annotations: usize,
    pub missing_filenames: usize,
    pub overflow_observations: usize,
}

/// Keep rows of one workflow from `start_row` on and decode their cells.
///
/// Malformed cells never abort the run: they decode to defaults and are
/// counted in the summary.
#[tracing::instrument(
    level = "info",
    skip(source, opts),
    fields(start_row = opts.start_row(), workflow = %opts.workflow_name())
)]
pub fn extract_rows(
    source: &Table,
    opts: &ExtractOptions,
) -> Result<(Vec<ExtractedRow>, ExtractionSummary), PipelineError> {
    let wf_col = source.require_column(WORKFLOW_NAME_COLUMN)?;
    let ann_col = source.require_column(ANNOTATIONS_COLUMN)?;
    let subj_col = source.require_column(SUBJECT_DATA_COLUMN)?;

    let mut summary = ExtractionSummary::default();
    let mut out = Vec::new();

    for row in (opts.start_row() - 1)..source.len() {
        summary.rows_scanned += 1;
        if source.cell(row, wf_col) != opts.workflow_name() {
            continue;
        }
        summary.rows_matched += 1;

        let filename = match try_parse_subject(source.cell(row, subj_col)) {
            Ok(f) => Some(f),
            Err(e) => {
                debug!(row = row + 1, error = %e, "no filename");
                summary.missing_filenames += 1;
                None
            }
        };
        let record = match try_parse_annotations(source.cell(row, ann_col)) {
            Ok(r) => r,
            Err(e) => {
                debug!(row = row + 1, error = %e, "annotation defaulted");
                summary.malformed_annotations += 1;
                AnnotationRecord::default()
            }
        };
        summary.overflow_observations += record.overflow;

        out.push(ExtractedRow { filename, record });
    }

    info!(
        scanned = summary.rows_scanned,
        matched = summary.rows_matched,
        malformed = summary.malformed_annotations,
        missing_filenames = summary.missing_filenames,
        overflow = summary.overflow_observations,
        "extraction done"
    );
    Ok((out, summary))
}

/// Render extracted rows in the fixed 9-column layout.
pub fn extracted_table(rows: &[ExtractedRow]) -> Table {
    let mut table = Table::with_headers(&EXTRACTED_HEADERS);
    for r in rows {
        let mut cells = Vec::with_capacity(EXTRACTED_HEADERS.len());
        cells.push(r.filename.clone().unwrap_or_default());
        cells.extend(r.record.fields().iter().map(|s| s.to_string()));
        table.push_row(cells);
    }
    table
}
