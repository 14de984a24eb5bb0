// src/process/mod.rs
pub mod enrich;
pub mod extract;
pub mod progress;
pub mod validate;

use serde::Serialize;
use tracing::info;

use crate::error::PipelineError;
use crate::table::Table;
use enrich::{enrich_habitats, EnrichSummary};
use extract::{extract_rows, extracted_table, ExtractOptions, ExtractionSummary};
use progress::ProgressSink;
use validate::{consolidate, is_extracted_layout, lift_extracted, ValidationSummary};

/// Counters from every stage that ran, reported once the run is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habitats: Option<EnrichSummary>,
}

/// Raw export → 9-column extracted table.
pub fn run_extract(
    source: &Table,
    opts: &ExtractOptions,
) -> Result<(Table, RunSummary), PipelineError> {
    let (rows, summary) = extract_rows(source, opts)?;
    Ok((
        extracted_table(&rows),
        RunSummary {
            extraction: Some(summary),
            ..Default::default()
        },
    ))
}

/// Sheet → consolidated and habitat-labelled sheet.
///
/// A bare extracted table is lifted into the sheet layout first.
pub fn run_validate<P: ProgressSink + ?Sized>(
    sheet: Table,
    progress: &P,
) -> Result<(Table, RunSummary), PipelineError> {
    let sheet = if is_extracted_layout(&sheet) {
        info!("lifting extracted table into sheet layout");
        lift_extracted(&sheet)
    } else {
        sheet
    };

    let consolidation = consolidate(sheet, progress)?;
    let mut sheet = consolidation.sheet;
    let habitats = enrich_habitats(&mut sheet);
    sheet.normalize();

    Ok((
        sheet,
        RunSummary {
            validation: Some(consolidation.summary),
            habitats: Some(habitats),
            ..Default::default()
        },
    ))
}

/// Raw export → final sheet in one pass.
pub fn run_all<P: ProgressSink + ?Sized>(
    source: &Table,
    opts: &ExtractOptions,
    progress: &P,
) -> Result<(Table, RunSummary), PipelineError> {
    let (extracted, first) = run_extract(source, opts)?;
    let (sheet, mut summary) = run_validate(extracted, progress)?;
    summary.extraction = first.extraction;
    Ok((sheet, summary))
}
