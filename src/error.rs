//! Error types for the annotation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors, reported to the user before or instead of output.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Start row or workflow name was not supplied, or is unusable
    #[error("missing user input: {0}")]
    MissingUserInput(String),

    /// Input table path does not point at a readable file
    #[error("no source selected: {0}")]
    NoSourceSelected(PathBuf),

    /// No output location was given
    #[error("no destination selected")]
    NoDestinationSelected,

    /// Sheet is narrower than the layout requires
    #[error("schema mismatch: expected at least {expected} columns, found {found}")]
    SchemaMismatch { expected: usize, found: usize },

    /// A named source column is absent
    #[error("schema mismatch: missing column {0:?}")]
    MissingColumn(String),
}

/// A cell whose JSON payload could not be decoded into the expected shape.
///
/// Recovered locally by the parsers; never leaves the extraction stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed cell: {0}")]
pub struct MalformedCell(pub String);

impl From<serde_json::Error> for MalformedCell {
    fn from(e: serde_json::Error) -> Self {
        MalformedCell(e.to_string())
    }
}
