// src/parse/subject.rs
use serde_json::{Map, Value};

use super::annotation::cell_text;
use crate::error::MalformedCell;

/// Pull the image filename out of a subject-metadata cell.
///
/// The cell is an object keyed by subject id; the first entry in document
/// order holds the metadata, including `Filename`.
pub fn try_parse_subject(cell: &str) -> Result<String, MalformedCell> {
    let subjects: Map<String, Value> = serde_json::from_str(cell)?;
    let (_, meta) = subjects
        .iter()
        .next()
        .ok_or_else(|| MalformedCell("empty subject object".into()))?;
    let meta = meta
        .as_object()
        .ok_or_else(|| MalformedCell("subject metadata is not an object".into()))?;
    cell_text(meta.get("Filename")).ok_or_else(|| MalformedCell("no Filename".into()))
}

/// Like [`try_parse_subject`], with every failure mapped to `None`.
pub fn parse_subject(cell: &str) -> Option<String> {
    try_parse_subject(cell).ok()
}
