//! Camera-trap annotation export processing.
//!
//! Decodes crowd-sourced species annotations from a classification export,
//! consolidates duplicate reviews of the same image and labels rows with
//! season and habitat metadata taken from the image filename.

pub mod classify;
pub mod error;
pub mod parse;
pub mod process;
pub mod table;

pub use error::{MalformedCell, PipelineError};
pub use table::Table;
