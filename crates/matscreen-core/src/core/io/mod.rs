//! Reading and writing of the tabular files the toolkit works with.
//!
//! Every loader validates its rows into typed records at load time, so a malformed
//! file surfaces as a [`DataLoadError`] immediately instead of as a missing match
//! later on. Writers live in [`results`] and [`plot`].

mod columns;

pub mod candidates;
pub mod known;
pub mod plot;
pub mod reference;
pub mod results;
pub mod seeds;

use crate::core::chemistry::ParseError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Missing required column '{column}' in '{path}'")]
    MissingColumn { path: String, column: &'static str },
    #[error("Invalid value in '{path}', row {row}, column '{column}': {source}")]
    InvalidValue {
        path: String,
        row: usize,
        column: String,
        source: ParseError,
    },
    #[error("Table '{path}' contains no data rows")]
    Empty { path: String },
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, DataLoadError> {
    let file = std::fs::File::open(path).map_err(|e| DataLoadError::Io {
        path: display_path(path),
        source: e,
    })?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(file))
}
