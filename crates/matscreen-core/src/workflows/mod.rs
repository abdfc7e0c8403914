//! # Workflows Module
//!
//! Batch entry points that tie the loaders and the engine together.
//!
//! - **Screen** ([`screen`]): classify every candidate of a table by its reduced
//!   stoichiometric ratio and look up ICSD confirmations for the matches.
//! - **Generate** ([`generate`]): enumerate isovalent substitutions for a set of seed
//!   materials and look up ICSD confirmations for the valid ones.
//!
//! Both workflows load their inputs from a configuration object, report progress
//! through a [`ProgressReporter`](crate::engine::progress::ProgressReporter), and
//! return rows that could not be processed as [`SkippedRow`]s rather than failing.
//! Writing result files is left to the caller.

pub mod generate;
pub mod screen;

use serde::Serialize;

/// An input row that was not processed, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub text: String,
    pub reason: String,
}

impl SkippedRow {
    pub fn new(row: usize, text: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            row,
            text: text.into(),
            reason: reason.to_string(),
        }
    }
}
