//! # Core Module
//!
//! Fundamental building blocks of the screening toolkit.
//!
//! - **Chemistry** ([`chemistry`]) - element symbols, coordination numbers, formula
//!   compositions and reduced stoichiometric ratios
//! - **Table I/O** ([`io`]) - loaders for the reference, known-materials, candidate and
//!   seed tables, plus result tables, run summaries and plots
//!
//! Everything in this module is immutable once constructed; the engine layer only
//! reads from it.

pub mod chemistry;
pub mod io;
