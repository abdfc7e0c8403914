//! # matscreen Core Library
//!
//! Screening of candidate crystalline materials against known stoichiometries, and
//! generation of new candidates through isovalent element substitution, driven by
//! static reference tables (Shannon ionic radii and an ICSD-derived materials table).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that each concern can be tested on its own.
//!
//! - **[`core`]: The Foundation.** Stateless chemistry primitives (`Element`,
//!   `Coordination`, `Composition`, `Stoichiometry`) and the loaders and writers for
//!   every table the toolkit reads or produces.
//!
//! - **[`engine`]: The Logic Core.** The stoichiometry filter, the isovalent generator,
//!   ICSD matching, configuration objects and the error types shared by the workflows.
//!
//! - **[`workflows`]: The Public API.** Complete batch procedures (`screen`, `generate`)
//!   that load their inputs, run the engine over every row and return a structured
//!   result in which per-row failures are recorded instead of aborting the run.

pub mod core;
pub mod engine;
pub mod workflows;
