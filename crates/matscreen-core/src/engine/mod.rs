pub mod config;
pub mod error;
pub mod matching;
pub mod progress;
pub mod stoichiometry;
pub mod substitution;
