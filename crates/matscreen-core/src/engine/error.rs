use thiserror::Error;

use super::config::ConfigError;
use crate::core::chemistry::{Element, ParseError};
use crate::core::io::DataLoadError;
use crate::core::io::reference::IonKey;

/// A seed or candidate refers to something the reference data cannot resolve.
///
/// Batch workflows record these and move on to the next row.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error("Ion {key} is not present in the reference table")]
    UnknownIon { key: IonKey },

    #[error("Site element {element} does not occur in seed {formula}")]
    ElementNotInSeed { element: Element, formula: String },

    #[error("Property '{property}' is not available for ion {key}")]
    MissingProperty { key: IonKey, property: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load input data: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Reference lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
