//! Chemistry primitives used by every table and algorithm in the crate.

pub mod composition;
pub mod coordination;
pub mod element;
pub mod stoichiometry;

pub use composition::Composition;
pub use coordination::{Coordination, Geometry};
pub use element::Element;
pub use stoichiometry::Stoichiometry;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Formula is empty")]
    EmptyFormula,

    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("Unexpected character '{ch}' at position {position} in '{input}'")]
    UnexpectedCharacter {
        ch: char,
        position: usize,
        input: String,
    },

    #[error("Unbalanced parentheses in formula '{0}'")]
    UnbalancedParentheses(String),

    #[error("Invalid count '{count}' in formula '{input}'. Counts must be positive integers.")]
    InvalidCount { count: String, input: String },

    #[error("Count of '{element}' exceeds {max} after merging repeated entries")]
    CountOverflow { element: String, max: u32 },

    #[error("Invalid coordination number '{0}'")]
    InvalidCoordination(String),

    #[error("Invalid charge state '{0}'")]
    InvalidCharge(String),

    #[error("Invalid stoichiometry pattern '{0}'. Expected a list such as '[1, 1, 3]'.")]
    InvalidStoichiometry(String),

    #[error("Invalid numeric value '{0}'")]
    InvalidNumber(String),

    #[error("Invalid site annotation '{0}'. Expected 'Element:Charge:Coordination' (e.g., 'Pb:+2:VIII').")]
    InvalidSite(String),
}

/// Parses a formal charge such as `2`, `+2`, `-1`, `2+` or `2.0`.
pub fn parse_charge(input: &str) -> Result<i8, ParseError> {
    let trimmed = input.trim();
    let invalid = || ParseError::InvalidCharge(input.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (sign, digits) = if let Some(rest) = trimmed.strip_suffix('+') {
        (1.0, rest)
    } else if let Some(rest) = trimmed.strip_suffix('-') {
        (-1.0, rest)
    } else {
        (1.0, trimmed)
    };
    let digits = digits.strip_prefix('+').unwrap_or(digits);

    let value: f64 = digits.trim().parse().map_err(|_| invalid())?;
    let value = sign * value;
    if value.fract() != 0.0 || value < f64::from(i8::MIN) || value > f64::from(i8::MAX) {
        return Err(invalid());
    }
    Ok(value as i8)
}
