use super::ParseError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MAX_COORDINATION: u8 = 16;

/// Geometry qualifier attached to some Shannon coordination entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// `SQ`, square planar.
    SquarePlanar,
    /// `PY`, pyramidal.
    Pyramidal,
}

impl Geometry {
    fn suffix(&self) -> &'static str {
        match self {
            Geometry::SquarePlanar => "SQ",
            Geometry::Pyramidal => "PY",
        }
    }
}

/// Coordination number of an ion, as it appears in Shannon's radius tables.
///
/// Accepts Roman numerals (`VIII`, `IVSQ`, `IIIPY`) as well as plain integers
/// (`8`, `8.0`). Two coordinations are equal only if both the number and the
/// geometry qualifier agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordination {
    number: u8,
    geometry: Option<Geometry>,
}

impl Coordination {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            geometry: None,
        }
    }

    pub fn with_geometry(number: u8, geometry: Geometry) -> Self {
        Self {
            number,
            geometry: Some(geometry),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidCoordination(input.to_string());
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            if value.fract() != 0.0 || value < 1.0 || value > f64::from(MAX_COORDINATION) {
                return Err(invalid());
            }
            return Ok(Self::new(value as u8));
        }

        let upper = trimmed.to_ascii_uppercase();
        let (numeral, geometry) = if let Some(rest) = upper.strip_suffix("SQ") {
            (rest, Some(Geometry::SquarePlanar))
        } else if let Some(rest) = upper.strip_suffix("PY") {
            (rest, Some(Geometry::Pyramidal))
        } else {
            (upper.as_str(), None)
        };

        let number = roman_to_u8(numeral).ok_or_else(invalid)?;
        if number == 0 || number > MAX_COORDINATION {
            return Err(invalid());
        }
        Ok(Self { number, geometry })
    }
}

fn roman_to_u8(numeral: &str) -> Option<u8> {
    if numeral.is_empty() {
        return None;
    }
    let values: Vec<i32> = numeral
        .chars()
        .map(|c| match c {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let mut total: i32 = 0;
    for (i, &value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(&next) if next > value => total -= value,
            _ => total += value,
        }
    }
    let number = u8::try_from(total).ok()?;
    // Reject non-canonical spellings such as "IIII" or "VV".
    (u8_to_roman(number) == numeral).then_some(number)
}

fn u8_to_roman(mut number: u8) -> String {
    const TABLE: [(u8, &str); 5] = [(10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I")];
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while number >= value {
            out.push_str(symbol);
            number -= value;
        }
    }
    out
}

impl FromStr for Coordination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&u8_to_roman(self.number))?;
        if let Some(geometry) = self.geometry {
            f.write_str(geometry.suffix())?;
        }
        Ok(())
    }
}

impl Serialize for Coordination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
