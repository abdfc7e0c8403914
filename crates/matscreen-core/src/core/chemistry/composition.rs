use super::stoichiometry::{Stoichiometry, gcd_all};
use super::{Element, ParseError};
use std::fmt;
use std::str::FromStr;

/// Elemental composition of a material: element → integer count, in formula order.
///
/// Repeated elements are merged into the position of their first appearance, so
/// `"CH3COOH"` becomes `C2H4O2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Composition {
    entries: Vec<(Element, u32)>,
}

impl Composition {
    /// Builds a composition from `(element, count)` pairs, merging duplicates.
    ///
    /// Zero counts are dropped. A merged count that does not fit in `u32` is an error.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Element, u32)>,
    ) -> Result<Self, ParseError> {
        let mut merged: Vec<(Element, u32)> = Vec::new();
        for (element, count) in entries {
            if count == 0 {
                continue;
            }
            match merged.iter_mut().find(|(e, _)| *e == element) {
                Some((_, existing)) => {
                    *existing = existing
                        .checked_add(count)
                        .ok_or_else(|| ParseError::CountOverflow {
                            element: element.to_string(),
                            max: u32::MAX,
                        })?;
                }
                None => merged.push((element, count)),
            }
        }
        Ok(Self { entries: merged })
    }

    /// Parses a chemical formula such as `CsPbI3` or `Ca3(PO4)2`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        FormulaParser::new(input).parse()
    }

    pub fn entries(&self) -> &[(Element, u32)] {
        &self.entries
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.entries.iter().map(|(e, _)| *e)
    }

    pub fn count(&self, element: Element) -> Option<u32> {
        self.entries
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, n)| *n)
    }

    pub fn contains(&self, element: Element) -> bool {
        self.count(element).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts in formula order, reduced to the smallest integer ratio.
    pub fn stoichiometry(&self) -> Stoichiometry {
        Stoichiometry::new(self.entries.iter().map(|(_, n)| *n).collect())
    }

    /// The same composition divided by the GCD of its counts (`Pb2I4` → `PbI2`).
    pub fn reduced(&self) -> Composition {
        let divisor = gcd_all(self.entries.iter().map(|(_, n)| *n)).max(1);
        Self {
            entries: self
                .entries
                .iter()
                .map(|(e, n)| (*e, n / divisor))
                .collect(),
        }
    }

    /// Replaces `from` with `to`, keeping the position of `from`.
    ///
    /// When `to` is already present the counts are merged at the earlier position.
    pub fn substitute(&self, from: Element, to: Element) -> Result<Composition, ParseError> {
        Self::from_entries(
            self.entries
                .iter()
                .map(|(e, n)| (if *e == from { to } else { *e }, *n)),
        )
    }

    /// An order-independent identity of the reduced formula, used for database matching.
    pub fn formula_key(&self) -> Vec<(Element, u32)> {
        let mut key = self.reduced().entries;
        key.sort_unstable_by_key(|(e, _)| *e);
        key
    }
}

impl FromStr for Composition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (element, count) in &self.entries {
            write!(f, "{}", element)?;
            if *count != 1 {
                write!(f, "{}", count)?;
            }
        }
        Ok(())
    }
}

struct FormulaParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Composition, ParseError> {
        let mut groups: Vec<(Vec<(Element, u32)>, Option<char>)> = vec![(Vec::new(), None)];

        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => self.pos += 1,
                '(' | '[' => {
                    self.pos += 1;
                    groups.push((Vec::new(), Some(c)));
                }
                ')' | ']' => {
                    self.pos += 1;
                    let expected_open = if c == ')' { '(' } else { '[' };
                    let (group, open) = groups
                        .pop()
                        .ok_or_else(|| self.unbalanced())?;
                    if open != Some(expected_open) {
                        return Err(self.unbalanced());
                    }
                    let multiplier = self.read_count()?;
                    let top = groups.last_mut().ok_or_else(|| self.unbalanced())?;
                    for (element, count) in group {
                        let scaled = count
                            .checked_mul(multiplier)
                            .ok_or_else(|| self.invalid_count(multiplier.to_string()))?;
                        top.0.push((element, scaled));
                    }
                }
                c if c.is_ascii_uppercase() => {
                    let element = self.read_element()?;
                    let count = self.read_count()?;
                    if let Some(top) = groups.last_mut() {
                        top.0.push((element, count));
                    }
                }
                other => {
                    return Err(ParseError::UnexpectedCharacter {
                        ch: other,
                        position: self.pos,
                        input: self.input.to_string(),
                    });
                }
            }
        }

        if groups.len() != 1 {
            return Err(self.unbalanced());
        }
        let (entries, _) = groups.pop().ok_or_else(|| self.unbalanced())?;
        let composition = Composition::from_entries(entries)?;
        if composition.is_empty() {
            return Err(ParseError::EmptyFormula);
        }
        Ok(composition)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn read_element(&mut self) -> Result<Element, ParseError> {
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(|c| c.is_ascii_lowercase()) {
            self.pos += 1;
        }
        let symbol: String = self.chars[start..self.pos].iter().collect();
        Element::new(&symbol)
    }

    fn read_count(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(1);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid_count(text)),
        }
    }

    fn unbalanced(&self) -> ParseError {
        ParseError::UnbalancedParentheses(self.input.to_string())
    }

    fn invalid_count(&self, count: String) -> ParseError {
        ParseError::InvalidCount {
            count,
            input: self.input.to_string(),
        }
    }
}
