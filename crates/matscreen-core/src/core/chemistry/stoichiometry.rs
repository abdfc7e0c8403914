use super::ParseError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub(crate) fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

pub(crate) fn gcd_all(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().fold(0, gcd)
}

/// An integer element ratio, always stored in its smallest integer form.
///
/// The order of the counts follows the formula order they were taken from, so
/// `[1, 1, 3]` and `[1, 3, 1]` are distinct patterns unless compared through
/// [`Stoichiometry::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stoichiometry(Vec<u32>);

impl Stoichiometry {
    pub fn new(counts: Vec<u32>) -> Self {
        let divisor = gcd_all(counts.iter().copied());
        if divisor <= 1 {
            return Self(counts);
        }
        Self(counts.into_iter().map(|n| n / divisor).collect())
    }

    /// Parses list notation: `[1, 1, 3]`, `1,1,3`, `(1 1 3)` or `1:1:3`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidStoichiometry(input.to_string());
        let inner = input
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')']);

        let counts = inner
            .split(|c: char| c == ',' || c == ':' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| match token.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(invalid()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if counts.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(counts))
    }

    pub fn counts(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The order-independent form of this ratio (counts sorted ascending).
    pub fn canonical(&self) -> Stoichiometry {
        let mut counts = self.0.clone();
        counts.sort_unstable();
        Self(counts)
    }
}

impl FromStr for Stoichiometry {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Stoichiometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", n)?;
        }
        f.write_str("]")
    }
}

impl Serialize for Stoichiometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reduces_to_smallest_ratio() {
        assert_eq!(Stoichiometry::new(vec![2, 2, 6]).counts(), &[1, 1, 3]);
        assert_eq!(Stoichiometry::new(vec![3, 1, 6]).counts(), &[3, 1, 6]);
        assert_eq!(Stoichiometry::new(vec![4, 8]).counts(), &[1, 2]);
        assert_eq!(Stoichiometry::new(vec![5]).counts(), &[1]);
    }

    #[test]
    fn parse_accepts_list_notations() {
        let expected = Stoichiometry::new(vec![1, 1, 3]);
        assert_eq!(Stoichiometry::parse("[1, 1, 3]").unwrap(), expected);
        assert_eq!(Stoichiometry::parse("1,1,3").unwrap(), expected);
        assert_eq!(Stoichiometry::parse("(1 1 3)").unwrap(), expected);
        assert_eq!(Stoichiometry::parse("1:1:3").unwrap(), expected);
        assert_eq!(Stoichiometry::parse("[2, 2, 6]").unwrap(), expected);
    }

    #[test]
    fn parse_rejects_invalid_patterns() {
        assert!(Stoichiometry::parse("[]").is_err());
        assert!(Stoichiometry::parse("[1, 0, 3]").is_err());
        assert!(Stoichiometry::parse("[1, a, 3]").is_err());
        assert!(Stoichiometry::parse("[1.5, 3]").is_err());
    }

    #[test]
    fn canonical_ignores_order() {
        let a = Stoichiometry::new(vec![1, 3, 1]);
        let b = Stoichiometry::new(vec![1, 1, 3]);
        assert_ne!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn display_uses_list_notation() {
        assert_eq!(Stoichiometry::new(vec![1, 2, 4]).to_string(), "[1, 2, 4]");
    }

    #[test]
    fn gcd_all_handles_edge_cases() {
        assert_eq!(gcd_all([]), 0);
        assert_eq!(gcd_all([6, 9, 12]), 3);
        assert_eq!(gcd_all([7]), 7);
    }
}
