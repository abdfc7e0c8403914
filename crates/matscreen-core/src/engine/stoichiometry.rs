use crate::core::chemistry::Stoichiometry;
use crate::core::io::candidates::Candidate;
use crate::core::io::known::KnownMaterials;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Reduced ratios of the perovskite and perovskite-derived families
/// (ABX3, A2BX6, A3B2X9, ...), in formula order.
pub const PEROVSKITE_FAMILY_RATIOS: [[u32; 3]; 10] = [
    [3, 1, 6],
    [3, 2, 9],
    [1, 1, 4],
    [2, 1, 6],
    [1, 1, 3],
    [1, 2, 5],
    [4, 1, 6],
    [1, 2, 7],
    [2, 1, 5],
    [3, 1, 5],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Known,
    Novel,
}

impl Classification {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known => write!(f, "known"),
            Self::Novel => write!(f, "novel"),
        }
    }
}

/// Set of known reduced ratios. A candidate is [`Classification::Known`] when its
/// ratio is in the set.
#[derive(Debug, Clone)]
pub struct StoichiometryIndex {
    ratios: HashSet<Stoichiometry>,
    order_sensitive: bool,
}

impl StoichiometryIndex {
    pub fn from_patterns(
        patterns: impl IntoIterator<Item = Stoichiometry>,
        order_sensitive: bool,
    ) -> Self {
        let ratios = patterns
            .into_iter()
            .map(|s| if order_sensitive { s } else { s.canonical() })
            .collect();
        Self {
            ratios,
            order_sensitive,
        }
    }

    pub fn perovskite_family(order_sensitive: bool) -> Self {
        Self::from_patterns(
            PEROVSKITE_FAMILY_RATIOS
                .iter()
                .map(|r| Stoichiometry::new(r.to_vec())),
            order_sensitive,
        )
    }

    pub fn from_known(known: &KnownMaterials, order_sensitive: bool) -> Self {
        Self::from_patterns(
            known.entries().iter().map(|e| e.stoichiometry.clone()),
            order_sensitive,
        )
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn is_order_sensitive(&self) -> bool {
        self.order_sensitive
    }

    pub fn contains(&self, stoichiometry: &Stoichiometry) -> bool {
        if self.order_sensitive {
            self.ratios.contains(stoichiometry)
        } else {
            self.ratios.contains(&stoichiometry.canonical())
        }
    }

    pub fn classify(&self, candidate: &Candidate) -> Classification {
        let classification = if self.contains(&candidate.stoichiometry) {
            Classification::Known
        } else {
            Classification::Novel
        };
        debug!(
            "{} {} -> {}",
            candidate.composition, candidate.stoichiometry, classification
        );
        classification
    }
}
