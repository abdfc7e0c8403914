use crate::core::chemistry::Composition;
use crate::core::io::known::KnownMaterials;
use serde::Serialize;

/// Counts behind a synthesis-rate estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SynthesisSummary {
    pub total: usize,
    pub true_positive: usize,
    pub false_positive: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_rate: Option<f64>,
}

impl SynthesisSummary {
    pub fn from_counts(total: usize, true_positive: usize) -> Self {
        let true_positive = true_positive.min(total);
        Self {
            total,
            true_positive,
            false_positive: total - true_positive,
            synthesis_rate: synthesis_rate(true_positive, total),
        }
    }
}

/// `p_syn = true_positive × 100 / total`, or `None` for an empty run.
pub fn synthesis_rate(true_positive: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(true_positive as f64 * 100.0 / total as f64)
    }
}

/// ICSD identifiers of all entries sharing the reduced formula, first-seen order,
/// without repeats.
pub fn icsd_ids_for(formula: &Composition, known: &KnownMaterials) -> Vec<u64> {
    let mut ids: Vec<u64> = Vec::new();
    for entry in known.find_by_formula(formula) {
        for id in &entry.icsd_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
    }
    ids
}

/// Matches each formula against the known-materials table.
///
/// Returns the matched id list per material and a summary whose true-positive
/// count is the number of materials with at least one id.
pub fn match_known<'a>(
    formulas: impl IntoIterator<Item = &'a Composition>,
    known: &KnownMaterials,
) -> (Vec<Vec<u64>>, SynthesisSummary) {
    let matches: Vec<Vec<u64>> = formulas
        .into_iter()
        .map(|formula| icsd_ids_for(formula, known))
        .collect();
    let true_positive = matches.iter().filter(|ids| !ids.is_empty()).count();
    let summary = SynthesisSummary::from_counts(matches.len(), true_positive);
    (matches, summary)
}

/// Renders an id list the way it is stored in result tables (`"161481,181288"`).
pub fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::known::KnownMaterial;

    fn comp(formula: &str) -> Composition {
        Composition::parse(formula).unwrap()
    }

    fn icsd() -> KnownMaterials {
        KnownMaterials::from_entries(vec![
            KnownMaterial::from_formula(comp("CsPbI3"), vec![161481, 181288]),
            KnownMaterial::from_formula(comp("PbCsI3"), vec![181288, 250744]),
            KnownMaterial::from_formula(comp("BaTiO3"), vec![27970]),
            KnownMaterial::from_formula(comp("CsGeI3"), vec![]),
        ])
    }

    #[test]
    fn synthesis_rate_is_none_for_empty_runs() {
        assert_eq!(synthesis_rate(0, 0), None);
        assert_eq!(synthesis_rate(1, 4), Some(25.0));
        assert_eq!(synthesis_rate(3, 3), Some(100.0));
    }

    #[test]
    fn icsd_ids_ignore_element_order_and_repeats() {
        let ids = icsd_ids_for(&comp("I3PbCs"), &icsd());
        assert_eq!(ids, vec![161481, 181288, 250744]);
        assert!(icsd_ids_for(&comp("Cs2Pb2I6"), &icsd()).len() == 3);
    }

    #[test]
    fn match_known_counts_materials_with_ids() {
        let formulas = [comp("CsPbI3"), comp("CsGeI3"), comp("SrTiO3"), comp("BaTiO3")];
        let (matches, summary) = match_known(&formulas, &icsd());

        assert_eq!(matches.len(), 4);
        assert!(matches[1].is_empty());
        assert!(matches[2].is_empty());
        assert_eq!(matches[3], vec![27970]);
        assert_eq!(
            summary,
            SynthesisSummary {
                total: 4,
                true_positive: 2,
                false_positive: 2,
                synthesis_rate: Some(50.0),
            }
        );
    }

    #[test]
    fn match_known_on_nothing_has_no_rate() {
        let (matches, summary) = match_known(&[], &icsd());
        assert!(matches.is_empty());
        assert_eq!(summary.synthesis_rate, None);
        assert_eq!(summary.false_positive, 0);
    }

    #[test]
    fn join_ids_uses_commas() {
        assert_eq!(join_ids(&[1, 22, 333]), "1,22,333");
        assert_eq!(join_ids(&[]), "");
    }
}
