use super::config::SubstitutionCriteria;
use super::error::LookupError;
use crate::core::chemistry::{Composition, Coordination, Element};
use crate::core::io::reference::{IonRecord, ReferenceTable};
use crate::core::io::seeds::{SeedMaterial, Site};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Which acceptance checks a substitution passed.
///
/// The charge check always passes for emitted results; substitutes with a
/// different formal charge are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub charge: bool,
    pub coordination: bool,
    pub radius: bool,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        self.charge && self.coordination && self.radius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionResult {
    pub seed: Composition,
    pub site: Site,
    pub substitute: IonRecord,
    pub material: Composition,
    /// Property value of the original ion at the site.
    pub target_value: f64,
    /// Property value of the substitute.
    pub value: f64,
    pub validity: Validity,
}

impl SubstitutionResult {
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Signed deviation of the substitute from the original ion.
    pub fn difference(&self) -> f64 {
        self.value - self.target_value
    }
}

#[derive(Debug, Clone)]
struct SiteTarget {
    site: Site,
    value: f64,
    half_width: f64,
}

/// Enumerates isovalent substitutions of one seed against a reference table.
///
/// Sites are resolved when the generator is built. Iteration is lazy and can
/// be repeated; every pass yields the same sequence.
#[derive(Debug, Clone)]
pub struct IsovalentGenerator<'a> {
    seed: &'a SeedMaterial,
    reference: &'a ReferenceTable,
    criteria: &'a SubstitutionCriteria,
    targets: Vec<SiteTarget>,
}

impl<'a> IsovalentGenerator<'a> {
    pub fn new(
        seed: &'a SeedMaterial,
        reference: &'a ReferenceTable,
        criteria: &'a SubstitutionCriteria,
    ) -> Result<Self, LookupError> {
        let mut targets = Vec::with_capacity(seed.sites.len());
        for site in &seed.sites {
            if !seed.composition.contains(site.element) {
                return Err(LookupError::ElementNotInSeed {
                    element: site.element,
                    formula: seed.composition.to_string(),
                });
            }
            let key = site.key();
            let record = reference
                .get(&key)
                .ok_or(LookupError::UnknownIon { key })?;
            let value = record
                .property(&criteria.property)
                .ok_or_else(|| LookupError::MissingProperty {
                    key,
                    property: criteria.property.clone(),
                })?;
            let half_width = criteria.window.half_width(value);
            trace!(
                "Site {} of {}: {} = {} accepts ±{} ({})",
                site, seed.composition, criteria.property, value, half_width, criteria.bound
            );
            targets.push(SiteTarget {
                site: *site,
                value,
                half_width,
            });
        }
        Ok(Self {
            seed,
            reference,
            criteria,
            targets,
        })
    }

    pub fn seed(&self) -> &SeedMaterial {
        self.seed
    }

    pub fn iter(&self) -> Substitutions<'_> {
        Substitutions {
            generator: self,
            site_index: 0,
            record_index: 0,
            site_state: None,
        }
    }

    fn valid_elements(&self, target: &SiteTarget) -> HashSet<Element> {
        self.reference
            .with_charge(target.site.charge)
            .filter_map(|record| self.assess(target, record))
            .filter(|(_, validity)| validity.is_valid())
            .map(|(record, _)| record.element)
            .collect()
    }

    /// Applies the checks to one same-charge record. `None` for records that can
    /// never be emitted at this site.
    fn assess<'r>(&self, target: &SiteTarget, record: &'r IonRecord) -> Option<(&'r IonRecord, Validity)> {
        if record.charge != target.site.charge || record.element == target.site.element {
            return None;
        }
        let value = record.property(&self.criteria.property)?;
        let coordination = !self.criteria.match_coordination
            || record.coordination == target.site.coordination;
        let radius = self
            .criteria
            .bound
            .admits(value, target.value, target.half_width);
        Some((
            record,
            Validity {
                charge: true,
                coordination,
                radius,
            },
        ))
    }

    fn build_result(
        &self,
        target: &SiteTarget,
        record: &IonRecord,
        validity: Validity,
    ) -> Option<SubstitutionResult> {
        let material = match self
            .seed
            .composition
            .substitute(target.site.element, record.element)
        {
            Ok(material) => material,
            Err(e) => {
                warn!(
                    "Dropping {} at {} of {}: {}",
                    record.element, target.site, self.seed.composition, e
                );
                return None;
            }
        };
        let value = record.property(&self.criteria.property).unwrap_or(f64::NAN);
        Some(SubstitutionResult {
            seed: self.seed.composition.clone(),
            site: target.site,
            substitute: record.clone(),
            material,
            target_value: target.value,
            value,
            validity,
        })
    }
}

impl<'g> IntoIterator for &'g IsovalentGenerator<'_> {
    type Item = SubstitutionResult;
    type IntoIter = Substitutions<'g>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a generator for `seed`; see [`IsovalentGenerator`].
pub fn generate<'a>(
    seed: &'a SeedMaterial,
    reference: &'a ReferenceTable,
    criteria: &'a SubstitutionCriteria,
) -> Result<IsovalentGenerator<'a>, LookupError> {
    IsovalentGenerator::new(seed, reference, criteria)
}

#[derive(Debug, Default)]
struct SiteState {
    emitted: HashSet<Element>,
    /// Elements with at least one valid record at this site. Only computed
    /// when rejected substitutes are requested.
    valid: HashSet<Element>,
    rejected: HashSet<(Element, Coordination)>,
}

/// Iterator over the substitutions of one generator, in seed-site order and
/// then reference-table order.
pub struct Substitutions<'g> {
    generator: &'g IsovalentGenerator<'g>,
    site_index: usize,
    record_index: usize,
    site_state: Option<SiteState>,
}

impl Iterator for Substitutions<'_> {
    type Item = SubstitutionResult;

    fn next(&mut self) -> Option<Self::Item> {
        let generator = self.generator;
        let records = generator.reference.records();
        let include_rejected = generator.criteria.include_rejected;

        loop {
            let target = generator.targets.get(self.site_index)?;
            let state = self.site_state.get_or_insert_with(|| SiteState {
                valid: if include_rejected {
                    generator.valid_elements(target)
                } else {
                    HashSet::new()
                },
                ..SiteState::default()
            });

            while let Some(record) = records.get(self.record_index) {
                self.record_index += 1;
                let Some((record, validity)) = generator.assess(target, record) else {
                    continue;
                };

                let emit = if validity.is_valid() {
                    state.emitted.insert(record.element)
                } else {
                    include_rejected
                        && !state.valid.contains(&record.element)
                        && state.rejected.insert((record.element, record.coordination))
                };
                if emit {
                    if let Some(result) = generator.build_result(target, record, validity) {
                        return Some(result);
                    }
                }
            }

            self.site_index += 1;
            self.record_index = 0;
            self.site_state = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{SubstitutionCriteriaBuilder, ToleranceBound};

    fn el(symbol: &str) -> Element {
        Element::new(symbol).unwrap()
    }

    fn cn(n: u8) -> Coordination {
        Coordination::new(n)
    }

    fn table() -> ReferenceTable {
        ReferenceTable::from_records(vec![
            IonRecord::new(el("Sr"), 2, cn(12), 1.44),
            IonRecord::new(el("Ba"), 2, cn(12), 1.61),
            IonRecord::new(el("Ca"), 2, cn(12), 1.34),
            IonRecord::new(el("Ca"), 2, cn(8), 1.12),
            IonRecord::new(el("Pb"), 2, cn(12), 1.49),
            IonRecord::new(el("Pb"), 2, cn(8), 1.29),
            IonRecord::new(el("La"), 3, cn(12), 1.36),
            IonRecord::new(el("K"), 1, cn(12), 1.64),
            IonRecord::new(el("Ti"), 4, cn(6), 0.605),
        ])
    }

    fn srtio3() -> SeedMaterial {
        SeedMaterial::parse("SrTiO3", "Sr:+2:XII").unwrap()
    }

    fn formulas(generator: &IsovalentGenerator<'_>) -> Vec<String> {
        generator.iter().map(|r| r.material.to_string()).collect()
    }

    #[test]
    fn substitutes_same_charge_ions_within_tolerance() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteria::with_tolerance(0.2);
        let generator = generate(&seed, &reference, &criteria).unwrap();

        assert_eq!(formulas(&generator), vec!["BaTiO3", "CaTiO3", "PbTiO3"]);
        for result in &generator {
            assert!(result.is_valid());
            assert_eq!(result.site.element, el("Sr"));
            assert_eq!(result.seed.to_string(), "SrTiO3");
        }
    }

    #[test]
    fn never_emits_a_different_charge() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteriaBuilder::new()
            .tolerance(10.0)
            .match_coordination(false)
            .include_rejected(true)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &criteria).unwrap();

        let results: Vec<_> = generator.iter().collect();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.substitute.charge == 2));
        assert!(results.iter().all(|r| r.substitute.element != el("Sr")));
    }

    #[test]
    fn iteration_is_restartable_and_deterministic() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteria::default();
        let generator = generate(&seed, &reference, &criteria).unwrap();

        let first: Vec<_> = generator.iter().collect();
        let second: Vec<_> = generator.iter().collect();
        assert_eq!(first, second);

        let rebuilt = generate(&seed, &reference, &criteria).unwrap();
        assert_eq!(first, rebuilt.iter().collect::<Vec<_>>());
    }

    #[test]
    fn inclusive_and_exclusive_bounds_differ_at_the_boundary() {
        let reference = ReferenceTable::from_records(vec![
            IonRecord::new(el("Sr"), 2, cn(12), 1.5),
            IonRecord::new(el("Ba"), 2, cn(12), 1.75),
            IonRecord::new(el("Ca"), 2, cn(12), 1.25),
        ]);
        let seed = srtio3();

        let inclusive = SubstitutionCriteria::with_tolerance(0.25);
        let generator = generate(&seed, &reference, &inclusive).unwrap();
        assert_eq!(formulas(&generator), vec!["BaTiO3", "CaTiO3"]);

        let exclusive = SubstitutionCriteriaBuilder::new()
            .tolerance(0.25)
            .bound(ToleranceBound::Exclusive)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &exclusive).unwrap();
        assert!(formulas(&generator).is_empty());
    }

    #[test]
    fn decimal_radii_at_the_tolerance_follow_the_bound() {
        let reference = ReferenceTable::from_records(vec![
            IonRecord::new(el("Sr"), 2, cn(12), 0.5),
            IonRecord::new(el("Ba"), 2, cn(12), 0.41),
        ]);
        let seed = srtio3();
        let inclusive = SubstitutionCriteria::with_tolerance(0.09);
        let generator = generate(&seed, &reference, &inclusive).unwrap();
        assert_eq!(formulas(&generator), vec!["BaTiO3"]);

        let reference = ReferenceTable::from_records(vec![
            IonRecord::new(el("Sr"), 2, cn(12), 1.44),
            IonRecord::new(el("Ca"), 2, cn(12), 1.34),
        ]);
        let exclusive = SubstitutionCriteriaBuilder::new()
            .tolerance(0.1)
            .bound(ToleranceBound::Exclusive)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &exclusive).unwrap();
        assert!(formulas(&generator).is_empty());

        let inclusive = SubstitutionCriteria::with_tolerance(0.1);
        let generator = generate(&seed, &reference, &inclusive).unwrap();
        assert_eq!(formulas(&generator), vec!["CaTiO3"]);
    }

    #[test]
    fn relative_window_follows_hume_rothery_percentage() {
        let seed = srtio3();
        let reference = table();
        // 15% of 1.44 is 0.216: Ba (1.61) and Ca (1.34) and Pb (1.49) are within.
        let criteria = SubstitutionCriteriaBuilder::new().percent(15.0).build().unwrap();
        let generator = generate(&seed, &reference, &criteria).unwrap();
        assert_eq!(formulas(&generator), vec!["BaTiO3", "CaTiO3", "PbTiO3"]);

        let criteria = SubstitutionCriteriaBuilder::new().percent(5.0).build().unwrap();
        let generator = generate(&seed, &reference, &criteria).unwrap();
        assert_eq!(formulas(&generator), vec!["PbTiO3"]);
    }

    #[test]
    fn coordination_matching_can_be_disabled() {
        let reference = ReferenceTable::from_records(vec![
            IonRecord::new(el("Sr"), 2, cn(12), 1.44),
            IonRecord::new(el("Ca"), 2, cn(8), 1.40),
            IonRecord::new(el("Ca"), 2, cn(12), 1.60),
        ]);
        let seed = srtio3();

        let strict = SubstitutionCriteria::with_tolerance(0.05);
        assert!(formulas(&generate(&seed, &reference, &strict).unwrap()).is_empty());

        let relaxed = SubstitutionCriteriaBuilder::new()
            .tolerance(0.05)
            .match_coordination(false)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &relaxed).unwrap();
        let results: Vec<_> = generator.iter().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].substitute.coordination, cn(8));
    }

    #[test]
    fn each_replacement_element_is_emitted_once_per_site() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteriaBuilder::new()
            .tolerance(0.5)
            .match_coordination(false)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &criteria).unwrap();

        let results: Vec<_> = generator.iter().collect();
        let elements: Vec<_> = results.iter().map(|r| r.substitute.element).collect();
        assert_eq!(elements, vec![el("Ba"), el("Ca"), el("Pb")]);
        // First qualifying record in table order wins.
        assert_eq!(results[1].substitute.coordination, cn(12));
    }

    #[test]
    fn rejected_substitutes_are_flagged_when_requested() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteriaBuilder::new()
            .tolerance(0.06)
            .include_rejected(true)
            .build()
            .unwrap();
        let generator = generate(&seed, &reference, &criteria).unwrap();
        let results: Vec<_> = generator.iter().collect();

        let valid: Vec<_> = results.iter().filter(|r| r.is_valid()).collect();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].material.to_string(), "PbTiO3");

        let ba = results
            .iter()
            .find(|r| r.substitute.element == el("Ba"))
            .unwrap();
        assert!(!ba.validity.radius);
        assert!(ba.validity.coordination);

        let ca_cn8 = results
            .iter()
            .find(|r| r.substitute.element == el("Ca") && r.substitute.coordination == cn(8))
            .unwrap();
        assert!(!ca_cn8.validity.coordination);

        // Pb has a valid record, so its CN VIII record is not reported as rejected.
        assert_eq!(
            results
                .iter()
                .filter(|r| r.substitute.element == el("Pb"))
                .count(),
            1
        );
    }

    #[test]
    fn multiple_sites_are_enumerated_in_seed_order() {
        let reference = ReferenceTable::from_records(vec![
            IonRecord::new(el("Cs"), 1, cn(12), 1.88),
            IonRecord::new(el("Rb"), 1, cn(12), 1.72),
            IonRecord::new(el("Pb"), 2, cn(6), 1.19),
            IonRecord::new(el("Sn"), 2, cn(6), 1.10),
        ]);
        let seed = SeedMaterial::parse("CsPbI3", "Pb:+2:VI;Cs:+1:XII").unwrap();
        let criteria = SubstitutionCriteria::with_tolerance(0.2);
        let generator = generate(&seed, &reference, &criteria).unwrap();
        assert_eq!(formulas(&generator), vec!["CsSnI3", "RbPbI3"]);
    }

    #[test]
    fn difference_is_signed_relative_to_the_site() {
        let seed = srtio3();
        let reference = table();
        let criteria = SubstitutionCriteria::with_tolerance(0.2);
        let generator = generate(&seed, &reference, &criteria).unwrap();
        let ca = generator
            .iter()
            .find(|r| r.substitute.element == el("Ca"))
            .unwrap();
        assert!((ca.difference() + 0.10).abs() < 1e-9);
        assert!((ca.target_value - 1.44).abs() < 1e-12);
    }

    #[test]
    fn unresolvable_sites_fail_up_front() {
        let reference = table();
        let criteria = SubstitutionCriteria::default();

        let seed = SeedMaterial::parse("SrTiO3", "Sr:+2:VI").unwrap();
        assert!(matches!(
            generate(&seed, &reference, &criteria),
            Err(LookupError::UnknownIon { .. })
        ));

        let seed = SeedMaterial::parse("SrTiO3", "Ba:+2:XII").unwrap();
        assert!(matches!(
            generate(&seed, &reference, &criteria),
            Err(LookupError::ElementNotInSeed { .. })
        ));

        let seed = srtio3();
        let criteria = SubstitutionCriteriaBuilder::new()
            .property("Electronegativity")
            .build()
            .unwrap();
        assert!(matches!(
            generate(&seed, &reference, &criteria),
            Err(LookupError::MissingProperty { .. })
        ));
    }

    #[test]
    fn seed_without_sites_yields_nothing() {
        let seed = SeedMaterial::parse("SrTiO3", "").unwrap();
        let reference = table();
        let criteria = SubstitutionCriteria::default();
        let generator = generate(&seed, &reference, &criteria).unwrap();
        assert_eq!(generator.iter().count(), 0);
    }
}
