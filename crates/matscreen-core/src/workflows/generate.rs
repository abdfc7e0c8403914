use super::SkippedRow;
use crate::core::io::known::KnownMaterials;
use crate::core::io::reference::ReferenceTable;
use crate::core::io::seeds::SeedTable;
use crate::engine::config::{GenerateConfig, SeedSource, SubstitutionCriteria};
use crate::engine::error::EngineError;
use crate::engine::matching::{SynthesisSummary, join_ids, match_known};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::substitution::{IsovalentGenerator, SubstitutionResult};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

pub const TABLE_NAME: &str = "novel_materials";
pub const FILTER_NAME: &str = "isovalent_generator";

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMaterial {
    pub seed_row: usize,
    pub result: SubstitutionResult,
    /// ICSD ids of the new formula; only looked up for valid substitutions.
    pub icsd_ids: Vec<u64>,
}

/// One line of the generated-materials table.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    pub seed: String,
    pub site: String,
    pub substitute: String,
    pub charge: i8,
    pub coordination: String,
    pub target_value: f64,
    pub substitute_value: f64,
    pub difference: f64,
    pub coordination_match: bool,
    pub window_match: bool,
    pub valid: bool,
    pub novel_material: String,
    pub icsd_ids: String,
}

impl From<&GeneratedMaterial> for GenerationRecord {
    fn from(material: &GeneratedMaterial) -> Self {
        let result = &material.result;
        Self {
            seed: result.seed.to_string(),
            site: result.site.to_string(),
            substitute: result.substitute.element.to_string(),
            charge: result.substitute.charge,
            coordination: result.substitute.coordination.to_string(),
            target_value: result.target_value,
            substitute_value: result.value,
            difference: result.difference(),
            coordination_match: result.validity.coordination,
            window_match: result.validity.radius,
            valid: result.is_valid(),
            novel_material: result.material.to_string(),
            icsd_ids: join_ids(&material.icsd_ids),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub seeds: usize,
    pub skipped_seeds: usize,
    pub generated: usize,
    pub valid: usize,
    pub criteria: SubstitutionCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisSummary>,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub materials: Vec<GeneratedMaterial>,
    pub skipped: Vec<SkippedRow>,
    pub seeds: usize,
    /// Present when an ICSD table was supplied; computed over valid materials.
    pub synthesis: Option<SynthesisSummary>,
}

impl GenerationResult {
    pub fn valid(&self) -> impl Iterator<Item = &GeneratedMaterial> + '_ {
        self.materials.iter().filter(|m| m.result.is_valid())
    }

    pub fn records(&self) -> Vec<GenerationRecord> {
        self.materials.iter().map(GenerationRecord::from).collect()
    }

    pub fn summary(&self, criteria: &SubstitutionCriteria) -> GenerationSummary {
        GenerationSummary {
            seeds: self.seeds,
            skipped_seeds: self.skipped.len(),
            generated: self.materials.len(),
            valid: self.valid().count(),
            criteria: criteria.clone(),
            synthesis: self.synthesis,
        }
    }
}

#[instrument(skip_all, name = "generate_workflow")]
pub fn run(
    config: &GenerateConfig,
    reporter: &ProgressReporter,
) -> Result<GenerationResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Loading" });
    let reference = ReferenceTable::load(&config.reference_table_path)?;
    let seeds = match &config.seeds {
        SeedSource::Inline(list) => SeedTable::from_seeds(list.clone()),
        SeedSource::Table(path) => SeedTable::load(path)?,
    };
    let icsd = config
        .known_materials_path
        .as_deref()
        .map(KnownMaterials::load)
        .transpose()?
        .map(|known| known.with_icsd_ids());
    reporter.report(Progress::PhaseFinish);

    info!(
        "Generating substitutions for {} seed(s) against {} reference ion(s).",
        seeds.len(),
        reference.len()
    );
    let result = generate_from_seeds(&seeds, &reference, &config.criteria, icsd.as_ref(), reporter);

    info!(
        "Generation complete: {} material(s), {} valid, {} seed(s) skipped.",
        result.materials.len(),
        result.valid().count(),
        result.skipped.len()
    );
    Ok(result)
}

/// Runs the generator for every seed row. Rows that fail to parse or whose sites
/// cannot be resolved are recorded as skipped.
pub fn generate_from_seeds(
    seeds: &SeedTable,
    reference: &ReferenceTable,
    criteria: &SubstitutionCriteria,
    icsd: Option<&KnownMaterials>,
    reporter: &ProgressReporter,
) -> GenerationResult {
    reporter.report(Progress::PhaseStart { name: "Generating" });
    reporter.report(Progress::TaskStart {
        total_steps: seeds.len() as u64,
    });

    let mut materials = Vec::new();
    let mut skipped = Vec::new();
    let mut skip = |row: usize, text: &str, reason: String| {
        warn!("Skipping seed row {} ('{}'): {}", row, text, reason);
        reporter.report(Progress::RowSkipped {
            row,
            reason: reason.clone(),
        });
        skipped.push(SkippedRow::new(row, text, reason));
    };

    for row in seeds.rows() {
        reporter.report(Progress::Item(row.text.clone()));
        let outcome = row
            .parsed
            .as_ref()
            .map_err(ToString::to_string)
            .and_then(|seed| {
                if seed.sites.is_empty() {
                    return Err("seed has no substitutable sites".to_string());
                }
                IsovalentGenerator::new(seed, reference, criteria).map_err(|e| e.to_string())
            });

        match outcome {
            Ok(generator) => {
                let before = materials.len();
                materials.extend(generator.iter().map(|result| GeneratedMaterial {
                    seed_row: row.row,
                    result,
                    icsd_ids: Vec::new(),
                }));
                debug!(
                    "Seed {} produced {} substitution(s).",
                    row.text,
                    materials.len() - before
                );
            }
            Err(reason) => skip(row.row, &row.text, reason),
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let synthesis = icsd.map(|icsd| {
        let (matches, summary) = match_known(
            materials
                .iter()
                .filter(|m| m.result.is_valid())
                .map(|m| &m.result.material),
            icsd,
        );
        let valid = materials.iter_mut().filter(|m| m.result.is_valid());
        for (material, ids) in valid.zip(matches) {
            material.icsd_ids = ids;
        }
        summary
    });
    reporter.report(Progress::PhaseFinish);

    GenerationResult {
        materials,
        skipped,
        seeds: seeds.len(),
        synthesis,
    }
}
