use super::SkippedRow;
use crate::core::io::candidates::{Candidate, CandidateTable};
use crate::core::io::known::KnownMaterials;
use crate::engine::config::{ConfigError, RatioSource, ScreenConfig, StoichiometryConfig};
use crate::engine::error::EngineError;
use crate::engine::matching::{SynthesisSummary, join_ids, match_known};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stoichiometry::{Classification, StoichiometryIndex};
use serde::Serialize;
use tracing::{info, instrument, warn};

pub const TABLE_NAME: &str = "candidates";
pub const FILTER_NAME: &str = "stoichiometry_match";

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedCandidate {
    pub row: usize,
    pub candidate: Candidate,
    pub classification: Classification,
    /// ICSD ids of the reduced formula; only looked up for matched candidates.
    pub icsd_ids: Vec<u64>,
}

/// One line of the classification table.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenRecord {
    pub composition: String,
    #[serde(rename = "Atoms")]
    pub atoms: String,
    pub classification: Classification,
    pub icsd_ids: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenSummary {
    pub scanned: usize,
    pub matched: usize,
    pub novel: usize,
    pub skipped: usize,
    pub ratio_count: usize,
    pub stoichiometry: StoichiometryConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisSummary>,
}

#[derive(Debug, Clone)]
pub struct ScreenResult {
    pub candidates: Vec<ScreenedCandidate>,
    pub skipped: Vec<SkippedRow>,
    pub ratio_count: usize,
    /// Present when an ICSD table was supplied; computed over matched candidates.
    pub synthesis: Option<SynthesisSummary>,
}

impl ScreenResult {
    pub fn matched(&self) -> impl Iterator<Item = &ScreenedCandidate> + '_ {
        self.candidates
            .iter()
            .filter(|c| c.classification.is_known())
    }

    pub fn records(&self) -> Vec<ScreenRecord> {
        self.candidates
            .iter()
            .map(|c| ScreenRecord {
                composition: c.candidate.composition.to_string(),
                atoms: c.candidate.stoichiometry.to_string(),
                classification: c.classification,
                icsd_ids: join_ids(&c.icsd_ids),
            })
            .collect()
    }

    pub fn summary(&self, stoichiometry: StoichiometryConfig) -> ScreenSummary {
        let matched = self.matched().count();
        ScreenSummary {
            scanned: self.candidates.len() + self.skipped.len(),
            matched,
            novel: self.candidates.len() - matched,
            skipped: self.skipped.len(),
            ratio_count: self.ratio_count,
            stoichiometry,
            synthesis: self.synthesis,
        }
    }
}

#[instrument(skip_all, name = "screen_workflow")]
pub fn run(config: &ScreenConfig, reporter: &ProgressReporter) -> Result<ScreenResult, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Loading" });
    let candidates = CandidateTable::load(&config.candidates_path)?;
    let known = config
        .known_materials_path
        .as_deref()
        .map(KnownMaterials::load)
        .transpose()?;

    let order_sensitive = config.stoichiometry.order_sensitive;
    let index = match config.stoichiometry.source {
        RatioSource::Builtin => StoichiometryIndex::perovskite_family(order_sensitive),
        RatioSource::KnownMaterials => {
            let known = known
                .as_ref()
                .ok_or(ConfigError::MissingParameter("known_materials_path"))?;
            StoichiometryIndex::from_known(known, order_sensitive)
        }
    };
    let icsd = known.as_ref().map(KnownMaterials::with_icsd_ids);
    reporter.report(Progress::PhaseFinish);

    info!(
        "Screening {} candidate(s) against {} ratio(s) (order-sensitive: {}).",
        candidates.len(),
        index.len(),
        index.is_order_sensitive()
    );
    let result = screen_candidates(&candidates, &index, icsd.as_ref(), reporter);

    info!(
        "Screening complete: {} matched, {} skipped.",
        result.matched().count(),
        result.skipped.len()
    );
    Ok(result)
}

/// Classifies every parsed row; malformed rows are recorded as skipped.
pub fn screen_candidates(
    table: &CandidateTable,
    index: &StoichiometryIndex,
    icsd: Option<&KnownMaterials>,
    reporter: &ProgressReporter,
) -> ScreenResult {
    reporter.report(Progress::PhaseStart { name: "Screening" });
    reporter.report(Progress::TaskStart {
        total_steps: table.len() as u64,
    });

    let mut candidates = Vec::with_capacity(table.len());
    let mut skipped = Vec::new();
    for row in table.rows() {
        match &row.parsed {
            Ok(candidate) => {
                candidates.push(ScreenedCandidate {
                    row: row.row,
                    candidate: candidate.clone(),
                    classification: index.classify(candidate),
                    icsd_ids: Vec::new(),
                });
            }
            Err(e) => {
                warn!("Skipping candidate row {} ('{}'): {}", row.row, row.text, e);
                reporter.report(Progress::RowSkipped {
                    row: row.row,
                    reason: e.to_string(),
                });
                skipped.push(SkippedRow::new(row.row, row.text.as_str(), e));
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let synthesis = icsd.map(|icsd| {
        let (matches, summary) = match_known(
            candidates
                .iter()
                .filter(|c| c.classification.is_known())
                .map(|c| &c.candidate.composition),
            icsd,
        );
        let matched = candidates.iter_mut().filter(|c| c.classification.is_known());
        for (candidate, ids) in matched.zip(matches) {
            candidate.icsd_ids = ids;
        }
        summary
    });
    reporter.report(Progress::PhaseFinish);

    ScreenResult {
        candidates,
        skipped,
        ratio_count: index.len(),
        synthesis,
    }
}
