use super::columns::Header;
use super::{DataLoadError, display_path, open_csv};
use crate::core::chemistry::{Composition, ParseError, Stoichiometry};
use std::path::Path;
use tracing::{debug, info};

const FORMULA_COLUMNS: &[&str] = &["composition", "formula", "pretty_formula", "Novel Material"];
const PATTERN_COLUMNS: &[&str] = &["Atoms", "stoichiometry"];

/// A candidate material to be screened.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub composition: Composition,
    pub stoichiometry: Stoichiometry,
}

impl Candidate {
    pub fn new(composition: Composition) -> Self {
        Self {
            stoichiometry: composition.stoichiometry(),
            composition,
        }
    }

    pub fn parse(formula: &str) -> Result<Self, ParseError> {
        Composition::parse(formula).map(Self::new)
    }

    /// Overrides the ratio derived from the formula with an explicit pattern.
    pub fn with_stoichiometry(mut self, stoichiometry: Stoichiometry) -> Self {
        self.stoichiometry = stoichiometry;
        self
    }
}

/// One data row of a candidate table. Rows that fail to parse are kept so the
/// caller can report and skip them.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub row: usize,
    pub text: String,
    pub parsed: Result<Candidate, ParseError>,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateTable {
    rows: Vec<CandidateRow>,
}

impl CandidateTable {
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        info!("Loading candidate table from {:?}", path);
        let mut reader = open_csv(path)?;
        let header = Header::read(&mut reader, path)?;
        let formula_col = header.require("composition", FORMULA_COLUMNS, path)?;
        let pattern_col = header.find(PATTERN_COLUMNS);

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| DataLoadError::Csv {
                path: display_path(path),
                source: e,
            })?;
            let text = record.get(formula_col).unwrap_or("").trim().to_string();
            let pattern = pattern_col
                .and_then(|c| record.get(c))
                .map(str::trim)
                .filter(|s| !s.is_empty());

            let parsed = Candidate::parse(&text).and_then(|candidate| match pattern {
                Some(p) => Ok(candidate.with_stoichiometry(Stoichiometry::parse(p)?)),
                None => Ok(candidate),
            });
            rows.push(CandidateRow {
                row: i + 1,
                text,
                parsed,
            });
        }

        debug!("Read {} candidate rows from {:?}", rows.len(), path);
        Ok(Self { rows })
    }

    pub fn from_formulas<'a>(formulas: impl IntoIterator<Item = &'a str>) -> Self {
        let rows = formulas
            .into_iter()
            .enumerate()
            .map(|(i, text)| CandidateRow {
                row: i + 1,
                text: text.to_string(),
                parsed: Candidate::parse(text),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[CandidateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
