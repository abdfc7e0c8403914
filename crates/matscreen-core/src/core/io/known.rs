use super::columns::Header;
use super::{DataLoadError, display_path, open_csv};
use crate::core::chemistry::{Composition, Element, ParseError, Stoichiometry};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const FORMULA_COLUMNS: &[&str] = &["pretty_formula", "formula", "composition"];
const PATTERN_COLUMNS: &[&str] = &["Atoms", "stoichiometry"];
const ICSD_COLUMNS: &[&str] = &["icsd_ids", "icsd_id", "icsd"];

/// An entry of the known-materials database.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownMaterial {
    pub formula: Option<Composition>,
    pub stoichiometry: Stoichiometry,
    pub icsd_ids: Vec<u64>,
}

impl KnownMaterial {
    pub fn from_formula(formula: Composition, icsd_ids: Vec<u64>) -> Self {
        Self {
            stoichiometry: formula.stoichiometry(),
            formula: Some(formula),
            icsd_ids,
        }
    }

    pub fn from_stoichiometry(stoichiometry: Stoichiometry, icsd_ids: Vec<u64>) -> Self {
        Self {
            formula: None,
            stoichiometry,
            icsd_ids,
        }
    }
}

/// The known-materials table (typically exported from the ICSD / Materials Project).
#[derive(Debug, Clone, Default)]
pub struct KnownMaterials {
    entries: Vec<KnownMaterial>,
    by_formula: HashMap<Vec<(Element, u32)>, Vec<usize>>,
}

impl KnownMaterials {
    pub fn from_entries(entries: Vec<KnownMaterial>) -> Self {
        let mut by_formula: HashMap<_, Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(formula) = &entry.formula {
                by_formula.entry(formula.formula_key()).or_default().push(i);
            }
        }
        Self {
            entries,
            by_formula,
        }
    }

    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        info!("Loading known-materials table from {:?}", path);
        let mut reader = open_csv(path)?;
        let header = Header::read(&mut reader, path)?;

        let formula_col = header.find(FORMULA_COLUMNS);
        let pattern_col = header.find(PATTERN_COLUMNS);
        if formula_col.is_none() && pattern_col.is_none() {
            return Err(DataLoadError::MissingColumn {
                path: display_path(path),
                column: "pretty_formula",
            });
        }
        let icsd_col = header.find(ICSD_COLUMNS);

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for (i, result) in reader.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| DataLoadError::Csv {
                path: display_path(path),
                source: e,
            })?;
            let field = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };

            match parse_entry(field(formula_col), field(pattern_col), field(icsd_col)) {
                Ok(entry) => entries.push(entry),
                Err((column, e)) => {
                    let column = match column {
                        EntryColumn::Formula => formula_col.or(pattern_col),
                        EntryColumn::Pattern => pattern_col,
                        EntryColumn::Icsd => icsd_col,
                    }
                    .map(|c| header.name(c))
                    .unwrap_or_default();
                    warn!(
                        "Skipping known-materials row {} (column '{}') in {:?}: {}",
                        row, column, path, e
                    );
                    skipped += 1;
                }
            }
        }

        debug!(
            "Loaded {} known materials from {:?} ({} malformed row(s) skipped)",
            entries.len(),
            path,
            skipped
        );
        Ok(Self::from_entries(entries))
    }

    /// The ICSD-confirmed subset: entries that carry at least one ICSD identifier.
    pub fn with_icsd_ids(&self) -> KnownMaterials {
        Self::from_entries(
            self.entries
                .iter()
                .filter(|e| !e.icsd_ids.is_empty())
                .cloned()
                .collect(),
        )
    }

    pub fn entries(&self) -> &[KnownMaterial] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose reduced formula equals that of `formula`, regardless of element order.
    pub fn find_by_formula(&self, formula: &Composition) -> impl Iterator<Item = &KnownMaterial> + '_ {
        self.by_formula
            .get(&formula.formula_key())
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryColumn {
    Formula,
    Pattern,
    Icsd,
}

fn parse_entry(
    formula: Option<&str>,
    pattern: Option<&str>,
    icsd_ids: Option<&str>,
) -> Result<KnownMaterial, (EntryColumn, ParseError)> {
    let formula = formula
        .map(Composition::parse)
        .transpose()
        .map_err(|e| (EntryColumn::Formula, e))?;
    let pattern = pattern
        .map(Stoichiometry::parse)
        .transpose()
        .map_err(|e| (EntryColumn::Pattern, e))?;
    let icsd_ids = icsd_ids
        .map(parse_icsd_ids)
        .transpose()
        .map_err(|e| (EntryColumn::Icsd, e))?
        .unwrap_or_default();

    match (formula, pattern) {
        (Some(formula), Some(pattern)) => Ok(KnownMaterial {
            formula: Some(formula),
            stoichiometry: pattern,
            icsd_ids,
        }),
        (Some(formula), None) => Ok(KnownMaterial::from_formula(formula, icsd_ids)),
        (None, Some(pattern)) => Ok(KnownMaterial::from_stoichiometry(pattern, icsd_ids)),
        (None, None) => Err((EntryColumn::Formula, ParseError::EmptyFormula)),
    }
}

fn parse_icsd_ids(input: &str) -> Result<Vec<u64>, ParseError> {
    input
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|token| token.trim_matches(['\'', '"']))
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidNumber(token.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_table(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("icsd.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_parses_formulas_and_id_lists() {
        let (_dir, path) = write_table(
            "pretty_formula,icsd_ids\nCsPbI3,\"[161481, 181288]\"\nCsSnI3,'69995'\nPbI2,\n",
        );
        let known = KnownMaterials::load(&path).unwrap();

        assert_eq!(known.len(), 3);
        assert_eq!(known.entries()[0].icsd_ids, vec![161481, 181288]);
        assert_eq!(known.entries()[1].icsd_ids, vec![69995]);
        assert!(known.entries()[2].icsd_ids.is_empty());
        assert_eq!(
            known.entries()[0].stoichiometry,
            Stoichiometry::new(vec![1, 1, 3])
        );
    }

    #[test]
    fn load_accepts_pattern_only_tables() {
        let (_dir, path) = write_table("Atoms\n\"[1, 1, 3]\"\n\"[3, 1, 6]\"\n");
        let known = KnownMaterials::load(&path).unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.entries()[0].formula.is_none());
    }

    #[test]
    fn load_fails_without_formula_or_pattern_column() {
        let (_dir, path) = write_table("material_id,icsd_ids\nmp-1,[1]\n");
        assert!(matches!(
            KnownMaterials::load(&path),
            Err(DataLoadError::MissingColumn { .. })
        ));
    }

    #[test]
    fn load_skips_malformed_rows_and_keeps_the_rest() {
        let (_dir, path) = write_table(
            "pretty_formula,icsd_ids\nSrTiO3,[1]\nXx9Q,[2]\nCaTiO3,[abc]\n,[4]\nBaTiO3,[5]\n",
        );
        let known = KnownMaterials::load(&path).unwrap();

        assert_eq!(known.len(), 2);
        let formulas: Vec<_> = known
            .entries()
            .iter()
            .map(|e| e.formula.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(formulas, vec!["SrTiO3", "BaTiO3"]);
        assert_eq!(known.entries()[1].icsd_ids, vec![5]);
    }

    #[test]
    fn with_icsd_ids_keeps_confirmed_entries_only() {
        let (_dir, path) = write_table("pretty_formula,icsd_ids\nCsPbI3,[1]\nCsGeI3,[]\n");
        let known = KnownMaterials::load(&path).unwrap().with_icsd_ids();
        assert_eq!(known.len(), 1);
        let formula = Composition::parse("CsGeI3").unwrap();
        assert_eq!(known.find_by_formula(&formula).count(), 0);
    }

    #[test]
    fn find_by_formula_ignores_element_order() {
        let known = KnownMaterials::from_entries(vec![
            KnownMaterial::from_formula(Composition::parse("CsPbI3").unwrap(), vec![1]),
            KnownMaterial::from_formula(Composition::parse("CsPbBr3").unwrap(), vec![2]),
        ]);
        let query = Composition::parse("PbCsI3").unwrap();
        let ids: Vec<_> = known
            .find_by_formula(&query)
            .flat_map(|m| m.icsd_ids.iter().copied())
            .collect();
        assert_eq!(ids, vec![1]);
    }
}
