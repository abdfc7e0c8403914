use super::columns::Header;
use super::reference::IonKey;
use super::{DataLoadError, display_path, open_csv};
use crate::core::chemistry::{Composition, Coordination, Element, ParseError, parse_charge};
use std::fmt;
use std::path::Path;
use tracing::info;

const FORMULA_COLUMNS: &[&str] = &["formula", "composition", "seed"];
const SITE_COLUMNS: &[&str] = &["sites", "site"];

/// A substitutable site of a seed material: an element with its assigned
/// formal charge and coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    pub element: Element,
    pub charge: i8,
    pub coordination: Coordination,
}

impl Site {
    pub fn new(element: Element, charge: i8, coordination: Coordination) -> Self {
        Self {
            element,
            charge,
            coordination,
        }
    }

    /// Parses `Element:Charge:Coordination`, e.g. `Pb:+2:VIII` or `Pb:2:8`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = input.trim().split(':').map(str::trim).collect();
        let [element, charge, coordination] = parts.as_slice() else {
            return Err(ParseError::InvalidSite(input.to_string()));
        };
        Ok(Self {
            element: Element::new(element)?,
            charge: parse_charge(charge)?,
            coordination: Coordination::parse(coordination)?,
        })
    }

    pub fn key(&self) -> IonKey {
        IonKey::new(self.element, self.charge, self.coordination)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:+}:{}", self.element, self.charge, self.coordination)
    }
}

/// A seed for isovalent generation. Only annotated sites are substituted; the
/// remaining elements are held fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedMaterial {
    pub composition: Composition,
    pub sites: Vec<Site>,
}

impl SeedMaterial {
    pub fn new(composition: Composition, sites: Vec<Site>) -> Self {
        Self { composition, sites }
    }

    /// Parses a formula and a `;`-separated site list (`"Pb:+2:VIII;Cs:+1:XII"`).
    pub fn parse(formula: &str, sites: &str) -> Result<Self, ParseError> {
        let composition = Composition::parse(formula)?;
        let sites = sites
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Site::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { composition, sites })
    }
}

#[derive(Debug, Clone)]
pub struct SeedRow {
    pub row: usize,
    pub text: String,
    pub parsed: Result<SeedMaterial, ParseError>,
}

/// A table of seeds with `formula` and `sites` columns.
#[derive(Debug, Clone, Default)]
pub struct SeedTable {
    rows: Vec<SeedRow>,
}

impl SeedTable {
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        info!("Loading seed table from {:?}", path);
        let mut reader = open_csv(path)?;
        let header = Header::read(&mut reader, path)?;
        let formula_col = header.require("formula", FORMULA_COLUMNS, path)?;
        let sites_col = header.require("sites", SITE_COLUMNS, path)?;

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| DataLoadError::Csv {
                path: display_path(path),
                source: e,
            })?;
            let text = record.get(formula_col).unwrap_or("").trim().to_string();
            let sites = record.get(sites_col).unwrap_or("");
            rows.push(SeedRow {
                row: i + 1,
                parsed: SeedMaterial::parse(&text, sites),
                text,
            });
        }
        Ok(Self { rows })
    }

    pub fn from_seeds(seeds: Vec<SeedMaterial>) -> Self {
        let rows = seeds
            .into_iter()
            .enumerate()
            .map(|(i, seed)| SeedRow {
                row: i + 1,
                text: seed.composition.to_string(),
                parsed: Ok(seed),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[SeedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
