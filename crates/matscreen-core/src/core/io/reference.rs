use super::columns::{Header, normalize};
use super::{DataLoadError, display_path, open_csv};
use crate::core::chemistry::{Coordination, Element, ParseError, parse_charge};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

const ELEMENT_COLUMNS: &[&str] = &["Ion", "Element", "Symbol"];
const CHARGE_COLUMNS: &[&str] = &["Charge", "Oxidation State", "Oxidation"];
const COORDINATION_COLUMNS: &[&str] = &["Coordination", "Coordination Number", "CN"];
const RADIUS_COLUMNS: &[&str] = &["Ionic Radius", "Radius", "IR"];

/// Name under which the ionic radius is exposed through [`IonRecord::property`].
pub const IONIC_RADIUS: &str = "Ionic Radius";

/// Identity of an ion in the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IonKey {
    pub element: Element,
    pub charge: i8,
    pub coordination: Coordination,
}

impl IonKey {
    pub fn new(element: Element, charge: i8, coordination: Coordination) -> Self {
        Self {
            element,
            charge,
            coordination,
        }
    }
}

impl fmt::Display for IonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({:+}) [{}]",
            self.element, self.charge, self.coordination
        )
    }
}

/// One row of the ionic-radius reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct IonRecord {
    pub element: Element,
    pub charge: i8,
    pub coordination: Coordination,
    pub ionic_radius: f64,
    properties: BTreeMap<String, f64>,
}

impl IonRecord {
    pub fn new(element: Element, charge: i8, coordination: Coordination, ionic_radius: f64) -> Self {
        Self {
            element,
            charge,
            coordination,
            ionic_radius,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: f64) -> Self {
        self.properties.insert(normalize(name), value);
        self
    }

    pub fn key(&self) -> IonKey {
        IonKey::new(self.element, self.charge, self.coordination)
    }

    /// Looks up a numeric property by column name (case and separator insensitive).
    ///
    /// `"Ionic Radius"` always resolves to [`IonRecord::ionic_radius`].
    pub fn property(&self, name: &str) -> Option<f64> {
        let key = normalize(name);
        if key == normalize(IONIC_RADIUS) {
            return Some(self.ionic_radius);
        }
        self.properties.get(&key).copied()
    }
}

/// The in-memory ionic-radius table, keyed by (element, charge, coordination).
///
/// Records keep file order. Duplicate keys (e.g. high- and low-spin entries) are
/// retained; keyed lookups return the first one.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<IonRecord>,
    index: HashMap<IonKey, usize>,
}

impl ReferenceTable {
    pub fn from_records(records: Vec<IonRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.key()).or_insert(i);
        }
        Self { records, index }
    }

    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        info!("Loading ionic-radius reference table from {:?}", path);
        let mut reader = open_csv(path)?;
        let header = Header::read(&mut reader, path)?;

        let element_col = header.require("Ion", ELEMENT_COLUMNS, path)?;
        let charge_col = header.require("Charge", CHARGE_COLUMNS, path)?;
        let coordination_col = header.require("Coordination", COORDINATION_COLUMNS, path)?;
        let radius_col = header.require("Ionic Radius", RADIUS_COLUMNS, path)?;
        let required = [element_col, charge_col, coordination_col, radius_col];
        let extra_cols: Vec<usize> = (0..header.len())
            .filter(|i| !required.contains(i) && !header.name(*i).is_empty())
            .collect();

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| DataLoadError::Csv {
                path: display_path(path),
                source: e,
            })?;
            let field = |col: usize| record.get(col).unwrap_or("");
            let invalid = |col: usize, source: ParseError| DataLoadError::InvalidValue {
                path: display_path(path),
                row,
                column: header.name(col).to_string(),
                source,
            };

            let element = Element::new(field(element_col)).map_err(|e| invalid(element_col, e))?;
            let charge = parse_charge(field(charge_col)).map_err(|e| invalid(charge_col, e))?;
            let coordination =
                Coordination::parse(field(coordination_col)).map_err(|e| invalid(coordination_col, e))?;
            let ionic_radius = parse_number(field(radius_col)).map_err(|e| invalid(radius_col, e))?;

            let mut ion = IonRecord::new(element, charge, coordination, ionic_radius);
            for &col in &extra_cols {
                if let Ok(value) = parse_number(field(col)) {
                    ion = ion.with_property(header.name(col), value);
                }
            }
            records.push(ion);
        }

        if records.is_empty() {
            return Err(DataLoadError::Empty {
                path: display_path(path),
            });
        }

        debug!("Loaded {} ion records from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    pub fn records(&self) -> &[IonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &IonKey) -> Option<&IonRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// Ionic radius of `element` at `charge` and `coordination`, if tabulated.
    pub fn radius(&self, element: Element, charge: i8, coordination: Coordination) -> Option<f64> {
        self.get(&IonKey::new(element, charge, coordination))
            .map(|r| r.ionic_radius)
    }

    /// All records carrying the given formal charge, in table order.
    pub fn with_charge(&self, charge: i8) -> impl Iterator<Item = &IonRecord> + '_ {
        self.records.iter().filter(move |r| r.charge == charge)
    }
}

fn parse_number(input: &str) -> Result<f64, ParseError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SHANNON_SAMPLE: &str = "\
Ion,Charge,Coordination,Spin State,Crystal Radius,Ionic Radius
Pb,2,VIII,,1.43,1.29
Sn,2,VIII,,1.36,1.22
Sr,2,VIII,,1.40,1.26
Fe,2,VI,HS,0.92,0.78
Fe,2,VI,LS,0.75,0.61
Cu,2,IVSQ,,0.71,0.57
";

    fn el(s: &str) -> Element {
        Element::new(s).unwrap()
    }

    fn write_table(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shannon.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_succeeds_with_valid_csv() {
        let (_dir, path) = write_table(SHANNON_SAMPLE);
        let table = ReferenceTable::load(&path).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(
            table.radius(el("Pb"), 2, Coordination::new(8)),
            Some(1.29)
        );
        assert_eq!(table.radius(el("Pb"), 2, Coordination::new(6)), None);
        assert_eq!(
            table.radius(el("Cu"), 2, Coordination::parse("IVSQ").unwrap()),
            Some(0.57)
        );
    }

    #[test]
    fn load_keeps_extra_numeric_columns_as_properties() {
        let (_dir, path) = write_table(SHANNON_SAMPLE);
        let table = ReferenceTable::load(&path).unwrap();
        let pb = table
            .get(&IonKey::new(el("Pb"), 2, Coordination::new(8)))
            .unwrap();

        assert_eq!(pb.property("Crystal Radius"), Some(1.43));
        assert_eq!(pb.property("crystal_radius"), Some(1.43));
        assert_eq!(pb.property("Ionic Radius"), Some(1.29));
        assert_eq!(pb.property("Spin State"), None);
    }

    #[test]
    fn duplicate_keys_resolve_to_first_record_in_file_order() {
        let (_dir, path) = write_table(SHANNON_SAMPLE);
        let table = ReferenceTable::load(&path).unwrap();
        assert_eq!(table.radius(el("Fe"), 2, Coordination::new(6)), Some(0.78));
    }

    #[test]
    fn load_accepts_column_aliases() {
        let (_dir, path) = write_table("element,charge,coordination_number,radius\nPb,+2,8,1.29\n");
        let table = ReferenceTable::load(&path).unwrap();
        assert_eq!(
            table.radius(el("Pb"), 2, Coordination::new(8)),
            Some(1.29)
        );
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = ReferenceTable::load(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(DataLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_missing_radius_column() {
        let (_dir, path) = write_table("Ion,Charge,Coordination\nPb,2,VIII\n");
        let result = ReferenceTable::load(&path);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingColumn {
                column: "Ionic Radius",
                ..
            })
        ));
    }

    #[test]
    fn load_reports_row_of_malformed_value() {
        let (_dir, path) = write_table(
            "Ion,Charge,Coordination,Ionic Radius\nPb,2,VIII,1.29\nSn,2,VIII,n/a\n",
        );
        let result = ReferenceTable::load(&path);
        match result {
            Err(DataLoadError::InvalidValue { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Ionic Radius");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn load_fails_for_ragged_rows() {
        let (_dir, path) = write_table("Ion,Charge,Coordination,Ionic Radius\nPb,2,VIII\n");
        assert!(matches!(
            ReferenceTable::load(&path),
            Err(DataLoadError::Csv { .. })
        ));
    }

    #[test]
    fn load_fails_for_header_only_file() {
        let (_dir, path) = write_table("Ion,Charge,Coordination,Ionic Radius\n");
        assert!(matches!(
            ReferenceTable::load(&path),
            Err(DataLoadError::Empty { .. })
        ));
    }

    #[test]
    fn with_charge_preserves_table_order() {
        let (_dir, path) = write_table(SHANNON_SAMPLE);
        let table = ReferenceTable::load(&path).unwrap();
        let symbols: Vec<_> = table
            .with_charge(2)
            .map(|r| r.element.symbol())
            .collect();
        assert_eq!(symbols, ["Pb", "Sn", "Sr", "Fe", "Fe", "Cu"]);
        assert_eq!(table.with_charge(3).count(), 0);
    }
}
