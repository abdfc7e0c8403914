use super::{DataLoadError, display_path};
use std::fs::File;
use std::path::Path;

/// Header of a CSV table with case- and separator-insensitive column lookup.
///
/// `"Ionic Radius"`, `"ionic_radius"` and `"IonicRadius"` all resolve to the same column.
pub(crate) struct Header {
    original: Vec<String>,
    normalized: Vec<String>,
}

pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Header {
    pub fn read(reader: &mut csv::Reader<File>, path: &Path) -> Result<Self, DataLoadError> {
        let headers = reader.headers().map_err(|e| DataLoadError::Csv {
            path: display_path(path),
            source: e,
        })?;
        let original: Vec<String> = headers.iter().map(str::to_string).collect();
        let normalized = original.iter().map(|h| normalize(h)).collect();
        Ok(Self {
            original,
            normalized,
        })
    }

    pub fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            let wanted = normalize(alias);
            self.normalized.iter().position(|h| *h == wanted)
        })
    }

    pub fn require(
        &self,
        column: &'static str,
        aliases: &[&str],
        path: &Path,
    ) -> Result<usize, DataLoadError> {
        self.find(aliases).ok_or_else(|| DataLoadError::MissingColumn {
            path: display_path(path),
            column,
        })
    }

    pub fn name(&self, index: usize) -> &str {
        self.original.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn find_matches_aliases_ignoring_case_and_separators() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "Ion,oxidation_state,Ionic Radius\nPb,2,1.29\n").unwrap();

        let mut reader = crate::core::io::open_csv(&path).unwrap();
        let header = Header::read(&mut reader, &path).unwrap();

        assert_eq!(header.find(&["ion", "element"]), Some(0));
        assert_eq!(header.find(&["charge", "Oxidation State"]), Some(1));
        assert_eq!(header.find(&["ionic_radius"]), Some(2));
        assert_eq!(header.find(&["coordination"]), None);
        assert_eq!(header.name(2), "Ionic Radius");
        assert_eq!(header.len(), 3);
    }

    #[test]
    fn require_reports_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let mut reader = crate::core::io::open_csv(&path).unwrap();
        let header = Header::read(&mut reader, &path).unwrap();
        let result = header.require("Ionic Radius", &["ionic radius", "radius"], &path);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingColumn { column: "Ionic Radius", .. })
        ));
    }
}
