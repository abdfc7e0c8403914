use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid data name format for '{0}'. Expected 'name' or 'name@version' (e.g., 'shannon@2024').")]
    InvalidFormat(String),

    #[error("Unknown logical name kind: '{0}'. Expected 'reference-table' or 'known-materials'.")]
    UnknownKind(String),

    #[error("Component '{component}' cannot be empty in logical name '{name}'.")]
    EmptyComponent {
        component: &'static str,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    ReferenceTable,
    KnownMaterials,
}

impl DataKind {
    pub fn from_kind(kind: &str) -> Result<Self, ParseError> {
        match kind {
            "reference-table" => Ok(Self::ReferenceTable),
            "known-materials" => Ok(Self::KnownMaterials),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }

    /// Subdirectory of the data directory holding tables of this kind.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::ReferenceTable => "reference",
            Self::KnownMaterials => "known",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogicalName {
    pub kind: DataKind,
    pub name: String,
    pub version: Option<String>,
}

impl ParsedLogicalName {
    /// Path of the table relative to the data directory, e.g. `reference/shannon-2024.csv`.
    pub fn relative_path(&self) -> PathBuf {
        let file_name = match &self.version {
            Some(version) => format!("{}-{}.csv", self.name, version),
            None => format!("{}.csv", self.name),
        };
        PathBuf::from(self.kind.directory()).join(file_name)
    }
}

fn is_valid_component(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub fn parse_logical_name(name: &str, kind: &str) -> Result<ParsedLogicalName, ParseError> {
    let kind = DataKind::from_kind(kind)?;
    let mut parts = name.trim().splitn(2, '@');
    let base = parts.next().unwrap_or_default();
    let version = parts.next();

    if base.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "name",
            name: name.to_string(),
        });
    }
    if version.is_some_and(str::is_empty) {
        return Err(ParseError::EmptyComponent {
            component: "version",
            name: name.to_string(),
        });
    }
    if !is_valid_component(base) || version.is_some_and(|v| !is_valid_component(v)) {
        return Err(ParseError::InvalidFormat(name.to_string()));
    }

    Ok(ParsedLogicalName {
        kind,
        name: base.to_string(),
        version: version.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_versioned_names() {
        let plain = parse_logical_name("shannon", "reference-table").unwrap();
        assert_eq!(plain.kind, DataKind::ReferenceTable);
        assert_eq!(plain.version, None);
        assert_eq!(plain.relative_path(), PathBuf::from("reference/shannon.csv"));

        let versioned = parse_logical_name("icsd@2024", "known-materials").unwrap();
        assert_eq!(versioned.name, "icsd");
        assert_eq!(versioned.version.as_deref(), Some("2024"));
        assert_eq!(versioned.relative_path(), PathBuf::from("known/icsd-2024.csv"));
    }

    #[test]
    fn rejects_empty_components() {
        assert!(matches!(
            parse_logical_name("@2024", "reference-table"),
            Err(ParseError::EmptyComponent {
                component: "name",
                ..
            })
        ));
        assert!(matches!(
            parse_logical_name("shannon@", "reference-table"),
            Err(ParseError::EmptyComponent {
                component: "version",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_kind_and_bad_characters() {
        assert_eq!(
            parse_logical_name("shannon", "forcefield"),
            Err(ParseError::UnknownKind("forcefield".to_string()))
        );
        assert_eq!(
            parse_logical_name("shan non", "reference-table"),
            Err(ParseError::InvalidFormat("shan non".to_string()))
        );
        assert_eq!(
            parse_logical_name("a@b@c", "known-materials"),
            Err(ParseError::InvalidFormat("a@b@c".to_string()))
        );
    }
}
