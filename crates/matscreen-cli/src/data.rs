use crate::error::{CliError, Result};
use crate::utils::parser::{DataKind, ParsedLogicalName};
use directories::ProjectDirs;
use matscreen::core::io::known::KnownMaterials;
use matscreen::core::io::reference::ReferenceTable;
use std::fs::{self};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Logical names checked by `data check`.
pub const DEFAULT_TABLES: &[(&str, DataKind)] = &[
    ("shannon", DataKind::ReferenceTable),
    ("icsd", DataKind::KnownMaterials),
];

#[derive(Debug, Clone, PartialEq)]
pub enum TableStatus {
    Missing,
    Loaded { rows: usize },
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub name: String,
    pub path: PathBuf,
    pub status: TableStatus,
}

#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        if !path.is_absolute() {
            return Err(CliError::Argument(format!(
                "Data path must be absolute: {}",
                path.display()
            )));
        }
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path.to_string_lossy().as_bytes()).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    pub fn resolve_logical_name(&self, parsed_name: &ParsedLogicalName) -> PathBuf {
        self.base_path.join(parsed_name.relative_path())
    }

    /// Loads every default table that is present and reports what was found.
    pub fn check(&self) -> Vec<TableReport> {
        DEFAULT_TABLES
            .iter()
            .map(|&(name, kind)| {
                let parsed = ParsedLogicalName {
                    kind,
                    name: name.to_string(),
                    version: None,
                };
                let path = self.resolve_logical_name(&parsed);
                let status = if !path.exists() {
                    TableStatus::Missing
                } else {
                    let loaded = match kind {
                        DataKind::ReferenceTable => ReferenceTable::load(&path).map(|t| t.len()),
                        DataKind::KnownMaterials => KnownMaterials::load(&path).map(|t| t.len()),
                    };
                    match loaded {
                        Ok(rows) => TableStatus::Loaded { rows },
                        Err(e) => TableStatus::Invalid {
                            message: e.to_string(),
                        },
                    }
                };
                info!("Data table '{}' at {:?}: {:?}", name, path, status);
                TableReport {
                    name: name.to_string(),
                    path,
                    status,
                }
            })
            .collect()
    }

    fn determine_data_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "matscreen", "matscreen")
    }

    fn get_path_config_file() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.config_dir().join("path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}
