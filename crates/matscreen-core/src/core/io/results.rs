use super::display_path;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML serialization error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::ser::Error,
    },
    #[error("Plotting error for '{path}': {message}")]
    Plot { path: String, message: String },
}

/// Writes result tables into a results directory using the naming scheme
/// `{table}_{timestamp}_{filter}.csv`.
///
/// The timestamp is fixed when the writer is created, so every file of one run
/// shares it.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    results_dir: PathBuf,
    timestamp: String,
}

impl ResultWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        Self::with_timestamp(results_dir, timestamp)
    }

    pub fn with_timestamp(results_dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            results_dir: results_dir.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn output_path(&self, table_name: &str, filter_name: &str, suffix: &str) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}_{}{}",
            table_name, self.timestamp, filter_name, suffix
        ))
    }

    pub fn write_table<T: Serialize>(
        &self,
        table_name: &str,
        filter_name: &str,
        rows: &[T],
    ) -> Result<PathBuf, OutputError> {
        self.ensure_dir()?;
        let path = self.output_path(table_name, filter_name, ".csv");
        let csv_err = |e: csv::Error| OutputError::Csv {
            path: display_path(&path),
            source: e,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|e| OutputError::Io {
            path: display_path(&path),
            source: e,
        })?;

        info!("Wrote {} row(s) to {:?}", rows.len(), path);
        Ok(path)
    }

    pub fn write_summary<S: Serialize>(
        &self,
        table_name: &str,
        filter_name: &str,
        summary: &S,
    ) -> Result<PathBuf, OutputError> {
        self.ensure_dir()?;
        let path = self.output_path(table_name, filter_name, "_summary.toml");
        let content = toml::to_string_pretty(summary).map_err(|e| OutputError::Toml {
            path: display_path(&path),
            source: e,
        })?;
        fs::write(&path, content).map_err(|e| OutputError::Io {
            path: display_path(&path),
            source: e,
        })?;
        info!("Wrote run summary to {:?}", path);
        Ok(path)
    }

    fn ensure_dir(&self) -> Result<(), OutputError> {
        fs::create_dir_all(&self.results_dir).map_err(|e| OutputError::Io {
            path: display_path(&self.results_dir),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Row {
        formula: String,
        icsd_ids: String,
        rate: Option<f64>,
    }

    #[derive(Serialize)]
    struct Summary {
        scanned: usize,
        synthesis_rate: f64,
    }

    #[test]
    fn write_table_creates_directory_and_named_file() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("Results");
        let writer = ResultWriter::with_timestamp(&results, "20240101120000");

        let rows = vec![
            Row {
                formula: "CsPbI3".into(),
                icsd_ids: "161481,181288".into(),
                rate: Some(50.0),
            },
            Row {
                formula: "CsGeI3".into(),
                icsd_ids: String::new(),
                rate: None,
            },
        ];
        let path = writer
            .write_table("novel_materials", "isovalent_generator", &rows)
            .unwrap();

        assert_eq!(
            path,
            results.join("novel_materials_20240101120000_isovalent_generator.csv")
        );
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("formula,icsd_ids,rate"));
        assert_eq!(lines.next(), Some("CsPbI3,\"161481,181288\",50.0"));
        assert_eq!(lines.next(), Some("CsGeI3,,"));
    }

    #[test]
    fn write_summary_produces_toml() {
        let dir = tempdir().unwrap();
        let writer = ResultWriter::with_timestamp(dir.path(), "ts");
        let path = writer
            .write_summary(
                "df",
                "stoichiometry_match",
                &Summary {
                    scanned: 4,
                    synthesis_rate: 25.0,
                },
            )
            .unwrap();

        assert!(path.ends_with("df_ts_stoichiometry_match_summary.toml"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("scanned = 4"));
        assert!(content.contains("synthesis_rate = 25.0"));
    }

    #[test]
    fn default_timestamp_has_fourteen_digits() {
        let writer = ResultWriter::new("Results");
        assert_eq!(writer.timestamp().len(), 14);
        assert!(writer.timestamp().chars().all(|c| c.is_ascii_digit()));
    }
}
