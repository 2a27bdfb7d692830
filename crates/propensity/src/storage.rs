//! Loading survey tables and saving analysis reports.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{PropensityError, Result};
use crate::input::{Parser, RawTable};
use crate::propensity::AnalysisReport;

/// Where tables come from and reports go.
pub trait TableStore {
    /// Load the raw table identified by `source_id`.
    fn load_table(&self, source_id: &str) -> Result<RawTable>;

    /// Persist a report under `analysis_id`.
    fn save_report(&self, analysis_id: &str, report: &AnalysisReport) -> Result<()>;
}

/// Stores tables and reports as files in one directory.
///
/// ```text
/// surveys/
/// ├── wave1.csv                 # load_table("wave1.csv")
/// └── wave1-2024.report.json    # save_report("wave1-2024", ...)
/// ```
pub struct DirectoryStore {
    root: PathBuf,
    parser: Parser,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parser: Parser::new(),
        }
    }

    /// Use a custom parser for loading tables.
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a report is written to.
    pub fn report_path(&self, analysis_id: &str) -> Result<PathBuf> {
        check_id(analysis_id)?;
        Ok(self.root.join(format!("{}.report.json", analysis_id)))
    }

    /// Load a previously saved report.
    pub fn load_report(&self, analysis_id: &str) -> Result<AnalysisReport> {
        let path = self.report_path(analysis_id)?;

        let file = File::open(&path).map_err(|e| PropensityError::Io {
            path: path.clone(),
            source: e,
        })?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            PropensityError::Storage(format!(
                "Failed to parse report '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

impl TableStore for DirectoryStore {
    fn load_table(&self, source_id: &str) -> Result<RawTable> {
        check_id(source_id)?;
        let (table, metadata) = self.parser.parse_file(self.root.join(source_id))?;

        tracing::debug!(source_id, hash = %metadata.hash, "Loaded table from store");

        Ok(table)
    }

    fn save_report(&self, analysis_id: &str, report: &AnalysisReport) -> Result<()> {
        let path = self.report_path(analysis_id)?;

        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| {
                PropensityError::Storage(format!(
                    "Failed to create directory '{}': {}",
                    self.root.display(),
                    e
                ))
            })?;
        }

        let file = File::create(&path).map_err(|e| {
            PropensityError::Storage(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report).map_err(|e| {
            PropensityError::Storage(format!("Failed to serialize report: {}", e))
        })?;

        tracing::debug!(analysis_id, path = %path.display(), "Saved report");
        Ok(())
    }
}

/// Ids name files directly under the root.
fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(PropensityError::Storage(format!("Invalid id '{}'", id)));
    }
    Ok(())
}
