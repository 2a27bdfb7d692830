//! Error types for the Propensity library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Propensity operations.
///
/// Only [`PropensityError::InputShape`] can abort an analysis once the
/// configuration has been accepted. Short rows, thin predictors and
/// zero-variance columns are reported as data in the
/// [`AnalysisReport`](crate::AnalysisReport) instead.
#[derive(Debug, Error)]
pub enum PropensityError {
    /// The table is empty or lacks the configured header rows.
    #[error("Input shape error: {0}")]
    InputShape(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The semantic categorizer failed or returned an unusable answer.
    #[error("Categorizer error: {0}")]
    Categorizer(String),

    /// Error persisting or loading an artifact.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Propensity operations.
pub type Result<T> = std::result::Result<T, PropensityError>;
