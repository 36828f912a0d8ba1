//! Error handling for the rebasing pipeline.
//!
//! Only configuration and I/O failures are represented here. Row-level date
//! problems never surface as errors; they are resolved by disqualifying the
//! owning patient.

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;

/// Errors that abort a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Error opening, reading or writing a file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error decoding or encoding CSV data through Arrow
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing JSON side files and fixtures
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The dataset root does not exist or is not a directory
    #[error("Dataset root is not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    /// A required source or intermediate file is absent
    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A column the pipeline depends on is absent from a table
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    /// A value that must be well-formed (identifiers, anchor years) is not
    #[error("Invalid value '{value}' in column '{column}' of table '{table}'")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },

    /// Inconsistent or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension for attaching a path to raw I/O results
pub trait IoResultExt<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| PipelineError::io(path, e))
    }
}
