//! Error types for the PetClinic load harness

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while generating load or analysing its results
#[derive(Error, Debug)]
pub enum HarnessError {
    // === Analysis Input ===
    /// No result files in the results directory
    #[error("No result CSV files found in {}", dir.display())]
    NoInputFiles { dir: PathBuf },

    /// A result file has no `Aggregated` row
    #[error("Result file {} has no \"Aggregated\" row", file.display())]
    MissingAggregatedRow { file: PathBuf },

    /// A result file could not be parsed
    #[error("Malformed CSV {}: {source}", file.display())]
    Csv {
        file: PathBuf,
        #[source]
        source: csv::Error,
    },

    // === Filesystem ===
    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Load Generation ===
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    // === Rendering ===
    /// Chart rendering failed
    #[error("Failed to render chart {name}: {reason}")]
    Chart { name: String, reason: String },

    // === General ===
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HarnessError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a CSV error with the file it happened on
    pub fn csv(file: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            file: file.into(),
            source,
        }
    }

    /// Whether the pipeline should report and return rather than fail the process
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoInputFiles { .. })
    }
}
