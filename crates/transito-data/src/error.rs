//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} while fetching {url}")]
    Http {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// No download URL configured for a year
    #[error("No PRF archive URL or local archive available for {year}")]
    NoSource {
        /// Year that was requested
        year: i32,
    },

    /// ZIP archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Archive contains no CSV entry
    #[error("Archive {0} contains no CSV file")]
    MissingCsv(String),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row that cannot be interpreted
    #[error("Invalid record in {dataset} at line {line}: {reason}")]
    InvalidRecord {
        /// Dataset the row belongs to
        dataset: String,
        /// 1-based line number including the header
        line: u64,
        /// What is wrong with the row
        reason: String,
    },

    /// Required column absent from a header
    #[error("Missing column {column} in {dataset}")]
    MissingColumn {
        /// Dataset being read
        dataset: String,
        /// Column that was expected
        column: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),
}

impl DataError {
    /// Build an [`DataError::InvalidRecord`].
    pub fn invalid_record(dataset: &str, line: u64, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            dataset: dataset.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
