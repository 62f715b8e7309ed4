//! Error types for panel construction.

use thiserror::Error;
use transito_geo::GeoError;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that can occur while building panels and datasets.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Geography error
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// Column is not a known panel variable
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Unknown resolution name
    #[error("Unknown resolution: {0} (expected monthly, quarterly or annual)")]
    UnknownResolution(String),

    /// Required column missing from a frame
    #[error("Missing column '{column}' in {frame}")]
    MissingColumn {
        /// Frame being processed
        frame: String,
        /// Column that was expected
        column: String,
    },

    /// Two sources provide the same variable
    #[error("Variable '{0}' is provided by more than one source")]
    DuplicateVariable(String),

    /// Null in a key column
    #[error("Null value in key column '{0}'")]
    NullKey(String),

    /// Period index outside the resolution's range
    #[error("Invalid {resolution} period index {index}")]
    InvalidPeriod {
        /// Resolution name
        resolution: String,
        /// Offending index
        index: i32,
    },

    /// No source frames were given
    #[error("No source frames to join")]
    NoSources,

    /// Train fraction outside (0, 1)
    #[error("Train fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),

    /// Not enough complete rows
    #[error("Partition {partition} has {rows} complete rows, {required} required")]
    InsufficientRows {
        /// Partition label
        partition: String,
        /// Rows available
        rows: usize,
        /// Rows required
        required: usize,
    },

    /// Dataset specification is inconsistent
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

impl PanelError {
    pub(crate) fn missing_column(frame: &str, column: &str) -> Self {
        Self::MissingColumn {
            frame: frame.to_string(),
            column: column.to_string(),
        }
    }
}
