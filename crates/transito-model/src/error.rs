//! Error types for model fitting.

use thiserror::Error;
use transito_panel::PanelError;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while fitting and evaluating models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Empty input
    #[error("Empty input: {field} cannot be empty")]
    EmptyInput {
        /// Offending argument
        field: &'static str,
    },

    /// Lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Not more rows than parameters
    #[error("Insufficient data: {rows} rows, {params} parameters (need rows > parameters)")]
    InsufficientData {
        /// Observations
        rows: usize,
        /// Estimated parameters, intercept included
        params: usize,
    },

    /// NaN or infinite input
    #[error("Non-finite value in {field}")]
    NonFinite {
        /// Offending argument
        field: &'static str,
    },

    /// Design matrix is rank deficient
    #[error("Matrix is singular or near-singular")]
    SingularMatrix,

    /// Confidence level outside (0, 1)
    #[error("Confidence level must be in (0, 1), got {0}")]
    InvalidConfidence(f64),

    /// Invalid model specification
    #[error("Invalid model specification: {0}")]
    InvalidSpec(String),

    /// Distribution construction failed
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// Panel or dataset error
    #[error(transparent)]
    Panel(#[from] PanelError),
}

impl ModelError {
    /// Whether the error is caused by the data of a single partition
    /// rather than by the run's configuration.
    pub const fn is_data_shortage(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. }
                | Self::InsufficientData { .. }
                | Self::SingularMatrix
                | Self::NonFinite { .. }
                | Self::Panel(PanelError::InsufficientRows { .. } | PanelError::InvalidDataset(_))
        )
    }
}
