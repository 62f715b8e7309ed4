//! Error type for the command-line pipeline.

use transito::data::DataError;
use transito::model::ModelError;
use transito::output::{ExportError, ReportError};
use transito::panel::PanelError;

/// Errors that can stop a command.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Download, parsing or cache error.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Panel construction error.
    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    /// Model fitting error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Report rendering error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Background task failed.
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid configuration or command-line value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A model variable whose dataset is not configured.
    #[error("Variable '{variable}' needs the {source_name} dataset, which is not configured")]
    MissingSource {
        /// Variable name
        variable: String,
        /// Dataset name
        source_name: String,
    },

    /// No usable accident data.
    #[error("No PRF accident data for the requested years")]
    NoAccidentData,
}
