//! Export functionality for Transito model results.
//!
//! This module provides CSV and JSON export of prediction, metric and
//! coefficient records.

use crate::records::{CoefficientRecord, MetricsRecord, PredictionRecord};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_string<T: Serialize>(
    records: &[T],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for record in records {
                wtr.serialize(record)?;
            }
            let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
            String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
        }
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

impl Exporter for Vec<PredictionRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<MetricsRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<CoefficientRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}
