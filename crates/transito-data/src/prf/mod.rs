//! PRF (federal highway police) accident records.
//!
//! One ZIP archive per year, each holding a `datatran<YEAR>.csv` file.

pub mod archive;
pub mod client;
pub mod datatran;

pub use archive::extract_datatran_csv;
pub use client::{DatatranClient, DatatranSource};
pub use datatran::{AccidentRecord, DatatranParse, parse_datatran, summarize_monthly};

use crate::error::Result;
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Monthly accident summary loaded from one archive.
#[derive(Debug, Clone)]
pub struct YearSummary {
    /// Year of the archive
    pub year: i32,
    /// Summary frame, see [`summarize_monthly`]
    pub frame: DataFrame,
    /// Rows that could not be parsed
    pub skipped_rows: usize,
    /// Archive the summary was read from
    pub source: String,
}

/// Extract, parse and summarize an archive.
pub fn summarize_archive(year: i32, archive_path: &Path) -> Result<YearSummary> {
    let bytes = extract_datatran_csv(archive_path)?;
    let parsed = parse_datatran(&bytes)?;
    info!(
        year,
        records = parsed.records.len(),
        skipped = parsed.skipped_rows,
        "parsed datatran archive"
    );
    let frame = summarize_monthly(&parsed.records)?;

    Ok(YearSummary {
        year,
        frame,
        skipped_rows: parsed.skipped_rows,
        source: archive_path.display().to_string(),
    })
}
