//! Reference datasets supplied as local CSV files.
//!
//! - fleet: RENAVAM registered vehicles per month, UF and vehicle type
//! - gdp: IBGE gross domestic product per quarter and UF
//! - deaths: DataSUS traffic deaths per month and UF

pub mod deaths;
pub mod fleet;
pub mod gdp;

pub use deaths::{load_deaths, read_deaths};
pub use fleet::{load_fleet, read_fleet};
pub use gdp::{load_gdp, read_gdp};

use crate::error::{DataError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use transito_geo::State;

/// Deserialize every row of a CSV source, tagging each with its line number.
pub(crate) fn read_rows<T, R>(reader: R, dataset: &str) -> Result<Vec<(u64, T)>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, row) in reader.deserialize::<T>().enumerate() {
        // header is line 1
        let line = index as u64 + 2;
        let row = row.map_err(|e| DataError::invalid_record(dataset, line, e.to_string()))?;
        rows.push((line, row));
    }

    Ok(rows)
}

/// Parse a UF code, reporting the line on failure.
pub(crate) fn parse_state(value: &str, dataset: &str, line: u64) -> Result<State> {
    State::from_code(value)
        .ok_or_else(|| DataError::invalid_record(dataset, line, format!("unknown UF '{value}'")))
}

/// Validate a calendar month.
pub(crate) fn check_month(month: i32, dataset: &str, line: u64) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(DataError::invalid_record(dataset, line, format!("month {month} outside 1-12")))
    }
}
