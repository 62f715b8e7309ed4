//! Parsing of PRF `datatran` accident files.
//!
//! Each yearly file lists one accident per row, `;` separated. Older files
//! are Latin-1 encoded and use `DD/MM/YYYY` dates; newer ones are UTF-8 with
//! ISO dates. Both layouts are accepted.

use crate::columns;
use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::borrow::Cow;
use tracing::debug;
use transito_geo::State;

const DATASET: &str = "datatran";

/// One accident as recorded by the PRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccidentRecord {
    /// Date of the accident
    pub date: NaiveDate,
    /// Federative unit where it happened
    pub state: State,
    /// Deaths at the scene
    pub deaths: u32,
    /// Injured people (light and severe)
    pub injured: u32,
}

impl AccidentRecord {
    /// Whether the accident killed anyone.
    pub const fn is_fatal(&self) -> bool {
        self.deaths > 0
    }
}

/// Outcome of parsing one `datatran` file.
#[derive(Debug, Clone, Default)]
pub struct DatatranParse {
    /// Rows that were understood
    pub records: Vec<AccidentRecord>,
    /// Rows dropped because of an unknown UF, bad date or bad count
    pub skipped_rows: usize,
}

/// Column positions resolved from the header.
#[derive(Debug)]
struct Layout {
    date: usize,
    state: usize,
    deaths: usize,
    injured: InjuredColumns,
}

#[derive(Debug)]
enum InjuredColumns {
    Total(usize),
    Split { light: usize, severe: usize },
}

impl Layout {
    fn from_header(header: &csv::ByteRecord) -> Result<Self> {
        let names: Vec<String> = header
            .iter()
            .map(|field| {
                decode_field(field)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_ascii_lowercase()
            })
            .collect();

        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::MissingColumn {
                dataset: DATASET.to_string(),
                column: name.to_string(),
            })
        };

        let injured = match find("feridos") {
            Some(total) => InjuredColumns::Total(total),
            None => InjuredColumns::Split {
                light: require("feridos_leves")?,
                severe: require("feridos_graves")?,
            },
        };

        Ok(Self {
            date: require("data_inversa")?,
            state: require("uf")?,
            deaths: require("mortos")?,
            injured,
        })
    }
}

/// Decode a field as UTF-8, falling back to Latin-1.
pub fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    // Latin-1 maps each byte to the code point of the same value
    std::str::from_utf8(bytes).map_or_else(
        |_| Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
        Cow::Borrowed,
    )
}

/// Parse an accident date in any of the layouts used across the years.
pub fn parse_accident_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.contains('-') {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let year_part = value.rsplit('/').next()?;
    match year_part.len() {
        4 => NaiveDate::parse_from_str(value, "%d/%m/%Y").ok(),
        2 => NaiveDate::parse_from_str(value, "%d/%m/%y").ok(),
        _ => None,
    }
}

/// Parse a count field; blank fields count as zero.
fn parse_count(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("na") {
        return Some(0);
    }
    value.parse().ok()
}

/// Parse the bytes of a `datatran` CSV file.
///
/// Rows with an unknown UF, an unparseable date or a malformed count are
/// skipped and counted in [`DatatranParse::skipped_rows`].
pub fn parse_datatran(bytes: &[u8]) -> Result<DatatranParse> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(bytes);

    let layout = Layout::from_header(reader.byte_headers()?)?;
    let mut parsed = DatatranParse::default();

    for (index, row) in reader.byte_records().enumerate() {
        let row = row?;
        let field = |i: usize| row.get(i).map(decode_field).unwrap_or_default();

        let date = parse_accident_date(&field(layout.date));
        let state = State::from_code(&field(layout.state));
        let deaths = parse_count(&field(layout.deaths));
        let injured = match layout.injured {
            InjuredColumns::Total(i) => parse_count(&field(i)),
            InjuredColumns::Split { light, severe } => parse_count(&field(light))
                .zip(parse_count(&field(severe)))
                .map(|(l, s)| l + s),
        };

        match (date, state, deaths, injured) {
            (Some(date), Some(state), Some(deaths), Some(injured)) => {
                parsed.records.push(AccidentRecord {
                    date,
                    state,
                    deaths,
                    injured,
                });
            }
            _ => {
                // header is line 1
                debug!(line = index + 2, "skipping unreadable datatran row");
                parsed.skipped_rows += 1;
            }
        }
    }

    Ok(parsed)
}

/// Summarize accident records per month and federative unit.
///
/// Returns a DataFrame with columns:
/// [year, month, state, accidents, fatal_accidents, injured, prf_deaths]
/// sorted by year, month and state.
pub fn summarize_monthly(records: &[AccidentRecord]) -> Result<DataFrame> {
    let years: Vec<i32> = records.iter().map(|r| r.date.year()).collect();
    let months: Vec<i32> = records.iter().map(|r| r.date.month() as i32).collect();
    let states: Vec<&str> = records.iter().map(|r| r.state.code()).collect();
    let fatal: Vec<f64> = records
        .iter()
        .map(|r| if r.is_fatal() { 1.0 } else { 0.0 })
        .collect();
    let injured: Vec<f64> = records.iter().map(|r| f64::from(r.injured)).collect();
    let deaths: Vec<f64> = records.iter().map(|r| f64::from(r.deaths)).collect();

    let df = DataFrame::new(vec![
        Column::new(columns::YEAR.into(), years),
        Column::new(columns::MONTH.into(), months),
        Column::new(columns::STATE.into(), states),
        Column::new(columns::FATAL_ACCIDENTS.into(), fatal),
        Column::new(columns::INJURED.into(), injured),
        Column::new(columns::PRF_DEATHS.into(), deaths),
    ])?;

    let summary = df
        .lazy()
        .group_by([col(columns::YEAR), col(columns::MONTH), col(columns::STATE)])
        .agg([
            col(columns::PRF_DEATHS)
                .count()
                .cast(DataType::Float64)
                .alias(columns::ACCIDENTS),
            col(columns::FATAL_ACCIDENTS).sum(),
            col(columns::INJURED).sum(),
            col(columns::PRF_DEATHS).sum(),
        ])
        .sort(
            [columns::YEAR, columns::MONTH, columns::STATE],
            SortMultipleOptions::default(),
        )
        .select([
            col(columns::YEAR),
            col(columns::MONTH),
            col(columns::STATE),
            col(columns::ACCIDENTS),
            col(columns::FATAL_ACCIDENTS),
            col(columns::INJURED),
            col(columns::PRF_DEATHS),
        ])
        .collect()?;

    Ok(summary)
}
