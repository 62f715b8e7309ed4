//! IBGE gross domestic product.
//!
//! Input columns: `year,quarter,state,gdp`. Quarter `0` marks an annual
//! figure, which is how state-level GDP is published. Values are spread
//! evenly over their months so that summing months back into quarters or
//! years reproduces the published figure.
//!
//! A state's year is either one annual figure or up to four quarters.
//! Mixing the two, or repeating a quarter, is rejected.

use super::{parse_state, read_rows};
use crate::columns;
use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use transito_geo::State;

const DATASET: &str = "gdp";

#[derive(Debug, Deserialize)]
struct GdpRow {
    year: i32,
    quarter: i32,
    state: String,
    gdp: f64,
}

/// Months covered by a quarter, or the whole year for quarter `0`.
const fn months_of(quarter: i32) -> std::ops::RangeInclusive<i32> {
    if quarter == 0 {
        1..=12
    } else {
        let first = (quarter - 1) * 3 + 1;
        first..=first + 2
    }
}

/// Read GDP rows from any CSV source.
///
/// Returns a DataFrame with columns: [year, month, state, gdp]
pub fn read_gdp<R: Read>(reader: R) -> Result<DataFrame> {
    let mut monthly: BTreeMap<(i32, i32, State), f64> = BTreeMap::new();
    let mut quarters_seen: BTreeMap<(i32, State), Vec<i32>> = BTreeMap::new();

    for (line, row) in read_rows::<GdpRow, _>(reader, DATASET)? {
        if !(0..=4).contains(&row.quarter) {
            return Err(DataError::invalid_record(
                DATASET,
                line,
                format!("quarter {} outside 0-4", row.quarter),
            ));
        }
        let state = parse_state(&row.state, DATASET, line)?;

        let (year, quarter) = (row.year, row.quarter);
        let seen = quarters_seen.entry((year, state)).or_default();
        if seen.contains(&quarter) {
            return Err(DataError::invalid_record(
                DATASET,
                line,
                format!("duplicate figure for {state} {year} quarter {quarter}"),
            ));
        }
        if seen.iter().any(|&q| (q == 0) != (quarter == 0)) {
            return Err(DataError::invalid_record(
                DATASET,
                line,
                format!("{state} {year} mixes annual and quarterly figures"),
            ));
        }
        seen.push(quarter);

        let months = months_of(quarter);
        let share = row.gdp / months.clone().count() as f64;
        for month in months {
            *monthly.entry((row.year, month, state)).or_insert(0.0) += share;
        }
    }

    let years: Vec<i32> = monthly.keys().map(|(y, _, _)| *y).collect();
    let months: Vec<i32> = monthly.keys().map(|(_, m, _)| *m).collect();
    let states: Vec<&str> = monthly.keys().map(|(_, _, s)| s.code()).collect();
    let gdp: Vec<f64> = monthly.values().copied().collect();

    let df = DataFrame::new(vec![
        Column::new(columns::YEAR.into(), years),
        Column::new(columns::MONTH.into(), months),
        Column::new(columns::STATE.into(), states),
        Column::new(columns::GDP.into(), gdp),
    ])?;

    Ok(df)
}

/// Load the GDP CSV at `path`.
pub fn load_gdp(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path)?;
    read_gdp(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quarter_spread_over_months() {
        let data = "year,quarter,state,gdp\n2021,2,MG,300\n";
        let df = read_gdp(data.as_bytes()).unwrap();

        assert_eq!(df.height(), 3);
        let months: Vec<i32> = df
            .column(columns::MONTH)
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(months, vec![4, 5, 6]);

        let total: f64 = df
            .column(columns::GDP)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .sum();
        assert_relative_eq!(total, 300.0);
    }

    #[test]
    fn test_annual_figure() {
        let data = "year,quarter,state,gdp\n2019,0,AC,1200\n";
        let df = read_gdp(data.as_bytes()).unwrap();
        assert_eq!(df.height(), 12);
        let gdp = df.column(columns::GDP).unwrap().f64().unwrap();
        assert_relative_eq!(gdp.get(0).unwrap(), 100.0);
    }

    #[test]
    fn test_annual_and_quarterly_rejected() {
        let data = "year,quarter,state,gdp\n2019,0,SP,100\n2019,1,SP,25\n";
        assert!(matches!(
            read_gdp(data.as_bytes()),
            Err(DataError::InvalidRecord { line: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_quarter() {
        let data = "year,quarter,state,gdp\n2019,5,AC,1\n";
        assert!(matches!(
            read_gdp(data.as_bytes()),
            Err(DataError::InvalidRecord { line: 2, .. })
        ));
    }
}
