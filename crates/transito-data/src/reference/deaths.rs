//! DataSUS traffic deaths.
//!
//! Input columns: `year,month,state,deaths`. Duplicate keys are summed, so
//! files split by cause of death or municipality can be loaded unchanged.

use super::{check_month, parse_state, read_rows};
use crate::columns;
use crate::error::Result;
use polars::prelude::*;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const DATASET: &str = "deaths";

#[derive(Debug, Deserialize)]
struct DeathRow {
    year: i32,
    month: i32,
    state: String,
    deaths: f64,
}

/// Read death counts from any CSV source.
///
/// Returns a DataFrame with columns: [year, month, state, datasus_deaths]
pub fn read_deaths<R: Read>(reader: R) -> Result<DataFrame> {
    let rows = read_rows::<DeathRow, _>(reader, DATASET)?;

    let mut years = Vec::with_capacity(rows.len());
    let mut months = Vec::with_capacity(rows.len());
    let mut states = Vec::with_capacity(rows.len());
    let mut deaths = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        check_month(row.month, DATASET, line)?;
        let state = parse_state(&row.state, DATASET, line)?;
        years.push(row.year);
        months.push(row.month);
        states.push(state.code());
        deaths.push(row.deaths);
    }

    let df = DataFrame::new(vec![
        Column::new(columns::YEAR.into(), years),
        Column::new(columns::MONTH.into(), months),
        Column::new(columns::STATE.into(), states),
        Column::new(columns::DATASUS_DEATHS.into(), deaths),
    ])?;

    let df = df
        .lazy()
        .group_by([col(columns::YEAR), col(columns::MONTH), col(columns::STATE)])
        .agg([col(columns::DATASUS_DEATHS).sum()])
        .sort(
            [columns::YEAR, columns::MONTH, columns::STATE],
            SortMultipleOptions::default(),
        )
        .collect()?;

    Ok(df)
}

/// Load the DataSUS deaths CSV at `path`.
pub fn load_deaths(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path)?;
    read_deaths(file)
}
