//! RENAVAM vehicle fleet.
//!
//! Input columns: `year,month,state,modal,fleet`, one row per vehicle type.
//! The loader collapses vehicle types into the total fleet plus the
//! automobile and motorcycle subtotals.

use super::{check_month, parse_state, read_rows};
use crate::columns;
use crate::error::Result;
use polars::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use transito_geo::State;

const DATASET: &str = "fleet";

/// Vehicle types counted as automobiles.
pub const AUTOMOBILE_MODALS: &[&str] = &["automovel"];

/// Vehicle types counted as motorcycles.
pub const MOTORCYCLE_MODALS: &[&str] = &["motocicleta", "motoneta", "ciclomotor"];

#[derive(Debug, Deserialize)]
struct FleetRow {
    year: i32,
    month: i32,
    state: String,
    modal: String,
    fleet: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct FleetTotals {
    fleet: f64,
    automobiles: f64,
    motorcycles: f64,
}

/// Normalize a RENAVAM vehicle type: lowercase, accents and spaces removed.
fn normalize_modal(modal: &str) -> String {
    modal
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => Some('a'),
            'é' | 'ê' => Some('e'),
            'í' => Some('i'),
            'ó' | 'ô' | 'õ' => Some('o'),
            'ú' | 'ü' => Some('u'),
            'ç' => Some('c'),
            ' ' | '-' | '_' => None,
            other => Some(other),
        })
        .collect()
}

/// Read fleet rows from any CSV source.
///
/// Returns a DataFrame with columns: [year, month, state, fleet, automobiles, motorcycles]
pub fn read_fleet<R: Read>(reader: R) -> Result<DataFrame> {
    let mut totals: BTreeMap<(i32, i32, State), FleetTotals> = BTreeMap::new();

    for (line, row) in read_rows::<FleetRow, _>(reader, DATASET)? {
        check_month(row.month, DATASET, line)?;
        let state = parse_state(&row.state, DATASET, line)?;
        let modal = normalize_modal(&row.modal);

        let entry = totals.entry((row.year, row.month, state)).or_default();
        entry.fleet += row.fleet;
        if AUTOMOBILE_MODALS.contains(&modal.as_str()) {
            entry.automobiles += row.fleet;
        }
        if MOTORCYCLE_MODALS.contains(&modal.as_str()) {
            entry.motorcycles += row.fleet;
        }
    }

    let mut years = Vec::with_capacity(totals.len());
    let mut months = Vec::with_capacity(totals.len());
    let mut states = Vec::with_capacity(totals.len());
    let mut fleet = Vec::with_capacity(totals.len());
    let mut automobiles = Vec::with_capacity(totals.len());
    let mut motorcycles = Vec::with_capacity(totals.len());

    for ((year, month, state), t) in totals {
        years.push(year);
        months.push(month);
        states.push(state.code());
        fleet.push(t.fleet);
        automobiles.push(t.automobiles);
        motorcycles.push(t.motorcycles);
    }

    let df = DataFrame::new(vec![
        Column::new(columns::YEAR.into(), years),
        Column::new(columns::MONTH.into(), months),
        Column::new(columns::STATE.into(), states),
        Column::new(columns::FLEET.into(), fleet),
        Column::new(columns::AUTOMOBILES.into(), automobiles),
        Column::new(columns::MOTORCYCLES.into(), motorcycles),
    ])?;

    Ok(df)
}

/// Load the fleet CSV at `path`.
pub fn load_fleet(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path)?;
    read_fleet(file)
}
