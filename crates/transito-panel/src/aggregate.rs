//! Temporal and spatial aggregation of source frames.

use crate::columns::{MONTH, ORDINAL, PARTITION, PERIOD, STATE, YEAR};
use crate::error::{PanelError, Result};
use crate::period::Resolution;
use crate::registry::{VariableKind, variable_kind};
use polars::prelude::*;
use tracing::debug;
use transito_geo::{Level, State};

/// Variable columns of a frame: everything that is not a key.
pub(crate) fn variable_columns(df: &DataFrame, keys: &[&str]) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| !keys.contains(&name.as_str()))
        .map(|name| name.to_string())
        .collect()
}

fn require_columns(df: &DataFrame, frame: &str, required: &[&str]) -> Result<()> {
    for column in required {
        if df.column(column).is_err() {
            return Err(PanelError::missing_column(frame, column));
        }
    }
    Ok(())
}

/// Coarsen a monthly per-state frame to `resolution`.
///
/// The input holds `[year, month, state, ...variables]`. Flow variables are
/// summed over the months present in each period; stock variables keep the
/// value of the latest month present.
///
/// Returns a DataFrame with columns: [ordinal, period, state, ...variables]
/// sorted by state and ordinal.
pub fn aggregate_temporal(df: &DataFrame, resolution: Resolution) -> Result<DataFrame> {
    require_columns(df, "monthly frame", &[YEAR, MONTH, STATE])?;

    let years = df.column(YEAR)?.i32()?;
    let months = df.column(MONTH)?.i32()?;

    let mut ordinals = Vec::with_capacity(df.height());
    let mut labels = Vec::with_capacity(df.height());
    for (year, month) in years.into_iter().zip(months.into_iter()) {
        let year = year.ok_or_else(|| PanelError::NullKey(YEAR.to_string()))?;
        let month = month.ok_or_else(|| PanelError::NullKey(MONTH.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(PanelError::InvalidPeriod {
                resolution: Resolution::Monthly.name().to_string(),
                index: month,
            });
        }
        let period = resolution.period_of(year, month);
        ordinals.push(period.ordinal());
        labels.push(period.label());
    }

    let variables = variable_columns(df, &[YEAR, MONTH, STATE]);
    let mut aggs = Vec::with_capacity(variables.len());
    for name in &variables {
        let expr = match variable_kind(name)? {
            VariableKind::Flow => col(name.as_str()).sum(),
            VariableKind::Stock => col(name.as_str())
                .sort_by([col(MONTH)], SortMultipleOptions::default())
                .last(),
        };
        aggs.push(expr);
    }

    let with_period = df.hstack(&[
        Column::new(ORDINAL.into(), ordinals),
        Column::new(PERIOD.into(), labels),
    ])?;

    let selection: Vec<Expr> = [ORDINAL, PERIOD, STATE]
        .into_iter()
        .chain(variables.iter().map(String::as_str))
        .map(col)
        .collect();

    let result = with_period
        .lazy()
        .group_by([col(ORDINAL), col(PERIOD), col(STATE)])
        .agg(aggs)
        .sort([STATE, ORDINAL], SortMultipleOptions::default())
        .select(selection)
        .collect()?;

    debug!(
        resolution = %resolution,
        input_rows = df.height(),
        output_rows = result.height(),
        "aggregated frame over time"
    );

    Ok(result)
}

/// Sum a per-state frame into the partitions of `level`.
///
/// The input holds `[ordinal, period, state, ...variables]`; rows whose state
/// is not a federative unit are dropped.
///
/// Returns a DataFrame with columns: [ordinal, period, partition, ...variables]
/// sorted by partition and ordinal.
pub fn aggregate_spatial(df: &DataFrame, level: Level) -> Result<DataFrame> {
    require_columns(df, "period frame", &[ORDINAL, PERIOD, STATE])?;

    let states = State::all();
    let codes: Vec<&str> = states.iter().map(State::code).collect();
    let labels: Vec<&str> = states.iter().map(|s| level.key_for(*s).label()).collect();
    let partition_map = DataFrame::new(vec![
        Column::new(STATE.into(), codes),
        Column::new(PARTITION.into(), labels),
    ])?;

    let variables = variable_columns(df, &[ORDINAL, PERIOD, STATE]);
    let aggs: Vec<Expr> = variables.iter().map(|v| col(v.as_str()).sum()).collect();
    let selection: Vec<Expr> = [ORDINAL, PERIOD, PARTITION]
        .into_iter()
        .chain(variables.iter().map(String::as_str))
        .map(col)
        .collect();

    let result = df
        .clone()
        .lazy()
        .join(
            partition_map.lazy(),
            [col(STATE)],
            [col(STATE)],
            JoinArgs::new(JoinType::Inner),
        )
        .group_by([col(ORDINAL), col(PERIOD), col(PARTITION)])
        .agg(aggs)
        .sort([PARTITION, ORDINAL], SortMultipleOptions::default())
        .select(selection)
        .collect()?;

    debug!(
        level = %level,
        input_rows = df.height(),
        output_rows = result.height(),
        "aggregated frame over space"
    );

    Ok(result)
}
