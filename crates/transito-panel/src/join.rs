//! Alignment of aggregated sources on period and partition.

use crate::aggregate::variable_columns;
use crate::columns::{ORDINAL, PANEL_KEYS, PARTITION, PERIOD};
use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// How rows missing from some source are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Keep only keys present in every source
    #[default]
    Inner,
    /// Keep every key, filling missing variables with nulls
    Full,
}

impl JoinStrategy {
    fn join_args(self) -> JoinArgs {
        match self {
            Self::Inner => JoinArgs::new(JoinType::Inner),
            Self::Full => {
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
            }
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "inner"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// A named source frame.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// Source name shown in reports
    pub name: String,
    /// Frame contents
    pub frame: DataFrame,
}

impl SourceFrame {
    /// Create a named source frame.
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }
}

/// Row count of one join input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRows {
    /// Source name
    pub name: String,
    /// Rows after aggregation
    pub rows: usize,
}

/// Row counts before and after a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    /// Strategy used
    pub strategy: JoinStrategy,
    /// Rows per input
    pub inputs: Vec<SourceRows>,
    /// Rows in the joined frame
    pub output_rows: usize,
}

impl JoinReport {
    /// Rows of each input dropped by the join.
    pub fn dropped_rows(&self) -> Vec<(String, usize)> {
        self.inputs
            .iter()
            .map(|s| (s.name.clone(), s.rows.saturating_sub(self.output_rows)))
            .collect()
    }
}

/// Join aggregated sources on `(ordinal, period, partition)`.
///
/// Every frame must carry the three key columns; the remaining columns are
/// variables and must not repeat across sources.
///
/// Returns the joined frame, sorted by partition and ordinal, with a report
/// of the row counts.
pub fn join_sources(
    sources: &[SourceFrame],
    strategy: JoinStrategy,
) -> Result<(DataFrame, JoinReport)> {
    let (first, rest) = sources.split_first().ok_or(PanelError::NoSources)?;

    let mut seen = HashSet::new();
    for source in sources {
        for key in PANEL_KEYS {
            if source.frame.column(key).is_err() {
                return Err(PanelError::missing_column(&source.name, key));
            }
        }
        for variable in variable_columns(&source.frame, &PANEL_KEYS) {
            if !seen.insert(variable.clone()) {
                return Err(PanelError::DuplicateVariable(variable));
            }
        }
    }

    let keys = || [col(ORDINAL), col(PERIOD), col(PARTITION)];
    let mut joined = first.frame.clone().lazy();
    for source in rest {
        joined = joined.join(
            source.frame.clone().lazy(),
            keys(),
            keys(),
            strategy.join_args(),
        );
    }

    let frame = joined
        .sort([PARTITION, ORDINAL], SortMultipleOptions::default())
        .collect()?;

    let report = JoinReport {
        strategy,
        inputs: sources
            .iter()
            .map(|s| SourceRows {
                name: s.name.clone(),
                rows: s.frame.height(),
            })
            .collect(),
        output_rows: frame.height(),
    };

    for (name, dropped) in report.dropped_rows() {
        if dropped > 0 {
            debug!(source = %name, dropped, "rows without a match in every source");
        }
    }

    Ok((frame, report))
}
