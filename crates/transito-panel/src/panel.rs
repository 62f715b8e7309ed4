//! Panel construction.

use crate::aggregate::{aggregate_spatial, aggregate_temporal, variable_columns};
use crate::columns::{ORDINAL, PANEL_KEYS, PARTITION};
use crate::error::Result;
use crate::join::{JoinReport, JoinStrategy, SourceFrame, join_sources};
use crate::period::{Period, Resolution};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::info;
use transito_geo::{Level, PartitionKey};

/// Joined observations of every source at one resolution and level.
#[derive(Debug, Clone)]
pub struct Panel {
    /// `[ordinal, period, partition, ...variables]`, sorted by partition
    /// and ordinal
    pub frame: DataFrame,
    /// Period length
    pub resolution: Resolution,
    /// Geographic level of the partitions
    pub level: Level,
    /// Row counts of the join
    pub join_report: JoinReport,
}

impl Panel {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Variable columns carried by the panel.
    pub fn variables(&self) -> Vec<String> {
        variable_columns(&self.frame, &PANEL_KEYS)
    }

    /// Partitions with at least one row, in report order.
    pub fn partitions(&self) -> Result<Vec<PartitionKey>> {
        let labels = self.frame.column(PARTITION)?.str()?;
        let unique: BTreeSet<&str> = labels.into_iter().flatten().collect();

        let mut keys = unique
            .into_iter()
            .map(|label| self.level.parse_partition(label))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        keys.sort();
        Ok(keys)
    }

    /// Rows of one partition, sorted by ordinal.
    pub fn partition_frame(&self, key: PartitionKey) -> Result<DataFrame> {
        let df = self
            .frame
            .clone()
            .lazy()
            .filter(col(PARTITION).eq(lit(key.label())))
            .sort([ORDINAL], SortMultipleOptions::default())
            .collect()?;
        Ok(df)
    }

    /// First and last period present.
    pub fn period_range(&self) -> Result<Option<(Period, Period)>> {
        let ordinals = self.frame.column(ORDINAL)?.i32()?;
        Ok(ordinals.min().zip(ordinals.max()).map(|(first, last)| {
            (
                Period::from_ordinal(self.resolution, first),
                Period::from_ordinal(self.resolution, last),
            )
        }))
    }
}

/// Build a panel from monthly per-state source frames.
///
/// Each source holds `[year, month, state, ...variables]`. Sources are
/// coarsened to `resolution`, summed into the partitions of `level` and
/// joined with `strategy`.
pub fn build_panel(
    sources: &[SourceFrame],
    resolution: Resolution,
    level: Level,
    strategy: JoinStrategy,
) -> Result<Panel> {
    let mut aggregated = Vec::with_capacity(sources.len());
    for source in sources {
        let temporal = aggregate_temporal(&source.frame, resolution)?;
        let spatial = aggregate_spatial(&temporal, level)?;
        aggregated.push(SourceFrame::new(source.name.clone(), spatial));
    }

    let (frame, join_report) = join_sources(&aggregated, strategy)?;

    info!(
        resolution = %resolution,
        level = %level,
        strategy = %strategy,
        rows = frame.height(),
        "built panel"
    );

    Ok(Panel {
        frame,
        resolution,
        level,
        join_report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ACCIDENTS, FLEET, MONTH, STATE, YEAR};
    use transito_geo::{Region, State};

    fn sources() -> Vec<SourceFrame> {
        let accidents = df!(
            YEAR => [2020, 2020, 2020, 2020],
            MONTH => [1, 2, 1, 2],
            STATE => ["SP", "SP", "BA", "BA"],
            ACCIDENTS => [1.0, 2.0, 3.0, 4.0]
        )
        .unwrap();
        let fleet = df!(
            YEAR => [2020, 2020, 2020],
            MONTH => [1, 2, 1],
            STATE => ["SP", "SP", "BA"],
            FLEET => [10.0, 11.0, 5.0]
        )
        .unwrap();
        vec![
            SourceFrame::new("prf", accidents),
            SourceFrame::new("renavam", fleet),
        ]
    }

    #[test]
    fn test_regional_panel() {
        let panel = build_panel(
            &sources(),
            Resolution::Monthly,
            Level::Regional,
            JoinStrategy::Inner,
        )
        .unwrap();

        // BA has no fleet for February
        assert_eq!(panel.height(), 3);
        assert_eq!(
            panel.partitions().unwrap(),
            vec![
                PartitionKey::Region(Region::Nordeste),
                PartitionKey::Region(Region::Sudeste)
            ]
        );
        assert_eq!(
            panel.variables(),
            vec![ACCIDENTS.to_string(), FLEET.to_string()]
        );

        let (first, last) = panel.period_range().unwrap().unwrap();
        assert_eq!(first.label(), "2020-01");
        assert_eq!(last.label(), "2020-02");
    }

    #[test]
    fn test_partition_frame() {
        let panel = build_panel(
            &sources(),
            Resolution::Monthly,
            Level::State,
            JoinStrategy::Full,
        )
        .unwrap();
        let sp = panel
            .partition_frame(PartitionKey::State(State::SP))
            .unwrap();
        assert_eq!(sp.height(), 2);
        let ba = panel
            .partition_frame(PartitionKey::State(State::BA))
            .unwrap();
        assert_eq!(ba.column(FLEET).unwrap().null_count(), 1);
    }

    #[test]
    fn test_national_panel_sums_states() {
        let panel = build_panel(
            &sources(),
            Resolution::Annual,
            Level::National,
            JoinStrategy::Inner,
        )
        .unwrap();
        assert_eq!(panel.height(), 1);
        let accidents = panel.frame.column(ACCIDENTS).unwrap().f64().unwrap();
        assert_eq!(accidents.get(0), Some(10.0));
        // last month per state: SP February, BA January
        let fleet = panel.frame.column(FLEET).unwrap().f64().unwrap();
        assert_eq!(fleet.get(0), Some(16.0));
    }
}
