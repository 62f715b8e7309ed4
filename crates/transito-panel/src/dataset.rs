//! Regression datasets extracted from a panel.

use crate::columns::ORDINAL;
use crate::error::{PanelError, Result};
use crate::panel::Panel;
use crate::period::Period;
use ndarray::{Array2, Axis};
use polars::prelude::*;
use tracing::debug;
use transito_geo::PartitionKey;

/// Response vector and predictor matrix of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionDataset {
    /// Partition the rows belong to
    pub partition: PartitionKey,
    /// Response column name
    pub response_name: String,
    /// Predictor column names, in matrix column order
    pub predictor_names: Vec<String>,
    /// Period of each row
    pub periods: Vec<Period>,
    /// Response values
    pub response: Vec<f64>,
    /// Predictor values, one row per observation
    pub predictors: Array2<f64>,
    /// Rows dropped because a used column was null or not finite
    pub dropped_rows: usize,
}

impl RegressionDataset {
    /// Extract the complete rows of `partition` from `panel`.
    pub fn from_panel(
        panel: &Panel,
        partition: PartitionKey,
        response: &str,
        predictors: &[String],
    ) -> Result<Self> {
        if predictors.is_empty() {
            return Err(PanelError::InvalidDataset(
                "at least one predictor is required".to_string(),
            ));
        }
        if predictors.iter().any(|p| p == response) {
            return Err(PanelError::InvalidDataset(format!(
                "response '{response}' is also a predictor"
            )));
        }

        let df = panel.partition_frame(partition)?;
        let frame_name = format!("panel partition {partition}");

        let float_column = |name: &str| -> Result<Float64Chunked> {
            let column = df
                .column(name)
                .map_err(|_| PanelError::missing_column(&frame_name, name))?;
            Ok(column.cast(&DataType::Float64)?.f64()?.clone())
        };

        let ordinals = df.column(ORDINAL)?.i32()?;
        let y = float_column(response)?;
        let xs = predictors
            .iter()
            .map(|name| float_column(name))
            .collect::<Result<Vec<_>>>()?;

        let mut periods = Vec::with_capacity(df.height());
        let mut values = Vec::with_capacity(df.height());
        let mut flat = Vec::with_capacity(df.height() * predictors.len());
        let mut dropped_rows = 0;

        for row in 0..df.height() {
            let ordinal = ordinals
                .get(row)
                .ok_or_else(|| PanelError::NullKey(ORDINAL.to_string()))?;
            let target = y.get(row).filter(|v| v.is_finite());
            let features: Option<Vec<f64>> = xs
                .iter()
                .map(|x| x.get(row).filter(|v| v.is_finite()))
                .collect();

            match (target, features) {
                (Some(target), Some(features)) => {
                    periods.push(Period::from_ordinal(panel.resolution, ordinal));
                    values.push(target);
                    flat.extend(features);
                }
                _ => dropped_rows += 1,
            }
        }

        if dropped_rows > 0 {
            debug!(%partition, dropped_rows, "dropped incomplete rows");
        }

        let predictors_matrix = Array2::from_shape_vec((values.len(), predictors.len()), flat)?;

        Ok(Self {
            partition,
            response_name: response.to_string(),
            predictor_names: predictors.to_vec(),
            periods,
            response: values,
            predictors: predictors_matrix,
            dropped_rows,
        })
    }

    /// Number of observations.
    pub const fn len(&self) -> usize {
        self.response.len()
    }

    /// Whether the dataset has no observations.
    pub const fn is_empty(&self) -> bool {
        self.response.is_empty()
    }

    /// Number of predictor columns.
    pub fn n_predictors(&self) -> usize {
        self.predictors.ncols()
    }

    /// Subset of rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            partition: self.partition,
            response_name: self.response_name.clone(),
            predictor_names: self.predictor_names.clone(),
            periods: indices.iter().map(|&i| self.periods[i]).collect(),
            response: indices.iter().map(|&i| self.response[i]).collect(),
            predictors: self.predictors.select(Axis(0), indices),
            dropped_rows: 0,
        }
    }

    /// Same rows with a different predictor matrix.
    pub(crate) fn with_predictors(&self, names: Vec<String>, predictors: Array2<f64>) -> Self {
        Self {
            predictor_names: names,
            predictors,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ACCIDENTS, DATASUS_DEATHS, FLEET, PARTITION, PERIOD};
    use crate::join::{JoinReport, JoinStrategy};
    use crate::period::Resolution;
    use transito_geo::{Level, State};

    fn panel() -> Panel {
        let frame = df!(
            ORDINAL => [24240, 24241, 24242, 24240],
            PERIOD => ["2020-01", "2020-02", "2020-03", "2020-01"],
            PARTITION => ["SP", "SP", "SP", "RJ"],
            ACCIDENTS => [Some(1.0), None, Some(3.0), Some(9.0)],
            FLEET => [10.0, 20.0, 30.0, 90.0],
            DATASUS_DEATHS => [2.0, 4.0, 6.0, 18.0]
        )
        .unwrap();
        Panel {
            frame,
            resolution: Resolution::Monthly,
            level: Level::State,
            join_report: JoinReport {
                strategy: JoinStrategy::Full,
                inputs: vec![],
                output_rows: 4,
            },
        }
    }

    #[test]
    fn test_from_panel_drops_incomplete_rows() {
        let predictors = vec![ACCIDENTS.to_string(), FLEET.to_string()];
        let ds = RegressionDataset::from_panel(
            &panel(),
            PartitionKey::State(State::SP),
            DATASUS_DEATHS,
            &predictors,
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows, 1);
        assert_eq!(ds.response, vec![2.0, 6.0]);
        assert_eq!(ds.predictors.shape(), &[2, 2]);
        assert_eq!(ds.predictors[[1, 0]], 3.0);
        assert_eq!(ds.periods[1].label(), "2020-03");
    }

    #[test]
    fn test_missing_predictor_column() {
        let predictors = vec!["gdp".to_string()];
        assert!(matches!(
            RegressionDataset::from_panel(
                &panel(),
                PartitionKey::State(State::SP),
                DATASUS_DEATHS,
                &predictors,
            ),
            Err(PanelError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_response_as_predictor_rejected() {
        let predictors = vec![DATASUS_DEATHS.to_string()];
        assert!(
            RegressionDataset::from_panel(
                &panel(),
                PartitionKey::State(State::SP),
                DATASUS_DEATHS,
                &predictors,
            )
            .is_err()
        );
    }

    #[test]
    fn test_select_rows() {
        let predictors = vec![FLEET.to_string()];
        let ds = RegressionDataset::from_panel(
            &panel(),
            PartitionKey::State(State::SP),
            DATASUS_DEATHS,
            &predictors,
        )
        .unwrap();
        let subset = ds.select_rows(&[2, 0]);
        assert_eq!(subset.response, vec![6.0, 2.0]);
        assert_eq!(subset.predictors[[0, 0]], 30.0);
    }
}
