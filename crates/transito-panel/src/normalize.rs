//! Z-score normalization of predictors.

use crate::dataset::RegressionDataset;
use crate::error::{PanelError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Scaling learned for one predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    /// Predictor name
    pub name: String,
    /// Column position in the unnormalized matrix
    pub index: usize,
    /// Training mean
    pub mean: f64,
    /// Training sample standard deviation
    pub std_dev: f64,
}

/// Predictor scaling fitted on a training part.
///
/// Predictors that are constant in the training part carry no information
/// and are dropped; every part transformed by the same normalizer ends up
/// with the same columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    fitted_names: Vec<String>,
    scales: Vec<ColumnScale>,
    dropped: Vec<String>,
}

impl Normalizer {
    /// Learn means and standard deviations from `train`.
    pub fn fit(train: &RegressionDataset) -> Result<Self> {
        if train.len() < 2 {
            return Err(PanelError::InsufficientRows {
                partition: train.partition.label().to_string(),
                rows: train.len(),
                required: 2,
            });
        }

        let mut scales = Vec::new();
        let mut dropped = Vec::new();

        for (index, (name, column)) in train
            .predictor_names
            .iter()
            .zip(train.predictors.axis_iter(Axis(1)))
            .enumerate()
        {
            let mean = column.mean().unwrap_or(0.0);
            let std_dev = column.std(1.0);

            if std_dev.is_finite() && std_dev > f64::EPSILON * mean.abs().max(1.0) {
                scales.push(ColumnScale {
                    name: name.clone(),
                    index,
                    mean,
                    std_dev,
                });
            } else {
                warn!(
                    partition = %train.partition,
                    predictor = %name,
                    "dropping predictor with zero variance"
                );
                dropped.push(name.clone());
            }
        }

        Ok(Self {
            fitted_names: train.predictor_names.clone(),
            scales,
            dropped,
        })
    }

    /// Apply the learned scaling to any part of the same dataset.
    pub fn transform(&self, dataset: &RegressionDataset) -> Result<RegressionDataset> {
        if dataset.predictor_names != self.fitted_names {
            return Err(PanelError::InvalidDataset(format!(
                "normalizer fitted on {:?}, dataset has {:?}",
                self.fitted_names, dataset.predictor_names
            )));
        }

        let scaled = Array2::from_shape_fn((dataset.len(), self.scales.len()), |(row, j)| {
            let scale = &self.scales[j];
            (dataset.predictors[[row, scale.index]] - scale.mean) / scale.std_dev
        });

        Ok(dataset.with_predictors(self.kept_names(), scaled))
    }

    /// Names of the predictors that survive normalization.
    pub fn kept_names(&self) -> Vec<String> {
        self.scales.iter().map(|s| s.name.clone()).collect()
    }

    /// Predictors dropped for having zero variance.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Learned scaling per kept predictor.
    pub fn scales(&self) -> &[ColumnScale] {
        &self.scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use transito_geo::PartitionKey;

    fn dataset(predictors: Array2<f64>) -> RegressionDataset {
        let n = predictors.nrows();
        RegressionDataset {
            partition: PartitionKey::National,
            response_name: "y".to_string(),
            predictor_names: vec!["a".to_string(), "b".to_string()],
            periods: (0..n as i32)
                .map(|i| crate::Period::from_ordinal(crate::Resolution::Annual, 2015 + i))
                .collect(),
            response: vec![0.0; n],
            predictors,
            dropped_rows: 0,
        }
    }

    #[test]
    fn test_zscore_with_training_moments() {
        let train = dataset(array![[1.0, 5.0], [2.0, 6.0], [3.0, 7.0]]);
        let normalizer = Normalizer::fit(&train).unwrap();

        let scaled = normalizer.transform(&train).unwrap();
        assert_relative_eq!(scaled.predictors[[0, 0]], -1.0);
        assert_relative_eq!(scaled.predictors[[1, 0]], 0.0);
        assert_relative_eq!(scaled.predictors[[2, 1]], 1.0);

        // test rows reuse the training moments
        let test = dataset(array![[5.0, 5.0]]);
        let scaled = normalizer.transform(&test).unwrap();
        assert_relative_eq!(scaled.predictors[[0, 0]], 3.0);
        assert_relative_eq!(scaled.predictors[[0, 1]], -1.0);
    }

    #[test]
    fn test_constant_predictor_dropped() {
        let train = dataset(array![[1.0, 4.0], [2.0, 4.0], [3.0, 4.0]]);
        let normalizer = Normalizer::fit(&train).unwrap();

        assert_eq!(normalizer.dropped(), &["b".to_string()]);
        let scaled = normalizer.transform(&train).unwrap();
        assert_eq!(scaled.predictor_names, vec!["a".to_string()]);
        assert_eq!(scaled.predictors.ncols(), 1);
    }

    #[test]
    fn test_needs_two_rows() {
        let train = dataset(array![[1.0, 2.0]]);
        assert!(matches!(
            Normalizer::fit(&train),
            Err(PanelError::InsufficientRows { .. })
        ));
    }
}
