//! One model per geographic partition.

use crate::error::{ModelError, Result};
use crate::metrics::{Metrics, metrics};
use crate::ols::{OlsFit, OlsOptions, fit_ols};
use crate::predict::{IntervalKind, Prediction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use transito_geo::{Level, PartitionKey};
use transito_panel::columns;
use transito_panel::{
    DEFAULT_TRAIN_FRACTION, Normalizer, Panel, RegressionDataset, Resolution, SplitStrategy, split,
    train_size,
};

/// What to fit on every partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Response column
    pub response: String,
    /// Predictor columns
    pub predictors: Vec<String>,
    /// Share of rows used for training
    pub train_fraction: f64,
    /// How rows are assigned to the training part
    pub split: SplitStrategy,
    /// Interval attached to predictions
    pub interval: IntervalKind,
    /// OLS options
    pub ols: OlsOptions,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            response: columns::DATASUS_DEATHS.to_string(),
            predictors: vec![
                columns::FLEET.to_string(),
                columns::MOTORCYCLES.to_string(),
                columns::GDP.to_string(),
                columns::ACCIDENTS.to_string(),
            ],
            train_fraction: DEFAULT_TRAIN_FRACTION,
            split: SplitStrategy::default(),
            interval: IntervalKind::default(),
            ols: OlsOptions::default(),
        }
    }
}

impl ModelSpec {
    /// Check the parts of the spec that do not depend on data.
    pub fn validate(&self) -> Result<()> {
        self.ols.validate()?;
        train_size(2, self.train_fraction)?;

        if self.predictors.is_empty() {
            return Err(ModelError::InvalidSpec("at least one predictor is required".to_string()));
        }
        if self.predictors.contains(&self.response) {
            return Err(ModelError::InvalidSpec(format!(
                "response '{}' is also a predictor",
                self.response
            )));
        }
        let mut seen = self.predictors.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != self.predictors.len() {
            return Err(ModelError::InvalidSpec("predictors must not repeat".to_string()));
        }
        Ok(())
    }
}

/// Everything fitted and predicted for one partition.
#[derive(Debug, Clone)]
pub struct PartitionFit {
    /// Partition key
    pub partition: PartitionKey,
    /// Normalized training part
    pub train: RegressionDataset,
    /// Normalized test part
    pub test: RegressionDataset,
    /// Scaling learned on the training part
    pub normalizer: Normalizer,
    /// Fitted model
    pub fit: OlsFit,
    /// Predictions for the training rows
    pub train_predictions: Vec<Prediction>,
    /// Predictions for the test rows
    pub test_predictions: Vec<Prediction>,
    /// Accuracy on the training rows
    pub train_metrics: Metrics,
    /// Accuracy on the test rows
    pub test_metrics: Metrics,
    /// Panel rows dropped for missing values
    pub dropped_rows: usize,
}

/// A partition that could not be fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPartition {
    /// Partition key
    pub partition: PartitionKey,
    /// Why it was skipped
    pub reason: String,
}

/// Independently fitted models for every partition of a level.
#[derive(Debug, Clone)]
pub struct PartitionedModel {
    /// Geographic level
    pub level: Level,
    /// Period resolution of the panel
    pub resolution: Resolution,
    /// What was fitted
    pub spec: ModelSpec,
    /// Fitted partitions in report order
    pub fits: BTreeMap<PartitionKey, PartitionFit>,
    /// Partitions without enough data
    pub skipped: Vec<SkippedPartition>,
}

impl PartitionedModel {
    /// Fit every partition of the panel's level.
    ///
    /// Partitions whose data cannot support a fit (too few complete rows,
    /// collinear predictors) are recorded in `skipped`; configuration
    /// errors such as a missing column abort the whole run.
    pub fn fit(panel: &Panel, spec: &ModelSpec) -> Result<Self> {
        spec.validate()?;

        let mut fits = BTreeMap::new();
        let mut skipped = Vec::new();

        for partition in panel.level.partitions() {
            match fit_partition(panel, partition, spec) {
                Ok(fit) => {
                    debug!(
                        %partition,
                        train_rows = fit.train.len(),
                        test_rows = fit.test.len(),
                        test_rmse = fit.test_metrics.rmse,
                        "fitted partition"
                    );
                    fits.insert(partition, fit);
                }
                Err(e) if e.is_data_shortage() => {
                    warn!(%partition, reason = %e, "skipping partition");
                    skipped.push(SkippedPartition {
                        partition,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            level = %panel.level,
            fitted = fits.len(),
            skipped = skipped.len(),
            "fitted partitioned model"
        );

        Ok(Self {
            level: panel.level,
            resolution: panel.resolution,
            spec: spec.clone(),
            fits,
            skipped,
        })
    }

    /// Fitted partition by key.
    pub fn get(&self, partition: &PartitionKey) -> Option<&PartitionFit> {
        self.fits.get(partition)
    }

    /// Number of fitted partitions.
    pub fn len(&self) -> usize {
        self.fits.len()
    }

    /// Whether no partition could be fitted.
    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }
}

/// Build, split, normalize, fit and evaluate one partition.
pub fn fit_partition(
    panel: &Panel,
    partition: PartitionKey,
    spec: &ModelSpec,
) -> Result<PartitionFit> {
    let dataset =
        RegressionDataset::from_panel(panel, partition, &spec.response, &spec.predictors)?;
    let (train, test) = split(&dataset, spec.train_fraction, spec.split)?;

    let normalizer = Normalizer::fit(&train)?;
    for name in normalizer.dropped() {
        warn!(%partition, predictor = %name, "predictor constant in training rows");
    }
    let train = normalizer.transform(&train)?;
    let test = normalizer.transform(&test)?;

    let fit = fit_ols(
        &train.response,
        &train.predictors,
        &train.predictor_names,
        &spec.ols,
    )?;

    let train_predictions = fit.predict(&train.predictors, spec.interval)?;
    let test_predictions = fit.predict(&test.predictors, spec.interval)?;

    let estimates = |p: &[Prediction]| p.iter().map(|p| p.estimate).collect::<Vec<_>>();
    let train_metrics = metrics(&train.response, &estimates(&train_predictions))?;
    let test_metrics = metrics(&test.response, &estimates(&test_predictions))?;

    Ok(PartitionFit {
        partition,
        train,
        test,
        normalizer,
        fit,
        train_predictions,
        test_predictions,
        train_metrics,
        test_metrics,
        dropped_rows: dataset.dropped_rows,
    })
}
