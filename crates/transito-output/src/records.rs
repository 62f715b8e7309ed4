//! Flat records extracted from partitioned models.

use serde::{Deserialize, Serialize};
use std::fmt;
use transito_geo::Level;
use transito_model::{PartitionFit, PartitionedModel, Prediction};
use transito_panel::RegressionDataset;

/// Which part of the dataset a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSplit {
    /// Rows the model was fitted on
    Train,
    /// Held-out rows
    Test,
}

impl fmt::Display for SampleSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// One observed value with its prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Geographic level
    pub level: Level,
    /// Partition label
    pub partition: String,
    /// Period label
    pub period: String,
    /// Sortable period number
    pub ordinal: i32,
    /// Train or test
    pub split: SampleSplit,
    /// Observed response
    pub observed: f64,
    /// Point estimate
    pub estimate: f64,
    /// Lower interval bound
    pub lower: f64,
    /// Upper interval bound
    pub upper: f64,
}

/// Accuracy of one partition on one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Geographic level
    pub level: Level,
    /// Partition label
    pub partition: String,
    /// Train or test
    pub split: SampleSplit,
    /// Observations
    pub n: usize,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Squared correlation
    pub rsq: f64,
    /// Traditional R²
    pub rsq_trad: f64,
}

/// One coefficient of one partition's model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRecord {
    /// Geographic level
    pub level: Level,
    /// Partition label
    pub partition: String,
    /// Term name
    pub term: String,
    /// Estimate on normalized predictors
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t statistic
    pub t_value: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Lower confidence bound
    pub ci_lower: f64,
    /// Upper confidence bound
    pub ci_upper: f64,
}

fn push_predictions(
    out: &mut Vec<PredictionRecord>,
    level: Level,
    dataset: &RegressionDataset,
    predictions: &[Prediction],
    split: SampleSplit,
) {
    for ((period, observed), p) in dataset
        .periods
        .iter()
        .zip(&dataset.response)
        .zip(predictions)
    {
        out.push(PredictionRecord {
            level,
            partition: dataset.partition.label().to_string(),
            period: period.label(),
            ordinal: period.ordinal(),
            split,
            observed: *observed,
            estimate: p.estimate,
            lower: p.lower,
            upper: p.upper,
        });
    }
}

/// Prediction rows of one partition, sorted by period.
pub fn partition_predictions(level: Level, fit: &PartitionFit) -> Vec<PredictionRecord> {
    let mut out = Vec::with_capacity(fit.train.len() + fit.test.len());
    push_predictions(
        &mut out,
        level,
        &fit.train,
        &fit.train_predictions,
        SampleSplit::Train,
    );
    push_predictions(
        &mut out,
        level,
        &fit.test,
        &fit.test_predictions,
        SampleSplit::Test,
    );
    out.sort_by_key(|r| r.ordinal);
    out
}

/// Prediction rows of every fitted partition.
pub fn prediction_records(model: &PartitionedModel) -> Vec<PredictionRecord> {
    model
        .fits
        .values()
        .flat_map(|fit| partition_predictions(model.level, fit))
        .collect()
}

/// Train and test metrics of every fitted partition.
pub fn metrics_records(model: &PartitionedModel) -> Vec<MetricsRecord> {
    let mut out = Vec::with_capacity(model.fits.len() * 2);
    for fit in model.fits.values() {
        for (split, m) in [
            (SampleSplit::Train, &fit.train_metrics),
            (SampleSplit::Test, &fit.test_metrics),
        ] {
            out.push(MetricsRecord {
                level: model.level,
                partition: fit.partition.label().to_string(),
                split,
                n: m.n,
                rmse: m.rmse,
                mae: m.mae,
                rsq: m.rsq,
                rsq_trad: m.rsq_trad,
            });
        }
    }
    out
}

/// Coefficients of every fitted partition.
pub fn coefficient_records(model: &PartitionedModel) -> Vec<CoefficientRecord> {
    model
        .fits
        .values()
        .flat_map(|fit| {
            fit.fit.coefficients.iter().map(|c| CoefficientRecord {
                level: model.level,
                partition: fit.partition.label().to_string(),
                term: c.term.clone(),
                estimate: c.estimate,
                std_error: c.std_error,
                t_value: c.t_value,
                p_value: c.p_value,
                ci_lower: c.ci_lower,
                ci_upper: c.ci_upper,
            })
        })
        .collect()
}
