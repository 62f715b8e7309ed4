//! Regression metrics.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Accuracy of a set of predictions.
///
/// Undefined statistics (R² of a constant series) are NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Squared Pearson correlation between truth and estimate
    pub rsq: f64,
    /// Traditional R²: `1 - SSres / SStot`
    pub rsq_trad: f64,
    /// Number of observations
    pub n: usize,
}

/// Compute RMSE, MAE and both R² flavours.
pub fn metrics(truth: &[f64], estimate: &[f64]) -> Result<Metrics> {
    if truth.is_empty() {
        return Err(ModelError::EmptyInput { field: "truth" });
    }
    if truth.len() != estimate.len() {
        return Err(ModelError::DimensionMismatch {
            expected: truth.len(),
            actual: estimate.len(),
        });
    }

    let n = truth.len();
    let nf = n as f64;

    let mut ss_res = 0.0;
    let mut abs_sum = 0.0;
    for (t, e) in truth.iter().zip(estimate) {
        let err = t - e;
        ss_res += err * err;
        abs_sum += err.abs();
    }

    let mean_t = truth.iter().sum::<f64>() / nf;
    let mean_e = estimate.iter().sum::<f64>() / nf;

    let mut ss_tot = 0.0;
    let mut ss_est = 0.0;
    let mut cross = 0.0;
    for (t, e) in truth.iter().zip(estimate) {
        let dt = t - mean_t;
        let de = e - mean_e;
        ss_tot += dt * dt;
        ss_est += de * de;
        cross += dt * de;
    }

    let rsq = if ss_tot > 0.0 && ss_est > 0.0 {
        cross * cross / (ss_tot * ss_est)
    } else {
        f64::NAN
    };
    let rsq_trad = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        f64::NAN
    };

    Ok(Metrics {
        rmse: (ss_res / nf).sqrt(),
        mae: abs_sum / nf,
        rsq,
        rsq_trad,
        n,
    })
}
