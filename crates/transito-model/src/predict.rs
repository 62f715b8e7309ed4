//! Prediction with confidence and prediction intervals.

use crate::error::{ModelError, Result};
use crate::linalg::quadratic_form;
use crate::ols::OlsFit;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interval attached to each prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    /// Point estimate only; bounds equal the estimate
    None,
    /// Interval for the mean response
    #[default]
    Confidence,
    /// Interval for a new observation
    Prediction,
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Confidence => write!(f, "confidence"),
            Self::Prediction => write!(f, "prediction"),
        }
    }
}

/// Point estimate with interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Point estimate
    pub estimate: f64,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

impl Prediction {
    /// Width of the interval.
    pub const fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl OlsFit {
    /// Predict the response for new predictor rows.
    ///
    /// `x` must have the columns the model was fitted on, in the same order
    /// and scaling. For the mean response the half width is
    /// `t · σ · √(x₀ᵀ(XᵀX)⁻¹x₀)`; a new observation adds `σ²` under the root.
    pub fn predict(&self, x: &Array2<f64>, interval: IntervalKind) -> Result<Vec<Prediction>> {
        if x.ncols() != self.n_predictors() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_predictors(),
                actual: x.ncols(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite { field: "x" });
        }

        let design = self.design(x);
        let beta = self.estimates();
        let t_crit = match interval {
            IntervalKind::None => 0.0,
            IntervalKind::Confidence | IntervalKind::Prediction => self.critical_value()?,
        };
        let sigma2 = self.residual_std_error.powi(2);

        let predictions = design
            .rows()
            .into_iter()
            .map(|row| {
                let estimate = row.dot(&beta);
                let leverage = quadratic_form(&self.xtx_inv, &row.to_owned()).max(0.0);
                let variance = match interval {
                    IntervalKind::None => 0.0,
                    IntervalKind::Confidence => sigma2 * leverage,
                    IntervalKind::Prediction => sigma2 * (1.0 + leverage),
                };
                let half_width = t_crit * variance.sqrt();
                Prediction {
                    estimate,
                    lower: estimate - half_width,
                    upper: estimate + half_width,
                }
            })
            .collect();

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ols::{OlsOptions, fit_ols};
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    fn fitted() -> OlsFit {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = vec![2.0, 4.0, 5.0, 4.0, 5.0];
        fit_ols(&y, &x, &["x".to_string()], &OlsOptions::default()).unwrap()
    }

    #[rstest]
    #[case(IntervalKind::None)]
    #[case(IntervalKind::Confidence)]
    #[case(IntervalKind::Prediction)]
    fn test_bounds_are_ordered_and_finite(#[case] interval: IntervalKind) {
        let fit = fitted();
        let x = array![[0.0], [3.0], [10.0]];
        for p in fit.predict(&x, interval).unwrap() {
            assert!(p.estimate.is_finite() && p.lower.is_finite() && p.upper.is_finite());
            assert!(p.lower <= p.estimate && p.estimate <= p.upper);
        }
    }

    #[test]
    fn test_point_estimate() {
        let fit = fitted();
        let p = fit.predict(&array![[3.0]], IntervalKind::None).unwrap();
        assert_relative_eq!(p[0].estimate, 4.0, epsilon = 1e-12);
        assert_relative_eq!(p[0].width(), 0.0);
    }

    #[test]
    fn test_confidence_interval_at_mean() {
        // at x̄ the leverage is 1/n
        let fit = fitted();
        let p = fit
            .predict(&array![[3.0]], IntervalKind::Confidence)
            .unwrap();
        let t = fit.critical_value().unwrap();
        let expected = t * (0.8_f64 / 5.0).sqrt();
        assert_relative_eq!(p[0].upper - p[0].estimate, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_prediction_wider_than_confidence() {
        let fit = fitted();
        let x = array![[1.0], [6.0]];
        let conf = fit.predict(&x, IntervalKind::Confidence).unwrap();
        let pred = fit.predict(&x, IntervalKind::Prediction).unwrap();
        for (c, p) in conf.iter().zip(&pred) {
            assert!(p.width() > c.width());
        }
        // intervals widen away from the mean
        assert!(conf[1].width() > conf[0].width());
    }

    #[test]
    fn test_wrong_width() {
        let fit = fitted();
        assert!(matches!(
            fit.predict(&array![[1.0, 2.0]], IntervalKind::None),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }
}
