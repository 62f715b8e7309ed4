//! Per-level model summaries.
//!
//! A [`ModelSummary`] condenses a [`PartitionedModel`] into one row per
//! fitted partition, for terminal output and the report's summary table.

use serde::{Deserialize, Serialize};
use std::fmt;
use transito_geo::Level;
use transito_model::{PartitionFit, PartitionedModel};
use transito_panel::Resolution;

/// Accuracy and fit statistics of one partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionSummary {
    /// Partition label.
    pub partition: String,

    /// Training rows.
    pub train_rows: usize,

    /// Test rows.
    pub test_rows: usize,

    /// In-sample R² of the OLS fit.
    pub r_squared: f64,

    /// Adjusted R² of the OLS fit.
    pub adj_r_squared: f64,

    /// Test RMSE.
    pub test_rmse: f64,

    /// Test MAE.
    pub test_mae: f64,

    /// Test squared correlation.
    pub test_rsq: f64,

    /// Predictors dropped for having no variance in the training rows.
    pub dropped_predictors: Vec<String>,
}

impl PartitionSummary {
    /// Summarize one fitted partition.
    pub fn from_fit(fit: &PartitionFit) -> Self {
        Self {
            partition: fit.partition.label().to_string(),
            train_rows: fit.train.len(),
            test_rows: fit.test.len(),
            r_squared: fit.fit.r_squared,
            adj_r_squared: fit.fit.adj_r_squared,
            test_rmse: fit.test_metrics.rmse,
            test_mae: fit.test_metrics.mae,
            test_rsq: fit.test_metrics.rsq,
            dropped_predictors: fit.normalizer.dropped().to_vec(),
        }
    }
}

impl fmt::Display for PartitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: R² {:.3}, test RMSE {:.2} ({} train / {} test)",
            self.partition, self.r_squared, self.test_rmse, self.train_rows, self.test_rows
        )
    }
}

/// Summary of every partition of one level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSummary {
    /// Geographic level.
    pub level: Level,

    /// Period resolution.
    pub resolution: Resolution,

    /// Response variable.
    pub response: String,

    /// Fitted partitions in report order.
    pub partitions: Vec<PartitionSummary>,

    /// Labels and reasons of skipped partitions.
    pub skipped: Vec<(String, String)>,
}

impl ModelSummary {
    /// Summarize a partitioned model.
    pub fn from_model(model: &PartitionedModel) -> Self {
        Self {
            level: model.level,
            resolution: model.resolution,
            response: model.spec.response.clone(),
            partitions: model
                .fits
                .values()
                .map(PartitionSummary::from_fit)
                .collect(),
            skipped: model
                .skipped
                .iter()
                .map(|s| (s.partition.label().to_string(), s.reason.clone()))
                .collect(),
        }
    }

    /// Mean test RMSE across partitions, if any were fitted.
    pub fn mean_test_rmse(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .partitions
            .iter()
            .map(|p| p.test_rmse)
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Format the summary as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nModel Summary: {} ({}), response {}\n",
            self.level, self.resolution, self.response
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<12} {:>7} {:>7} {:>9} {:>9} {:>12} {:>12}\n",
            "Partition", "Train", "Test", "R²", "Adj. R²", "Test RMSE", "Test MAE"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for p in &self.partitions {
            output.push_str(&format!(
                "{:<12} {:>7} {:>7} {:>9.4} {:>9.4} {:>12.2} {:>12.2}\n",
                p.partition,
                p.train_rows,
                p.test_rows,
                p.r_squared,
                p.adj_r_squared,
                p.test_rmse,
                p.test_mae
            ));
        }

        if let Some(rmse) = self.mean_test_rmse() {
            output.push_str(&format!("Mean test RMSE: {rmse:.2}\n"));
        }

        if !self.skipped.is_empty() {
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!("Skipped partitions: {}\n", self.skipped.len()));
            for (label, reason) in &self.skipped {
                output.push_str(&format!("  {label}: {reason}\n"));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format the summary as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("## {} ({})\n\n", self.level, self.resolution));
        output.push_str("| Partition | Train | Test | R² | Test RMSE | Test MAE |\n");
        output.push_str("|-----------|------:|-----:|---:|----------:|---------:|\n");
        for p in &self.partitions {
            output.push_str(&format!(
                "| {} | {} | {} | {:.4} | {:.2} | {:.2} |\n",
                p.partition, p.train_rows, p.test_rows, p.r_squared, p.test_rmse, p.test_mae
            ));
        }
        if !self.skipped.is_empty() {
            output.push_str(&format!(
                "\n*Skipped:* {}\n",
                self.skipped
                    .iter()
                    .map(|(label, _)| label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        output
    }
}
