#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod html;
pub mod records;
pub mod report;
pub mod summary;

pub use chart::{ChartPoint, LineChart};
pub use export::{ExportError, ExportFormat, Exporter};
pub use records::{
    CoefficientRecord, MetricsRecord, PredictionRecord, SampleSplit, coefficient_records,
    metrics_records, partition_predictions, prediction_records,
};
pub use report::{Block, Report, ReportBuilder, ReportError, Section, Table};
pub use summary::{ModelSummary, PartitionSummary};
