#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod linalg;
pub mod metrics;
pub mod ols;
pub mod partitioned;
pub mod predict;

pub use error::{ModelError, Result};
pub use metrics::{Metrics, metrics};
pub use ols::{Coefficient, INTERCEPT, OlsFit, OlsOptions, fit_ols};
pub use partitioned::{ModelSpec, PartitionFit, PartitionedModel, SkippedPartition, fit_partition};
pub use predict::{IntervalKind, Prediction};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
