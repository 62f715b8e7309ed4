#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod columns;
pub mod dataset;
pub mod error;
pub mod join;
pub mod normalize;
pub mod panel;
pub mod period;
pub mod registry;
pub mod split;

pub use aggregate::{aggregate_spatial, aggregate_temporal};
pub use dataset::RegressionDataset;
pub use error::{PanelError, Result};
pub use join::{JoinReport, JoinStrategy, SourceFrame, SourceRows, join_sources};
pub use normalize::{ColumnScale, Normalizer};
pub use panel::{Panel, build_panel};
pub use period::{Period, Resolution};
pub use registry::{
    DataSource, VariableInfo, VariableKind, available_variables, get_variable_info,
    variables_by_source,
};
pub use split::{DEFAULT_TRAIN_FRACTION, SplitStrategy, split, train_size};

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
