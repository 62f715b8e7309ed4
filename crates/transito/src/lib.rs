#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use transito_data as data;
pub use transito_geo as geo;
pub use transito_model as model;
pub use transito_output as output;
pub use transito_panel as panel;

// Re-export common geography types
pub use geo::{Level, PartitionKey, Region, State};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports() {
        assert_eq!(Level::State.partitions().len(), State::all().len());
        assert_eq!(Region::Sul.states().len(), 3);
    }
}
