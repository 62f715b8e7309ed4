#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod partition;
pub mod region;
pub mod state;

pub use partition::{GeoError, Level, NATIONAL_LABEL, PartitionKey};
pub use region::Region;
pub use state::State;
