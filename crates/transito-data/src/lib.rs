#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/onsv/transito/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod columns;
pub mod error;
pub mod prf;
pub mod reference;

pub use error::{DataError, Result};

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
