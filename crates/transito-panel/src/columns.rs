//! Column names used in panel frames.
//!
//! Source columns are shared with `transito-data`; the panel adds the
//! period and partition keys.

pub use transito_data::columns::*;

/// Sortable period number, see [`crate::Period::ordinal`]
pub const ORDINAL: &str = "ordinal";

/// Period label, see [`crate::Period::label`]
pub const PERIOD: &str = "period";

/// Partition label, see [`transito_geo::PartitionKey::label`]
pub const PARTITION: &str = "partition";

/// Key columns of an aggregated panel frame.
pub const PANEL_KEYS: [&str; 3] = [ORDINAL, PERIOD, PARTITION];
