//! Caching layer for parsed accident archives.

pub mod sqlite;

pub use sqlite::{AccidentCache, CacheStats, CachedYear};
