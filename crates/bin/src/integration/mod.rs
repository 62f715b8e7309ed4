//! Pipeline plumbing behind the command-line interface.
//!
//! Configuration loading, the accident cache location, and the data pipeline
//! that turns configured sources into panels and fitted models.

pub(crate) mod cache_manager;
pub(crate) mod config;
pub(crate) mod data_pipeline;
pub(crate) mod error;
