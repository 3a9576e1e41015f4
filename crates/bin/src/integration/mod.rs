//! Glue between the data, metrics and output crates.
//!
//! The binary resolves the cache location, fetches one [`data_pipeline::Dataset`]
//! per analysis and turns it into a dashboard section by section.

pub(crate) mod cache_manager;
pub(crate) mod dashboard_builder;
pub(crate) mod data_pipeline;
