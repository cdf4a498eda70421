//! Configuration loading and management for cohortgate
//!
//! This crate owns the immutable [`Config`] and the [`ConfigLoader`] that
//! builds it from a JSON file and `COHORTGATE_*` environment overrides.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::ConfigLoader;
