// src/config/mod.rs

//! Configuration loading and validation for cronrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply environment overrides (`loader.rs`).
//! - Validate it into typed settings: paths, durations, probe (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{apply_env_overrides, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, JobConfig, JobSection, ProbeConfig, ProbeSection, RawConfigFile, RunConfig,
    RunSection, ServiceConfig, ServiceSection,
};
