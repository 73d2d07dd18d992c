// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable overriding `[run].project_root`.
pub const PROJECT_ROOT_ENV: &str = "CRONRUN_PROJECT_ROOT";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, apply environment overrides and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let mut raw_config = load_from_path(&path)?;
    apply_env_overrides(&mut raw_config, |key| std::env::var(key).ok());
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config the way the binary does when invoked by cron.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used if present; otherwise the
///   built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        return load_and_validate(&default_path);
    }

    debug!(path = %default_path.display(), "no config file found; using built-in defaults");
    let mut raw_config = RawConfigFile::default();
    apply_env_overrides(&mut raw_config, |key| std::env::var(key).ok());
    ConfigFile::try_from(raw_config)
}

/// Apply environment overrides to a raw config.
///
/// `lookup` abstracts `std::env::var` so callers (and tests) can supply their
/// own environment.
pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = lookup(PROJECT_ROOT_ENV).filter(|s| !s.trim().is_empty()) {
        debug!(project_root = %root, "project root overridden from environment");
        raw.run.project_root = root;
    }
}

/// `Cronrun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Cronrun.toml")
}
