// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CronrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    EnvironmentError(String),

    #[error("Lock error at {path:?}: {source}")]
    LockError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Service '{service}' error: {message}")]
    ServiceError { service: String, message: String },

    #[error("Job error: {0}")]
    JobError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CronrunError {
    pub(crate) fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CronrunError::LockError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        CronrunError::ServiceError {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CronrunError>;
