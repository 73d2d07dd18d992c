// src/logging.rs

//! Logging setup for `cronrun` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CRONRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Every line goes to STDERR and, when configured, is appended to the
//! durable log file (`[run].log_file`) without ANSI colours.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// If the log file cannot be opened the subscriber is still installed with
/// the stderr layer only, and a warning is emitted through it.
pub fn init_logging(cli_level: Option<LogLevel>, log_file: Option<&Path>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("CRONRUN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let (file_writer, file_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (Some(Mutex::new(file)), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if let (Some(path), Some(err)) = (log_file, file_error) {
        warn!(path = %path.display(), error = %err, "cannot open log file; logging to stderr only");
    }

    Ok(())
}

/// Open the log file for appending, creating it when missing.
///
/// Only the file's own parent directory is created, never its ancestors, so
/// a mistyped path cannot conjure up a project root.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        match fs::create_dir(parent) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
