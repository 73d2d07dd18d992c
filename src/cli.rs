// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! cron invokes `cronrun` without arguments; every flag is optional.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cronrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronrun",
    version,
    about = "Run the data pipeline job once, guarded by a lock file and its backing service.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Cronrun.toml` in the current directory is used when it
    /// exists, otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the run plan, execute nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
