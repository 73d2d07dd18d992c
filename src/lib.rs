// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod service;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile, ProbeConfig};
use crate::engine::{Coordinator, CoordinatorOptions};
use crate::errors::CronrunError;
use crate::exec::ShellJob;
use crate::lock::LockFile;
use crate::service::controller_from_config;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading (file, defaults, environment overrides)
/// - moving into the project root (an unusable root is fatal)
/// - logging to stderr and the durable log file
/// - lock manager / dependency controller / job runner
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = load_or_default(args.config.as_deref().map(Path::new))?;
    anchor_paths(&mut cfg)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    // Nothing may be created on disk before the project root is known to be
    // usable; the log file normally lives inside it.
    let sentinel = cfg.run.sentinel_exit_code;
    let cwd = match enter_project_root(&cfg.run.project_root) {
        Ok(cwd) => cwd,
        Err(e) => {
            logging::init_logging(args.log_level, None)?;
            error!(error = %e, "cannot use project root; aborting");
            return Ok(sentinel);
        }
    };

    logging::init_logging(args.log_level, Some(&cfg.run.log_file))?;

    info!(
        pid = std::process::id(),
        project_root = %cwd.display(),
        "cronrun starting"
    );

    let options = CoordinatorOptions {
        ready_timeout: cfg
            .service
            .as_ref()
            .map(|s| s.ready_timeout)
            .unwrap_or(CoordinatorOptions::default().ready_timeout),
        sentinel_exit_code: sentinel,
    };

    let mut coordinator = Coordinator::new(
        LockFile::new(&cfg.run.lock_file),
        controller_from_config(cfg.service.as_ref()),
        ShellJob::new(cfg.job.cmd.clone(), cfg.job.timeout),
        options,
    );

    let attempt = coordinator.run(shutdown_signal()).await;
    Ok(attempt.exit_code().unwrap_or(sentinel))
}

/// Make the lock and log paths absolute before the working directory moves.
fn anchor_paths(cfg: &mut ConfigFile) -> Result<()> {
    cfg.run.lock_file = std::path::absolute(&cfg.run.lock_file)
        .with_context(|| format!("resolving lock file {:?}", cfg.run.lock_file))?;
    cfg.run.log_file = std::path::absolute(&cfg.run.log_file)
        .with_context(|| format!("resolving log file {:?}", cfg.run.log_file))?;
    Ok(())
}

/// Change into the project root so the job inherits it as working directory.
fn enter_project_root(root: &Path) -> errors::Result<PathBuf> {
    if !root.is_dir() {
        return Err(CronrunError::EnvironmentError(format!(
            "project root {:?} is not a directory",
            root
        )));
    }
    std::env::set_current_dir(root).map_err(|e| {
        CronrunError::EnvironmentError(format!("cannot change directory to {:?}: {}", root, e))
    })?;
    Ok(std::env::current_dir()?)
}

/// Resolves on the first SIGINT or SIGTERM.
///
/// If the listeners cannot be installed the run continues without interrupt
/// handling.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
                return;
            }
        };

        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    terminate.recv().await;
                }
            }
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Simple dry-run output: print the resolved plan.
fn print_dry_run(cfg: &ConfigFile) {
    println!("cronrun dry-run");
    println!("  run.project_root = {}", cfg.run.project_root.display());
    println!("  run.lock_file = {}", cfg.run.lock_file.display());
    println!("  run.log_file = {}", cfg.run.log_file.display());
    println!("  run.sentinel_exit_code = {}", cfg.run.sentinel_exit_code);
    println!();

    match cfg.service {
        Some(ref service) => {
            println!("service: {}", service.name);
            println!("      up: {}", service.up);
            println!("      down: {}", service.down);
            match service.probe {
                ProbeConfig::Tcp {
                    ref address,
                    connect_timeout,
                } => println!("      probe: tcp {address} (connect timeout {connect_timeout:?})"),
                ProbeConfig::Command { ref cmd } => println!("      probe: command {cmd}"),
                ProbeConfig::Delay { grace } => println!("      probe: fixed delay {grace:?}"),
            }
            println!("      ready_timeout: {:?}", service.ready_timeout);
            println!(
                "      backoff: {:?} .. {:?}",
                service.initial_backoff, service.max_backoff
            );
        }
        None => println!("service: none"),
    }
    println!();

    println!("job:");
    println!("      cmd: {}", cfg.job.cmd);
    if let Some(timeout) = cfg.job.timeout {
        println!("      timeout: {timeout:?}");
    }

    debug!("dry-run complete (no execution)");
}
