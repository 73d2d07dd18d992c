// src/types.rs

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the pluggable backends (service controller, job
/// runner, readiness probe).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Exit code used when the job never had a chance to run.
pub const DEFAULT_SENTINEL_EXIT_CODE: i32 = 1;

/// Exit code reported when the job exceeded `[job].timeout` and was killed.
pub const JOB_TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when a run was interrupted by SIGINT / SIGTERM.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Lifecycle of the backing service as seen by the dependency controller.
///
/// Readiness is polled, never pushed: `Starting -> Ready` only happens inside
/// `await_ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyState {
    #[default]
    Down,
    Starting,
    Ready,
}

/// Result of waiting for the backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}
