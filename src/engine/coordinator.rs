// src/engine/coordinator.rs

//! Run Coordinator: lock → service up → job → service down → unlock.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::engine::attempt::{RunAttempt, Stage, StageOutcome};
use crate::exec::JobRunner;
use crate::lock::{Acquisition, LockFile};
use crate::service::ServiceController;
use crate::types::{Readiness, DEFAULT_SENTINEL_EXIT_CODE, INTERRUPTED_EXIT_CODE};

/// Knobs the coordinator needs beyond its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Upper bound for `await_ready`.
    pub ready_timeout: Duration,
    /// Exit code when the job never ran.
    pub sentinel_exit_code: i32,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(60),
            sentinel_exit_code: DEFAULT_SENTINEL_EXIT_CODE,
        }
    }
}

/// Sequences one Run Attempt over a lock, a backing service and a job.
///
/// Cleanup (`stop` then `release`) runs exactly once on every path that
/// acquired the lock: job failure, service failure, readiness timeout and
/// interruption alike. Paths that never acquired the lock perform no cleanup
/// and leave the Lock Record untouched.
pub struct Coordinator<S: ServiceController, J: JobRunner> {
    lock: LockFile,
    service: S,
    job: J,
    options: CoordinatorOptions,
}

impl<S: ServiceController, J: JobRunner> std::fmt::Debug for Coordinator<S, J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("lock", &self.lock)
            .field("service", &self.service.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ServiceController, J: JobRunner> Coordinator<S, J> {
    pub fn new(lock: LockFile, service: S, job: J, options: CoordinatorOptions) -> Self {
        Self {
            lock,
            service,
            job,
            options,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn lock(&self) -> &LockFile {
        &self.lock
    }

    /// Execute one Run Attempt.
    ///
    /// `shutdown` resolving while the lock is held abandons the current stage
    /// (dropping a running job kills it) and moves straight to cleanup.
    pub async fn run<F>(&mut self, shutdown: F) -> RunAttempt
    where
        F: Future<Output = ()>,
    {
        let mut attempt = RunAttempt::new();
        let sentinel = self.options.sentinel_exit_code;

        let guard = match self.lock.try_acquire() {
            Ok(Acquisition::Acquired(guard)) => guard,
            Ok(Acquisition::HeldByLivePeer(holder)) => {
                error!(
                    lock = %self.lock.path().display(),
                    holder,
                    "another run is still active; aborting"
                );
                attempt.record(StageOutcome::LockContended { holder });
                attempt.finish(sentinel);
                return attempt;
            }
            Err(e) => {
                error!(error = %e, "cannot use lock file; aborting");
                attempt.record(StageOutcome::LockFailed {
                    error: e.to_string(),
                });
                attempt.finish(sentinel);
                return attempt;
            }
        };
        attempt.record(StageOutcome::LockAcquired);
        attempt.enter(Stage::LockAcquired);

        let finished = {
            let stages = run_held_stages(
                &mut self.service,
                &mut self.job,
                &self.options,
                &mut attempt,
            );
            tokio::select! {
                code = stages => Some(code),
                () = shutdown => None,
            }
        };

        let exit_code = match finished {
            Some(code) => code,
            None => {
                warn!(stage = %attempt.stage(), "interrupted; skipping to cleanup");
                attempt.record(StageOutcome::Interrupted);
                INTERRUPTED_EXIT_CODE
            }
        };

        attempt.enter(Stage::Cleanup);

        match self.service.stop().await {
            Ok(()) => attempt.record(StageOutcome::DependencyStopped),
            Err(e) => {
                error!(service = %self.service.name(), error = %e, "failed to stop backing service");
                attempt.record(StageOutcome::DependencyStopFailed {
                    error: e.to_string(),
                });
            }
        }

        match guard.release() {
            Ok(()) => attempt.record(StageOutcome::LockReleased),
            Err(e) => {
                error!(error = %e, "failed to release lock");
                attempt.record(StageOutcome::LockReleaseFailed {
                    error: e.to_string(),
                });
            }
        }

        attempt.finish(exit_code);
        attempt
    }
}

/// Everything between acquiring and releasing the lock, minus cleanup.
/// Returns the exit code the attempt should report.
async fn run_held_stages<S, J>(
    service: &mut S,
    job: &mut J,
    options: &CoordinatorOptions,
    attempt: &mut RunAttempt,
) -> i32
where
    S: ServiceController,
    J: JobRunner,
{
    let sentinel = options.sentinel_exit_code;

    if let Err(e) = service.start().await {
        error!(service = %service.name(), error = %e, "backing service failed to start");
        attempt.record(StageOutcome::DependencyStartFailed {
            error: e.to_string(),
        });
        return sentinel;
    }

    match service.await_ready(options.ready_timeout).await {
        Readiness::Ready => {
            attempt.record(StageOutcome::DependencyReady);
            attempt.enter(Stage::DependencyReady);
        }
        Readiness::TimedOut => {
            error!(
                service = %service.name(),
                timeout = ?options.ready_timeout,
                "backing service not ready in time; job will not run"
            );
            attempt.record(StageOutcome::DependencyTimedOut);
            return sentinel;
        }
    }

    attempt.enter(Stage::JobRunning);
    match job.run().await {
        Ok(outcome) if outcome.timed_out => {
            attempt.record(StageOutcome::JobTimedOut {
                exit_code: outcome.exit_code,
            });
            outcome.exit_code
        }
        Ok(outcome) => {
            if outcome.success() {
                info!("job succeeded");
            } else {
                error!(exit_code = outcome.exit_code, "job failed");
            }
            attempt.record(StageOutcome::JobExited {
                exit_code: outcome.exit_code,
            });
            outcome.exit_code
        }
        Err(e) => {
            error!(error = %e, "job could not be run");
            attempt.record(StageOutcome::JobFailed {
                error: e.to_string(),
            });
            sentinel
        }
    }
}
