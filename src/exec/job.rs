// src/exec/job.rs

//! Job Runner: one synchronous invocation of the opaque pipeline job.

use std::process::Stdio;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::errors::{CronrunError, Result};
use crate::exec::group::{isolate, ProcessGroup};
use crate::exec::output::OutputForwarders;
use crate::exec::shell::{exit_code_of, shell_command};
use crate::types::{BoxFuture, JOB_TIMEOUT_EXIT_CODE};

/// What the job reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub exit_code: i32,
    /// The job hit `[job].timeout` and was killed.
    pub timed_out: bool,
}

impl JobOutcome {
    pub fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait abstracting how the pipeline job is executed.
///
/// Production code uses [`ShellJob`]; tests provide implementations that
/// return scripted outcomes without spawning processes.
pub trait JobRunner: Send {
    /// Run the job once. `Err` means it could not be started or awaited at
    /// all; a job that ran and failed is an `Ok` with a nonzero exit code.
    fn run(&mut self) -> BoxFuture<'_, Result<JobOutcome>>;
}

/// Runs the configured command through the platform shell.
///
/// The working directory is inherited; stdout/stderr are forwarded to the
/// log stream. The shell leads its own process group, so a timeout or an
/// abandoned run kills everything the job started. No retries.
#[derive(Debug, Clone)]
pub struct ShellJob {
    cmd: String,
    timeout: Option<Duration>,
}

impl ShellJob {
    pub fn new(cmd: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    async fn run_inner(&self) -> Result<JobOutcome> {
        info!(cmd = %self.cmd, "starting job process");

        let mut command = shell_command(&self.cmd);
        let mut child = isolate(&mut command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CronrunError::JobError(format!("spawning '{}': {}", self.cmd, e)))?;

        // Declared after `child` so an abandoned run kills the group before
        // the leader can be reaped.
        let mut group = ProcessGroup::of(&child);
        let output = OutputForwarders::attach(&mut child, "job");

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let outcome = match waited {
            Some(status) => {
                group.disarm();
                let status = status.map_err(|e| {
                    CronrunError::JobError(format!("waiting for '{}': {}", self.cmd, e))
                })?;
                JobOutcome::exited(exit_code_of(status))
            }
            None => {
                error!(
                    cmd = %self.cmd,
                    timeout = ?self.timeout,
                    "job exceeded its timeout; killing process"
                );
                if let Err(e) = group.kill() {
                    warn!(error = %e, "failed to kill timed-out job process group");
                }
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed-out job process");
                }
                JobOutcome {
                    exit_code: JOB_TIMEOUT_EXIT_CODE,
                    timed_out: true,
                }
            }
        };

        output.drain().await;

        info!(
            exit_code = outcome.exit_code,
            success = outcome.success(),
            "job process exited"
        );
        Ok(outcome)
    }
}

impl JobRunner for ShellJob {
    fn run(&mut self) -> BoxFuture<'_, Result<JobOutcome>> {
        Box::pin(self.run_inner())
    }
}
