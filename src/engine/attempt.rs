// src/engine/attempt.rs

//! In-memory record of one Run Attempt.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// Coordinator stages, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    LockAcquired,
    DependencyReady,
    JobRunning,
    Cleanup,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::LockAcquired => "lock_acquired",
            Stage::DependencyReady => "dependency_ready",
            Stage::JobRunning => "job_running",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened at a stage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    LockAcquired,
    LockContended { holder: u32 },
    LockFailed { error: String },
    DependencyStartFailed { error: String },
    DependencyReady,
    DependencyTimedOut,
    JobExited { exit_code: i32 },
    JobTimedOut { exit_code: i32 },
    JobFailed { error: String },
    Interrupted,
    DependencyStopped,
    DependencyStopFailed { error: String },
    LockReleased,
    LockReleaseFailed { error: String },
}

/// One end-to-end orchestration execution.
///
/// Outcomes are appended in the order stages executed; the final exit code
/// is set exactly once when the attempt reaches [`Stage::Done`].
#[derive(Debug, Clone)]
pub struct RunAttempt {
    started: Instant,
    stage: Stage,
    transitions: Vec<Stage>,
    outcomes: Vec<StageOutcome>,
    job_exit_code: Option<i32>,
    exit_code: Option<i32>,
}

impl RunAttempt {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stage: Stage::Idle,
            transitions: vec![Stage::Idle],
            outcomes: Vec::new(),
            job_exit_code: None,
            exit_code: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every stage entered so far, starting with `Idle`.
    pub fn transitions(&self) -> &[Stage] {
        &self.transitions
    }

    pub fn outcomes(&self) -> &[StageOutcome] {
        &self.outcomes
    }

    /// The job's exit code, if the job ran to an exit code.
    pub fn job_exit_code(&self) -> Option<i32> {
        self.job_exit_code
    }

    /// Final exit code; `None` until the attempt is done.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.transitions.contains(&stage)
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        info!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
        self.transitions.push(stage);
    }

    pub(crate) fn record(&mut self, outcome: StageOutcome) {
        if let StageOutcome::JobExited { exit_code } | StageOutcome::JobTimedOut { exit_code } =
            outcome
        {
            self.job_exit_code = Some(exit_code);
        }
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(&mut self, exit_code: i32) {
        self.exit_code = Some(exit_code);
        self.enter(Stage::Done);
        info!(
            exit_code,
            elapsed = ?self.elapsed(),
            outcomes = ?self.outcomes,
            "run attempt finished"
        );
    }
}

impl Default for RunAttempt {
    fn default() -> Self {
        Self::new()
    }
}
