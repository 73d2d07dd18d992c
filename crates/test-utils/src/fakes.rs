use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cronrun::errors::{CronrunError, Result};
use cronrun::exec::{JobOutcome, JobRunner};
use cronrun::service::{ReadinessProbe, ServiceController};
use cronrun::types::{BoxFuture, DependencyState, Readiness};

/// Shared, ordered record of collaborator calls, e.g.
/// `["start", "await_ready", "job", "stop"]`.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }
}

/// How a [`FakeService`] answers `await_ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeReadiness {
    /// Ready immediately.
    Immediate,
    /// Ready after this long (in tokio time).
    After(Duration),
    /// Never ready; the full timeout elapses.
    Never,
}

/// A service controller that only records calls.
#[derive(Debug)]
pub struct FakeService {
    log: CallLog,
    readiness: FakeReadiness,
    fail_start: bool,
    fail_stop: bool,
    state: DependencyState,
}

impl FakeService {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            readiness: FakeReadiness::Immediate,
            fail_start: false,
            fail_stop: false,
            state: DependencyState::Down,
        }
    }

    pub fn readiness(mut self, readiness: FakeReadiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn fail_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl ServiceController for FakeService {
    fn name(&self) -> &str {
        "fake"
    }

    fn state(&self) -> DependencyState {
        self.state
    }

    fn start(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.push("start");
            self.state = DependencyState::Starting;
            if self.fail_start {
                return Err(CronrunError::ServiceError {
                    service: "fake".to_string(),
                    message: "bring-up failed".to_string(),
                });
            }
            Ok(())
        })
    }

    fn await_ready(&mut self, timeout: Duration) -> BoxFuture<'_, Readiness> {
        Box::pin(async move {
            self.log.push("await_ready");
            let wait = match self.readiness {
                FakeReadiness::Immediate => Some(Duration::ZERO),
                FakeReadiness::After(d) if d <= timeout => Some(d),
                FakeReadiness::After(_) | FakeReadiness::Never => None,
            };
            match wait {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    self.state = DependencyState::Ready;
                    Readiness::Ready
                }
                None => {
                    tokio::time::sleep(timeout).await;
                    Readiness::TimedOut
                }
            }
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.push("stop");
            self.state = DependencyState::Down;
            if self.fail_stop {
                return Err(CronrunError::ServiceError {
                    service: "fake".to_string(),
                    message: "tear-down failed".to_string(),
                });
            }
            Ok(())
        })
    }
}

/// What a [`FakeJob`] does when run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeJobBehaviour {
    Exit(i32),
    /// Cannot be started at all.
    SpawnError,
    /// Never finishes (for interrupt tests).
    Hang,
}

#[derive(Debug)]
pub struct FakeJob {
    log: CallLog,
    behaviour: FakeJobBehaviour,
}

impl FakeJob {
    pub fn new(log: CallLog, behaviour: FakeJobBehaviour) -> Self {
        Self { log, behaviour }
    }
}

impl JobRunner for FakeJob {
    fn run(&mut self) -> BoxFuture<'_, Result<JobOutcome>> {
        Box::pin(async move {
            self.log.push("job");
            match self.behaviour {
                FakeJobBehaviour::Exit(code) => Ok(JobOutcome::exited(code)),
                FakeJobBehaviour::SpawnError => {
                    Err(CronrunError::JobError("spawning 'fake': not found".to_string()))
                }
                FakeJobBehaviour::Hang => std::future::pending().await,
            }
        })
    }
}

/// A probe that replays scripted answers, then keeps answering `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    answers: VecDeque<bool>,
    fallback: bool,
    checks: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

impl ScriptedProbe {
    pub fn new(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback,
            checks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the instants at which `check` was called.
    pub fn checks(&self) -> Arc<Mutex<Vec<tokio::time::Instant>>> {
        Arc::clone(&self.checks)
    }
}

impl ReadinessProbe for ScriptedProbe {
    fn check(&mut self) -> BoxFuture<'_, bool> {
        self.checks.lock().unwrap().push(tokio::time::Instant::now());
        let answer = self.answers.pop_front().unwrap_or(self.fallback);
        Box::pin(async move { answer })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// A probe whose single check never completes.
#[derive(Debug, Clone, Default)]
pub struct HangingProbe;

impl ReadinessProbe for HangingProbe {
    fn check(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(std::future::pending())
    }

    fn describe(&self) -> String {
        "hanging".to_string()
    }
}
