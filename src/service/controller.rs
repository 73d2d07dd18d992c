// src/service/controller.rs

//! Dependency Controller: bring the backing service up, wait for it, tear it
//! down.

use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::errors::{CronrunError, Result};
use crate::exec::{exit_code_of, shell_command, OutputForwarders};
use crate::service::backoff::Backoff;
use crate::service::probe::{probe_from_config, ReadinessProbe};
use crate::service::wait::wait_until_ready;
use crate::types::{BoxFuture, DependencyState, Readiness};

/// Trait abstracting control of the backing service.
///
/// Production code uses [`CommandService`] (or [`NoService`] when nothing is
/// configured); tests provide implementations that count calls and script
/// readiness.
pub trait ServiceController: Send {
    /// Logical service name for log lines.
    fn name(&self) -> &str;

    fn state(&self) -> DependencyState;

    /// Request the service to come up. Safe to call when it already runs.
    fn start(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Block until the service is ready or `timeout` elapses.
    fn await_ready(&mut self, timeout: Duration) -> BoxFuture<'_, Readiness>;

    /// Tear the service down.
    fn stop(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Controls a service through bring-up / tear-down shell commands and a
/// readiness probe.
pub struct CommandService {
    name: String,
    up: String,
    down: String,
    probe: Box<dyn ReadinessProbe>,
    backoff: Backoff,
    state: DependencyState,
}

impl std::fmt::Debug for CommandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandService")
            .field("name", &self.name)
            .field("up", &self.up)
            .field("down", &self.down)
            .field("probe", &self.probe.describe())
            .field("backoff", &self.backoff)
            .field("state", &self.state)
            .finish()
    }
}

impl CommandService {
    pub fn new(
        name: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
        probe: Box<dyn ReadinessProbe>,
        backoff: Backoff,
    ) -> Self {
        Self {
            name: name.into(),
            up: up.into(),
            down: down.into(),
            probe,
            backoff,
            state: DependencyState::Down,
        }
    }

    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self::new(
            cfg.name.clone(),
            cfg.up.clone(),
            cfg.down.clone(),
            probe_from_config(&cfg.probe),
            Backoff::new(cfg.initial_backoff, cfg.max_backoff),
        )
    }
}

impl ServiceController for CommandService {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> DependencyState {
        self.state
    }

    fn start(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            info!(service = %self.name, "starting backing service");
            self.state = DependencyState::Starting;
            run_control(&self.name, "bring-up", &self.up).await
        })
    }

    fn await_ready(&mut self, timeout: Duration) -> BoxFuture<'_, Readiness> {
        Box::pin(async move {
            if matches!(self.state, DependencyState::Ready) {
                return Readiness::Ready;
            }
            info!(
                service = %self.name,
                probe = %self.probe.describe(),
                timeout = ?timeout,
                "waiting for backing service readiness"
            );
            let readiness = wait_until_ready(self.probe.as_mut(), timeout, &self.backoff).await;
            if readiness == Readiness::Ready {
                self.state = DependencyState::Ready;
            }
            readiness
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            info!(service = %self.name, "stopping backing service");
            let result = run_control(&self.name, "tear-down", &self.down).await;
            self.state = DependencyState::Down;
            result
        })
    }
}

/// Run one control command to completion, forwarding its output.
async fn run_control(service: &str, action: &str, cmd: &str) -> Result<()> {
    debug!(service, action, cmd, "running service control command");

    let mut child = shell_command(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CronrunError::service(service, format!("{action}: spawning '{cmd}': {e}")))?;

    let output = OutputForwarders::attach(&mut child, &format!("service:{service}"));
    let status = child.wait().await;
    output.drain().await;

    let status = status.map_err(|e| {
        CronrunError::service(service, format!("{action}: waiting for '{cmd}': {e}"))
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(CronrunError::service(
            service,
            format!("{action}: '{cmd}' exited with code {}", exit_code_of(status)),
        ))
    }
}

impl<T: ServiceController + ?Sized> ServiceController for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn state(&self) -> DependencyState {
        (**self).state()
    }

    fn start(&mut self) -> BoxFuture<'_, Result<()>> {
        (**self).start()
    }

    fn await_ready(&mut self, timeout: Duration) -> BoxFuture<'_, Readiness> {
        (**self).await_ready(timeout)
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        (**self).stop()
    }
}

/// Used when no `[service]` is configured: always ready, nothing to stop.
#[derive(Debug, Default)]
pub struct NoService {
    state: DependencyState,
}

impl ServiceController for NoService {
    fn name(&self) -> &str {
        "none"
    }

    fn state(&self) -> DependencyState {
        self.state
    }

    fn start(&mut self) -> BoxFuture<'_, Result<()>> {
        self.state = DependencyState::Starting;
        Box::pin(async { Ok(()) })
    }

    fn await_ready(&mut self, _timeout: Duration) -> BoxFuture<'_, Readiness> {
        self.state = DependencyState::Ready;
        Box::pin(async { Readiness::Ready })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<()>> {
        self.state = DependencyState::Down;
        Box::pin(async { Ok(()) })
    }
}

/// Either a configured command-driven service or none at all.
pub fn controller_from_config(cfg: Option<&ServiceConfig>) -> Box<dyn ServiceController> {
    match cfg {
        Some(cfg) => {
            if matches!(cfg.probe, crate::config::ProbeConfig::Delay { .. }) {
                warn!(
                    service = %cfg.name,
                    "no readiness probe configured; falling back to a fixed grace delay"
                );
            }
            Box::new(CommandService::from_config(cfg))
        }
        None => Box::new(NoService::default()),
    }
}
