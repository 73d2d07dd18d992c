// src/service/probe.rs

//! Readiness probes for the backing service.

use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::exec::shell_command;
use crate::types::BoxFuture;

/// One readiness check against the backing service.
///
/// Implementations answer a single question ("is it ready now?"); retries,
/// backoff and the overall deadline live in [`super::wait`].
pub trait ReadinessProbe: Send {
    fn check(&mut self) -> BoxFuture<'_, bool>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Build the production probe for a validated probe config.
pub fn probe_from_config(cfg: &ProbeConfig) -> Box<dyn ReadinessProbe> {
    match cfg {
        ProbeConfig::Tcp {
            address,
            connect_timeout,
        } => Box::new(TcpProbe::new(address.clone(), *connect_timeout)),
        ProbeConfig::Command { cmd } => Box::new(CommandProbe::new(cmd.clone())),
        ProbeConfig::Delay { grace } => Box::new(DelayProbe::new(*grace)),
    }
}

/// Ready once a TCP connection to `address` can be established.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }
}

impl ReadinessProbe for TcpProbe {
    fn check(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
                .await
            {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    debug!(address = %self.address, error = %e, "tcp probe: connect failed");
                    false
                }
                Err(_) => {
                    debug!(address = %self.address, "tcp probe: connect timed out");
                    false
                }
            }
        })
    }

    fn describe(&self) -> String {
        format!("tcp {}", self.address)
    }
}

/// Ready once `cmd` exits 0 (e.g. `pg_isready -h localhost`).
#[derive(Debug, Clone)]
pub struct CommandProbe {
    cmd: String,
}

impl CommandProbe {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl ReadinessProbe for CommandProbe {
    fn check(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let status = shell_command(&self.cmd)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status()
                .await;
            match status {
                Ok(status) => status.success(),
                Err(e) => {
                    debug!(cmd = %self.cmd, error = %e, "command probe: failed to run");
                    false
                }
            }
        })
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.cmd)
    }
}

/// Waits a fixed grace interval and then reports ready without checking
/// anything. Only used when no real probe is configured.
#[derive(Debug, Clone)]
pub struct DelayProbe {
    grace: Duration,
}

impl DelayProbe {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }
}

impl ReadinessProbe for DelayProbe {
    fn check(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            tokio::time::sleep(self.grace).await;
            true
        })
    }

    fn describe(&self) -> String {
        format!("fixed delay {:?}", self.grace)
    }
}
