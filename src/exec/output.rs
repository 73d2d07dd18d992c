// src/exec/output.rs

//! Forward child stdout/stderr into the log stream line by line.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to wait for output forwarders after the child has exited.
///
/// Grandchildren that inherited the pipes can keep them open indefinitely.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Background tasks copying one child's output into the log.
#[derive(Debug)]
pub struct OutputForwarders {
    handles: Vec<JoinHandle<()>>,
}

impl OutputForwarders {
    /// Take the piped stdout/stderr of `child` and start forwarding them.
    ///
    /// `source` labels the lines (e.g. `"job"`, `"service:postgres"`).
    pub fn attach(child: &mut Child, source: &str) -> Self {
        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            handles.push(spawn_forwarder(stdout, source.to_string(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(spawn_forwarder(stderr, source.to_string(), "stderr"));
        }
        Self { handles }
    }

    /// Wait for the forwarders to reach EOF so output lines precede whatever
    /// the caller logs next.
    pub async fn drain(self) {
        for handle in self.handles {
            match tokio::time::timeout(DRAIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "output forwarder failed"),
                Err(_) => debug!("output still open after child exit; detaching forwarder"),
            }
        }
    }
}

fn spawn_forwarder<R>(reader: R, source: String, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => info!(source = %source, stream, "{}", line),
                Ok(None) => break,
                Err(e) => {
                    debug!(source = %source, stream, error = %e, "stopped reading output");
                    break;
                }
            }
        }
    })
}
