// src/service/wait.rs

//! Bounded readiness wait: probe, back off, give up at the deadline.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::service::backoff::Backoff;
use crate::service::probe::ReadinessProbe;
use crate::types::Readiness;

/// Poll `probe` until it reports ready or `timeout` elapses.
///
/// The first check runs immediately. Between checks the delay follows
/// `backoff`, truncated so no sleep extends past the deadline. A check that
/// is still in flight at the deadline is abandoned.
///
/// Time is read through `tokio::time`, so tests can drive this with a paused
/// clock.
pub async fn wait_until_ready(
    probe: &mut dyn ReadinessProbe,
    timeout: Duration,
    backoff: &Backoff,
) -> Readiness {
    let now = Instant::now();
    let deadline = now.checked_add(timeout).unwrap_or_else(|| far_future(now));
    let mut attempt: u32 = 0;

    loop {
        let checked = tokio::time::timeout_at(deadline, probe.check()).await;
        match checked {
            Ok(true) => {
                info!(probe = %probe.describe(), attempts = attempt + 1, "readiness probe succeeded");
                return Readiness::Ready;
            }
            Ok(false) => {
                debug!(probe = %probe.describe(), attempt = attempt + 1, "readiness probe not ready yet");
            }
            Err(_) => break,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }

        let delay = backoff.delay(attempt).min(deadline - now);
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }

    warn!(
        probe = %probe.describe(),
        attempts = attempt + 1,
        timeout = ?timeout,
        "readiness wait timed out"
    );
    Readiness::TimedOut
}

/// A deadline nobody will reach, for timeouts too large to add to `now`.
fn far_future(now: Instant) -> Instant {
    now + Duration::from_secs(86_400 * 365 * 30)
}
