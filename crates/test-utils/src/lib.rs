//! Shared helpers for cronrun's integration tests: config builders, fake
//! collaborators for the coordinator, and tracing setup.

pub mod builders;
pub mod fakes;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for a single end-to-end run spawned by a test.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-captured subscriber once per test binary.
///
/// The filter comes from `CRONRUN_LOG` (the variable the binary honours),
/// defaulting to `info`. Output is only shown for failing tests unless the
/// harness runs with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("CRONRUN_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await a run that spawns real processes, failing the test instead of
/// hanging it when a child never exits.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(RUN_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("run did not finish within {RUN_TIMEOUT:?}"))
}
