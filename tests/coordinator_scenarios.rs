// tests/coordinator_scenarios.rs
mod common;
use crate::common::{init_tracing, LivePeer, DEAD_PID};

use std::error::Error;
use std::fs;
use std::future::pending;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use cronrun::engine::{Coordinator, CoordinatorOptions, Stage, StageOutcome};
use cronrun::lock::LockFile;
use cronrun::service::ServiceController;
use cronrun::types::{DependencyState, INTERRUPTED_EXIT_CODE};
use cronrun_test_utils::fakes::{CallLog, FakeJob, FakeJobBehaviour, FakeReadiness, FakeService};

type TestResult = Result<(), Box<dyn Error>>;

const SENTINEL: i32 = 1;

fn options() -> CoordinatorOptions {
    CoordinatorOptions {
        ready_timeout: Duration::from_secs(2),
        sentinel_exit_code: SENTINEL,
    }
}

fn lock_path(dir: &TempDir) -> PathBuf {
    dir.path().join("cronrun.lock")
}

fn coordinator(
    dir: &TempDir,
    service: FakeService,
    job: FakeJob,
) -> Coordinator<FakeService, FakeJob> {
    Coordinator::new(LockFile::new(lock_path(dir)), service, job, options())
}

/// Scenario A: no lock, dependency ready, job exits 0.
#[tokio::test]
async fn happy_path_exits_zero_and_removes_lock() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(0));
    assert_eq!(attempt.job_exit_code(), Some(0));
    assert!(!lock_path(&dir).exists());
    assert_eq!(log.calls(), vec!["start", "await_ready", "job", "stop"]);
    assert_eq!(coord.service().state(), DependencyState::Down);
    assert_eq!(
        attempt.transitions(),
        &[
            Stage::Idle,
            Stage::LockAcquired,
            Stage::DependencyReady,
            Stage::JobRunning,
            Stage::Cleanup,
            Stage::Done,
        ]
    );
    assert_eq!(
        attempt.outcomes(),
        &[
            StageOutcome::LockAcquired,
            StageOutcome::DependencyReady,
            StageOutcome::JobExited { exit_code: 0 },
            StageOutcome::DependencyStopped,
            StageOutcome::LockReleased,
        ]
    );
    Ok(())
}

/// Scenario B: a live process holds the lock.
#[tokio::test]
async fn live_holder_aborts_without_side_effects() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let peer = LivePeer::spawn();
    fs::write(lock_path(&dir), peer.pid().to_string())?;

    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(SENTINEL));
    assert!(log.calls().is_empty(), "no dependency start, no job, no stop");
    assert_eq!(fs::read_to_string(lock_path(&dir))?, peer.pid().to_string());
    assert_eq!(
        attempt.outcomes(),
        &[StageOutcome::LockContended { holder: peer.pid() }]
    );
    assert!(!attempt.reached(Stage::Cleanup));
    Ok(())
}

/// Scenario C: the lock file names a dead process.
#[tokio::test]
async fn stale_lock_is_recovered_and_run_proceeds() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    fs::write(lock_path(&dir), DEAD_PID.to_string())?;

    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(0));
    assert_eq!(log.calls(), vec!["start", "await_ready", "job", "stop"]);
    assert!(!lock_path(&dir).exists());
    Ok(())
}

/// Scenario D: the job exits 2.
#[tokio::test]
async fn job_failure_code_is_propagated_after_cleanup() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(2)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(2));
    assert_eq!(log.count("stop"), 1);
    assert!(!lock_path(&dir).exists());
    assert!(attempt.outcomes().contains(&StageOutcome::LockReleased));
    Ok(())
}

/// Scenario E: readiness wait exceeds the timeout.
#[tokio::test(start_paused = true)]
async fn readiness_timeout_skips_job_but_cleans_up() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()).readiness(FakeReadiness::Never),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(SENTINEL));
    assert_eq!(attempt.job_exit_code(), None);
    assert_eq!(log.calls(), vec!["start", "await_ready", "stop"]);
    assert!(!lock_path(&dir).exists());
    assert!(attempt.outcomes().contains(&StageOutcome::DependencyTimedOut));
    assert!(!attempt.reached(Stage::JobRunning));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_but_timely_dependency_lets_job_run() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()).readiness(FakeReadiness::After(Duration::from_millis(1500))),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(0));
    assert_eq!(log.calls(), vec!["start", "await_ready", "job", "stop"]);
    Ok(())
}

#[tokio::test]
async fn dependency_start_failure_still_stops_and_releases() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()).fail_start(),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(SENTINEL));
    assert_eq!(log.calls(), vec!["start", "stop"]);
    assert!(!lock_path(&dir).exists());
    Ok(())
}

#[tokio::test]
async fn stop_failure_does_not_override_job_exit_code() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()).fail_stop(),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(3)),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(3));
    assert!(!lock_path(&dir).exists(), "release still runs after a failed stop");
    assert!(matches!(
        attempt.outcomes()[3],
        StageOutcome::DependencyStopFailed { .. }
    ));
    assert_eq!(attempt.outcomes()[4], StageOutcome::LockReleased);
    Ok(())
}

#[tokio::test]
async fn job_that_cannot_start_reports_sentinel() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::SpawnError),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(SENTINEL));
    assert_eq!(log.count("stop"), 1);
    assert!(!lock_path(&dir).exists());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_job_runs_cleanup() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Hang),
    );

    let attempt = coord
        .run(tokio::time::sleep(Duration::from_millis(100)))
        .await;

    assert_eq!(attempt.exit_code(), Some(INTERRUPTED_EXIT_CODE));
    assert_eq!(log.calls(), vec!["start", "await_ready", "job", "stop"]);
    assert!(attempt.outcomes().contains(&StageOutcome::Interrupted));
    assert!(!lock_path(&dir).exists());
    Ok(())
}

#[tokio::test]
async fn lock_io_failure_aborts_before_any_stage() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let blocker = dir.path().join("file");
    fs::write(&blocker, "")?;

    let log = CallLog::new();
    let mut coord = Coordinator::new(
        LockFile::new(blocker.join("cronrun.lock")),
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
        options(),
    );

    let attempt = coord.run(pending()).await;

    assert_eq!(attempt.exit_code(), Some(SENTINEL));
    assert!(log.calls().is_empty());
    assert!(matches!(
        attempt.outcomes(),
        [StageOutcome::LockFailed { .. }]
    ));
    Ok(())
}

#[tokio::test]
async fn consecutive_runs_reuse_the_lock() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let log = CallLog::new();
    let mut coord = coordinator(
        &dir,
        FakeService::new(log.clone()),
        FakeJob::new(log.clone(), FakeJobBehaviour::Exit(0)),
    );

    assert_eq!(coord.run(pending()).await.exit_code(), Some(0));
    assert_eq!(coord.run(pending()).await.exit_code(), Some(0));
    assert_eq!(log.count("job"), 2);
    assert_eq!(log.count("stop"), 2);
    Ok(())
}
