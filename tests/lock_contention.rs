// tests/lock_contention.rs
mod common;
use crate::common::{init_tracing, DEAD_PID};

use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use tempfile::TempDir;

use cronrun::errors::CronrunError;
use cronrun::lock::recovery::RecoveryLock;
use cronrun::lock::{Acquisition, Holder, LockFile, LockGuard};

/// Race `contenders` threads on one lock path; returns (acquired guards,
/// number of `HeldByLivePeer` observations).
fn race(path: &Path, contenders: usize) -> (Vec<LockGuard>, usize) {
    let barrier = Arc::new(Barrier::new(contenders));
    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let lock = LockFile::new(path);
            thread::spawn(move || {
                barrier.wait();
                lock.try_acquire().expect("lock I/O must not fail")
            })
        })
        .collect();

    let mut guards = Vec::new();
    let mut contended = 0;
    for handle in handles {
        match handle.join().expect("contender thread panicked") {
            Acquisition::Acquired(guard) => guards.push(guard),
            Acquisition::HeldByLivePeer(_) => contended += 1,
        }
    }
    (guards, contended)
}

#[test]
fn concurrent_acquirers_on_absent_record_yield_one_holder() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cronrun.lock");

    let (guards, contended) = race(&path, 16);
    assert_eq!(guards.len(), 1, "exactly one contender may hold the lock");
    assert_eq!(contended, 15);
}

#[test]
fn concurrent_acquirers_on_stale_record_yield_one_holder() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cronrun.lock");
    fs::write(&path, DEAD_PID.to_string()).unwrap();

    let (guards, contended) = race(&path, 16);
    assert_eq!(guards.len(), 1, "stale recovery must not admit two holders");
    assert_eq!(contended, 15);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        std::process::id().to_string()
    );
}

#[test]
fn next_acquirer_succeeds_after_holder_releases() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cronrun.lock");

    let (mut guards, _) = race(&path, 4);
    let guard = guards.pop().expect("one holder");
    guard.release().unwrap();

    match LockFile::new(&path).try_acquire().unwrap() {
        Acquisition::Acquired(guard) => guard.release().unwrap(),
        other => panic!("expected Acquired after release, got {other:?}"),
    }
}

#[test]
fn record_that_is_stale_again_after_recovery_is_not_reported_as_live() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cronrun.lock");
    fs::write(&path, DEAD_PID.to_string()).unwrap();

    // Hold the recovery lock so the acquirer parks right after observing the
    // stale record.
    let recovery = RecoveryLock::acquire(&dir.path().join("cronrun.lock.recover")).unwrap();
    let acquirer = {
        let lock = LockFile::new(&path);
        thread::spawn(move || lock.try_acquire())
    };
    thread::sleep(Duration::from_millis(300));

    // Another exited process re-creates the record meanwhile.
    let other_dead_pid = DEAD_PID - 1;
    fs::remove_file(&path).unwrap();
    fs::write(&path, other_dead_pid.to_string()).unwrap();
    drop(recovery);

    match acquirer.join().expect("acquirer thread panicked") {
        Err(CronrunError::LockError { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::WouldBlock);
            assert!(
                source.to_string().contains(&other_dead_pid.to_string()),
                "unexpected message: {source}"
            );
        }
        other => panic!("expected LockError, got {other:?}"),
    }
    // Only one recovery per attempt: the new record is left for the next run.
    assert_eq!(
        LockFile::new(&path).read_holder().unwrap(),
        Holder::Dead(other_dead_pid)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn at_most_one_holder_for_any_contender_count(
        contenders in 1usize..12,
        stale in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cronrun.lock");
        if stale {
            fs::write(&path, DEAD_PID.to_string()).unwrap();
        }

        let (guards, contended) = race(&path, contenders);
        prop_assert_eq!(guards.len(), 1);
        prop_assert_eq!(contended, contenders - 1);
    }
}
