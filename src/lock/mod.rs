// src/lock/mod.rs

//! Lock Manager: the single-run gate shared by every cronrun invocation.
//!
//! The Lock Record is a file whose entire content is the holder's pid. The pid
//! is written to a private staging file which is then hard-linked into place;
//! `link(2)` fails if the target exists, so two concurrent acquirers can never
//! both succeed and nobody ever observes a half-written record. A record left
//! behind by a dead process is removed (see [`recovery`]) and acquisition is
//! retried exactly once.
//!
//! Acquisition hands out a [`LockGuard`]. The coordinator releases it
//! explicitly during cleanup; if the guard is dropped without that (e.g. a
//! panic unwinding through the run), `Drop` deletes the record.

pub mod liveness;
pub mod recovery;

use std::ffi::OsString;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::errors::{CronrunError, Result};

pub use liveness::is_pid_alive;

use recovery::RecoveryLock;

/// Distinguishes staging files of acquirers sharing one pid.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Outcome of [`LockFile::try_acquire`].
#[derive(Debug)]
pub enum Acquisition {
    /// The caller now holds the lock.
    Acquired(LockGuard),
    /// Another live process holds the lock; the caller must abort.
    HeldByLivePeer(u32),
}

/// What an existing Lock Record says about its holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holder {
    Live(u32),
    Dead(u32),
    /// Content is not a pid (corrupted or edited by hand).
    Unreadable(String),
    /// The record disappeared before it could be read.
    Gone,
}

/// Handle on the Lock Record at a fixed path.
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    pid: u32,
}

impl LockFile {
    /// Lock file owned on behalf of the current process.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_pid(path, std::process::id())
    }

    /// Lock file that records `pid` as its holder when acquired.
    pub fn with_pid(path: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            path: path.into(),
            pid,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to become the single holder of the lock.
    ///
    /// - Absent record: created atomically, `Acquired`.
    /// - Record of a live process: `HeldByLivePeer`, nothing is touched.
    /// - Stale record (dead or unreadable): removed with a warning, then one
    ///   more exclusive create. A live peer winning that race is reported as
    ///   `HeldByLivePeer`; a record that is stale again is a `LockError`.
    pub fn try_acquire(&self) -> Result<Acquisition> {
        self.ensure_parent_dir()?;

        if self.create_exclusive()? {
            return Ok(self.acquired());
        }

        match self.read_holder()? {
            Holder::Live(pid) => return Ok(Acquisition::HeldByLivePeer(pid)),
            Holder::Gone => {
                debug!(
                    path = %self.path.display(),
                    "lock released while inspecting it; retrying"
                );
            }
            stale => self.recover_stale(&stale)?,
        }

        if self.create_exclusive()? {
            return Ok(self.acquired());
        }

        match self.read_holder()? {
            Holder::Live(pid) => Ok(Acquisition::HeldByLivePeer(pid)),
            Holder::Dead(pid) => {
                warn!(
                    path = %self.path.display(),
                    pid,
                    "lock re-created by a process that already exited; not retrying again"
                );
                Err(CronrunError::lock(
                    &self.path,
                    io::Error::new(
                        ErrorKind::WouldBlock,
                        format!("lock still stale after recovery (holder {pid} exited)"),
                    ),
                ))
            }
            other => Err(CronrunError::lock(
                &self.path,
                io::Error::new(
                    ErrorKind::WouldBlock,
                    format!("lock contended during stale-lock recovery ({other:?})"),
                ),
            )),
        }
    }

    /// Delete the Lock Record. Deleting an absent record is not an error.
    pub fn release(&self) -> Result<()> {
        remove_lock_file(&self.path).map_err(|e| CronrunError::lock(&self.path, e))
    }

    /// Inspect the current record without modifying it.
    pub fn read_holder(&self) -> Result<Holder> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Holder::Gone),
            Err(e) => return Err(CronrunError::lock(&self.path, e)),
        };

        Ok(match content.trim().parse::<u32>() {
            Ok(pid) if is_pid_alive(pid) => Holder::Live(pid),
            Ok(pid) => Holder::Dead(pid),
            Err(_) => Holder::Unreadable(content.trim().to_string()),
        })
    }

    fn acquired(&self) -> Acquisition {
        info!(path = %self.path.display(), pid = self.pid, "lock acquired");
        Acquisition::Acquired(LockGuard {
            path: self.path.clone(),
            released: false,
        })
    }

    /// `Ok(true)` if this call created the record, `Ok(false)` if one exists.
    fn create_exclusive(&self) -> Result<bool> {
        let staging = self.staging_path();
        if let Err(e) = fs::write(&staging, self.pid.to_string()) {
            let _ = fs::remove_file(&staging);
            return Err(CronrunError::lock(&staging, e));
        }

        let linked = fs::hard_link(&staging, &self.path);
        if let Err(e) = fs::remove_file(&staging) {
            debug!(
                path = %staging.display(),
                error = %e,
                "failed to remove lock staging file"
            );
        }

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(CronrunError::lock(&self.path, e)),
        }
    }

    /// Remove a stale record, unless another acquirer already replaced it.
    fn recover_stale(&self, observed: &Holder) -> Result<()> {
        let recovery_path = self.sibling_path(".recover");
        let _recovery = RecoveryLock::acquire(&recovery_path)
            .map_err(|e| CronrunError::lock(&recovery_path, e))?;

        let current = self.read_holder()?;
        if &current != observed {
            debug!(
                path = %self.path.display(),
                ?observed,
                ?current,
                "lock changed during stale recovery"
            );
            return Ok(());
        }

        match observed {
            Holder::Dead(pid) => {
                warn!(
                    path = %self.path.display(),
                    pid,
                    "removing stale lock (holder is not running)"
                );
            }
            Holder::Unreadable(content) => {
                warn!(
                    path = %self.path.display(),
                    content = %content,
                    "removing stale lock (no valid pid)"
                );
            }
            Holder::Live(_) | Holder::Gone => return Ok(()),
        }
        self.remove()
    }

    fn staging_path(&self) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        self.sibling_path(&format!(".{}.{}.tmp", self.pid, seq))
    }

    /// `<lock path><suffix>` in the same directory, so hard links work.
    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn remove(&self) -> Result<()> {
        remove_lock_file(&self.path).map_err(|e| CronrunError::lock(&self.path, e))
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| CronrunError::lock(parent, e))
            }
            _ => Ok(()),
        }
    }
}

/// Proof of holding the lock.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock, reporting any deletion failure to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_lock_file(&self.path).map_err(|e| CronrunError::lock(&self.path, e))?;
        info!(path = %self.path.display(), "lock released");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match remove_lock_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "lock released by guard drop"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release lock on drop"
            ),
        }
    }
}

fn remove_lock_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
