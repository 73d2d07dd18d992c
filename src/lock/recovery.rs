// src/lock/recovery.rs

//! Serializes stale-lock recovery between competing acquirers.
//!
//! Two acquirers can observe the same stale record. Without coordination the
//! slower one could delete the fresh record the faster one just created.
//! Recovery therefore happens under an exclusive `flock` on a sidecar file,
//! and the record is re-read before removal.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Held while inspecting and removing a stale Lock Record. The `flock` is
/// released when the file is closed, including on process death.
#[derive(Debug)]
pub struct RecoveryLock {
    _file: File,
}

impl RecoveryLock {
    /// Block until the recovery lock at `path` is held.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        flock_exclusive(&file)?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    loop {
        // SAFETY: `file` owns a valid descriptor for the duration of the call.
        let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if result == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}
