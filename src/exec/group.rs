// src/exec/group.rs

//! Process-group ownership for the pipeline job.
//!
//! The job runs as `sh -c <cmd>`, and whatever the shell forks inherits its
//! pipes and outlives it. The job is therefore started as the leader of its
//! own process group, and timeouts and interrupts signal the whole group.
//! Once the leader has been reaped its pgid may be reused, so the guard must
//! be disarmed before that point.

use std::io;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Make `cmd` the leader of a fresh process group when spawned.
pub fn isolate(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Kills the job's process group when dropped while armed.
///
/// Dropping the job future (interrupt) therefore takes the shell's children
/// down along with the shell itself.
#[derive(Debug)]
pub struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    /// Guard for the group led by `child`, which must have been spawned from
    /// a command passed through [`isolate`].
    pub fn of(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    /// SIGKILL every process in the group and disarm the guard.
    pub fn kill(&mut self) -> io::Result<()> {
        match self.pgid.take() {
            Some(pgid) => kill_group(pgid),
            None => Ok(()),
        }
    }

    /// The leader exited on its own; leave the group alone from now on.
    pub fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid {
            debug!(pgid, "job abandoned; killing its process group");
            if let Err(e) = self.kill() {
                warn!(pgid, error = %e, "failed to kill job process group");
            }
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) -> io::Result<()> {
    // SAFETY: plain syscall; `pgid` is the id of a group this process created.
    let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if result == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // Everything in the group is already gone.
        return Ok(());
    }
    Err(err)
}

#[cfg(not(unix))]
fn kill_group(_pgid: i32) -> io::Result<()> {
    Ok(())
}
