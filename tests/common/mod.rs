#![allow(dead_code)]

use std::path::Path;
use std::process::{Child, Command};

pub use cronrun_test_utils::{builders, init_tracing};

/// A pid above Linux's `pid_max` ceiling; `kill(pid, 0)` always fails with
/// `ESRCH`.
pub const DEAD_PID: u32 = 2_147_483_646;

/// A live process to stand in for a competing cronrun instance.
///
/// Killed and reaped when dropped.
pub struct LivePeer {
    child: Child,
}

impl LivePeer {
    pub fn spawn() -> Self {
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawning sleep as a live peer");
        Self { child }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for LivePeer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Whether `pid` is a running (non-zombie) process, per `/proc`.
#[cfg(target_os = "linux")]
pub fn process_is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // The state follows the parenthesised command name.
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .is_some_and(|state| state != 'Z' && state != 'X'),
        Err(_) => false,
    }
}

/// Poll until `pid` is no longer running, for at most `limit`.
#[cfg(target_os = "linux")]
pub fn wait_for_exit(pid: u32, limit: std::time::Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < limit {
        if !process_is_running(pid) {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    !process_is_running(pid)
}

/// Read a pid a shell job wrote with `echo $! > file`.
pub fn read_pid(path: &Path) -> u32 {
    std::fs::read_to_string(path)
        .expect("pid file written by the job")
        .trim()
        .parse()
        .expect("pid file holds a pid")
}
