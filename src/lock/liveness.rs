// src/lock/liveness.rs

//! Process-table liveness probe for Lock Record holders.

/// Whether `pid` names a process that currently exists.
///
/// Uses `kill(pid, 0)`, which checks for existence without delivering a
/// signal. `EPERM` means the process exists but belongs to someone else, so
/// it counts as alive.
pub fn is_pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let Ok(pid_i32) = i32::try_from(pid) else {
        return false;
    };

    #[cfg(unix)]
    {
        // SAFETY: signal 0 performs only the existence and permission checks.
        let result = unsafe { libc::kill(pid_i32, 0) };
        if result == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    #[cfg(not(unix))]
    {
        // No process table probe available; never treat a record as stale.
        let _ = pid_i32;
        true
    }
}
