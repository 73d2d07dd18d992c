// src/exec/shell.rs

//! Shell command construction and exit-status mapping shared by the job
//! runner, the service controller and command probes.

use std::process::ExitStatus;

use tokio::process::Command;

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Map a process exit status to the exit code cronrun reports.
///
/// A process killed by signal `N` reports `128 + N`, like a shell does.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
