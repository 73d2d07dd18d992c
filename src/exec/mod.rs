// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`shell`] builds platform shell commands and maps exit statuses.
//! - [`output`] forwards child stdout/stderr into the log stream.
//! - [`group`] puts the job in its own process group and kills it as a unit.
//! - [`job`] provides the `JobRunner` trait and the production `ShellJob`.

pub mod group;
pub mod job;
pub mod output;
pub mod shell;

pub use job::{JobOutcome, JobRunner, ShellJob};
pub use output::OutputForwarders;
pub use shell::{exit_code_of, shell_command};
