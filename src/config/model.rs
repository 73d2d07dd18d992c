// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// project_root = "/app"
/// lock_file = "/tmp/cronrun.lock"
/// log_file = "logging/cron.log"
///
/// [service]
/// name = "postgres"
/// up = "docker compose up -d postgres"
/// down = "docker compose stop postgres"
/// probe = { kind = "tcp", address = "127.0.0.1:5432" }
///
/// [job]
/// cmd = "python3 main.py"
/// ```
///
/// All sections are optional; `[service]` absent means the job has no
/// backing service to manage.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub service: Option<ServiceSection>,

    #[serde(default)]
    pub job: JobSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Directory the process changes into before anything else happens.
    /// Overridden by `CRONRUN_PROJECT_ROOT`.
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Lock Record path; relative paths resolve against `project_root`.
    #[serde(default = "default_lock_file")]
    pub lock_file: String,

    /// Append-only log file; relative paths resolve against `project_root`.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Exit code when the job never ran.
    #[serde(default = "default_sentinel_exit_code")]
    pub sentinel_exit_code: i32,
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_lock_file() -> String {
    "/tmp/cronrun.lock".to_string()
}

fn default_log_file() -> String {
    "logging/cron.log".to_string()
}

fn default_sentinel_exit_code() -> i32 {
    crate::types::DEFAULT_SENTINEL_EXIT_CODE
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            lock_file: default_lock_file(),
            log_file: default_log_file(),
            sentinel_exit_code: default_sentinel_exit_code(),
        }
    }
}

/// `[service]` section: the backing service the job needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// Logical service name, used in log lines.
    pub name: String,

    /// Bring-up command (e.g. `docker compose up -d postgres`).
    pub up: String,

    /// Tear-down command (e.g. `docker compose stop postgres`).
    pub down: String,

    #[serde(default)]
    pub probe: Option<ProbeSection>,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: String,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff: String,

    #[serde(default = "default_max_backoff")]
    pub max_backoff: String,
}

fn default_ready_timeout() -> String {
    "60s".to_string()
}

fn default_initial_backoff() -> String {
    "250ms".to_string()
}

fn default_max_backoff() -> String {
    "5s".to_string()
}

/// `probe = { kind = "...", ... }` inside `[service]`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeSection {
    /// Ready once a TCP connection to `address` succeeds.
    Tcp {
        address: String,
        #[serde(default = "default_connect_timeout")]
        connect_timeout: String,
    },
    /// Ready once `cmd` exits 0.
    Command { cmd: String },
    /// Ready after a fixed grace interval, without checking anything.
    Delay {
        #[serde(default = "default_grace")]
        grace: String,
    },
}

fn default_connect_timeout() -> String {
    "1s".to_string()
}

fn default_grace() -> String {
    "5s".to_string()
}

/// `[job]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    #[serde(default = "default_job_cmd")]
    pub cmd: String,

    /// Optional upper bound on the job's runtime (e.g. `"2h"`).
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_job_cmd() -> String {
    "python3 main.py".to_string()
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            cmd: default_job_cmd(),
            timeout: None,
        }
    }
}

/// Validated configuration with resolved paths and parsed durations.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunConfig,
    pub service: Option<ServiceConfig>,
    pub job: JobConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub project_root: PathBuf,
    pub lock_file: PathBuf,
    pub log_file: PathBuf,
    pub sentinel_exit_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub up: String,
    pub down: String,
    pub probe: ProbeConfig,
    pub ready_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeConfig {
    Tcp {
        address: String,
        connect_timeout: Duration,
    },
    Command {
        cmd: String,
    },
    Delay {
        grace: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub cmd: String,
    pub timeout: Option<Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        run: RunConfig,
        service: Option<ServiceConfig>,
        job: JobConfig,
    ) -> Self {
        Self { run, service, job }
    }
}
