// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, JobConfig, JobSection, ProbeConfig, ProbeSection, RawConfigFile, RunConfig,
    RunSection, ServiceConfig, ServiceSection,
};
use crate::errors::{CronrunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CronrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let run = validate_run(&raw.run)?;
        let service = raw.service.as_ref().map(validate_service).transpose()?;
        let job = validate_job(&raw.job)?;
        Ok(ConfigFile::new_unchecked(run, service, job))
    }
}

fn validate_run(run: &RunSection) -> Result<RunConfig> {
    if run.project_root.trim().is_empty() {
        return Err(config_error("[run].project_root must not be empty"));
    }
    if run.lock_file.trim().is_empty() {
        return Err(config_error("[run].lock_file must not be empty"));
    }
    if run.log_file.trim().is_empty() {
        return Err(config_error("[run].log_file must not be empty"));
    }
    if !(1..=255).contains(&run.sentinel_exit_code) {
        return Err(config_error(format!(
            "[run].sentinel_exit_code must be in 1..=255 (got {})",
            run.sentinel_exit_code
        )));
    }

    let project_root = PathBuf::from(&run.project_root);
    Ok(RunConfig {
        lock_file: resolve_against(&project_root, &run.lock_file),
        log_file: resolve_against(&project_root, &run.log_file),
        project_root,
        sentinel_exit_code: run.sentinel_exit_code,
    })
}

fn validate_service(service: &ServiceSection) -> Result<ServiceConfig> {
    if service.name.trim().is_empty() {
        return Err(config_error("[service].name must not be empty"));
    }
    for (field, cmd) in [("up", &service.up), ("down", &service.down)] {
        if cmd.trim().is_empty() {
            return Err(config_error(format!(
                "[service].{} command for '{}' must not be empty",
                field, service.name
            )));
        }
    }

    let ready_timeout = duration_field("[service].ready_timeout", &service.ready_timeout)?;
    let initial_backoff = duration_field("[service].initial_backoff", &service.initial_backoff)?;
    let max_backoff = duration_field("[service].max_backoff", &service.max_backoff)?;

    if ready_timeout.is_zero() {
        return Err(config_error("[service].ready_timeout must be greater than zero"));
    }
    if initial_backoff.is_zero() {
        return Err(config_error("[service].initial_backoff must be greater than zero"));
    }
    if initial_backoff > max_backoff {
        return Err(config_error(format!(
            "[service].initial_backoff ({}) must not exceed max_backoff ({})",
            service.initial_backoff, service.max_backoff
        )));
    }

    let probe = match &service.probe {
        Some(probe) => validate_probe(probe)?,
        None => ProbeConfig::Delay {
            grace: Duration::from_secs(5),
        },
    };

    Ok(ServiceConfig {
        name: service.name.clone(),
        up: service.up.clone(),
        down: service.down.clone(),
        probe,
        ready_timeout,
        initial_backoff,
        max_backoff,
    })
}

fn validate_probe(probe: &ProbeSection) -> Result<ProbeConfig> {
    match probe {
        ProbeSection::Tcp {
            address,
            connect_timeout,
        } => {
            if address.trim().is_empty() {
                return Err(config_error("[service].probe.address must not be empty"));
            }
            Ok(ProbeConfig::Tcp {
                address: address.trim().to_string(),
                connect_timeout: duration_field(
                    "[service].probe.connect_timeout",
                    connect_timeout,
                )?,
            })
        }
        ProbeSection::Command { cmd } => {
            if cmd.trim().is_empty() {
                return Err(config_error("[service].probe.cmd must not be empty"));
            }
            Ok(ProbeConfig::Command { cmd: cmd.clone() })
        }
        ProbeSection::Delay { grace } => Ok(ProbeConfig::Delay {
            grace: duration_field("[service].probe.grace", grace)?,
        }),
    }
}

fn validate_job(job: &JobSection) -> Result<JobConfig> {
    if job.cmd.trim().is_empty() {
        return Err(config_error("[job].cmd must not be empty"));
    }

    let timeout = job
        .timeout
        .as_deref()
        .map(|s| duration_field("[job].timeout", s))
        .transpose()?;

    if timeout.is_some_and(|t| t.is_zero()) {
        return Err(config_error("[job].timeout must be greater than zero"));
    }

    Ok(JobConfig {
        cmd: job.cmd.clone(),
        timeout,
    })
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| config_error(format!("{field}: {e}")))
}

fn resolve_against(root: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn config_error(msg: impl Into<String>) -> CronrunError {
    CronrunError::ConfigError(msg.into())
}
