#![allow(dead_code)]

use cronrun::config::{
    ConfigFile, JobSection, ProbeSection, RawConfigFile, RunSection, ServiceSection,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                run: RunSection::default(),
                service: None,
                job: JobSection::default(),
            },
        }
    }

    pub fn project_root(mut self, root: &str) -> Self {
        self.config.run.project_root = root.to_string();
        self
    }

    pub fn lock_file(mut self, path: &str) -> Self {
        self.config.run.lock_file = path.to_string();
        self
    }

    pub fn log_file(mut self, path: &str) -> Self {
        self.config.run.log_file = path.to_string();
        self
    }

    pub fn sentinel(mut self, code: i32) -> Self {
        self.config.run.sentinel_exit_code = code;
        self
    }

    pub fn with_service(mut self, service: ServiceSection) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn job(mut self, cmd: &str) -> Self {
        self.config.job.cmd = cmd.to_string();
        self
    }

    pub fn job_timeout(mut self, timeout: &str) -> Self {
        self.config.job.timeout = Some(timeout.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ServiceSection`.
pub struct ServiceSectionBuilder {
    service: ServiceSection,
}

impl ServiceSectionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            service: ServiceSection {
                name: name.to_string(),
                up: "true".to_string(),
                down: "true".to_string(),
                probe: None,
                ready_timeout: "60s".to_string(),
                initial_backoff: "250ms".to_string(),
                max_backoff: "5s".to_string(),
            },
        }
    }

    pub fn up(mut self, cmd: &str) -> Self {
        self.service.up = cmd.to_string();
        self
    }

    pub fn down(mut self, cmd: &str) -> Self {
        self.service.down = cmd.to_string();
        self
    }

    pub fn tcp_probe(mut self, address: &str) -> Self {
        self.service.probe = Some(ProbeSection::Tcp {
            address: address.to_string(),
            connect_timeout: "1s".to_string(),
        });
        self
    }

    pub fn command_probe(mut self, cmd: &str) -> Self {
        self.service.probe = Some(ProbeSection::Command {
            cmd: cmd.to_string(),
        });
        self
    }

    pub fn ready_timeout(mut self, timeout: &str) -> Self {
        self.service.ready_timeout = timeout.to_string();
        self
    }

    pub fn backoff(mut self, initial: &str, max: &str) -> Self {
        self.service.initial_backoff = initial.to_string();
        self.service.max_backoff = max.to_string();
        self
    }

    pub fn build(self) -> ServiceSection {
        self.service
    }
}
