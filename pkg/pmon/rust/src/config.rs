// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::client::ClientSettings;
use crate::poll::{PollSettings, REGISTRATION_POLL_ATTEMPTS};
use crate::resolver::{ExecutableResolver, FixedPathResolver, InstallRootResolver};
use anyhow::{Context, Result, bail};
use log::{Level, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "/etc/pmon/pmon.yaml";

fn default_command_timeout_secs() -> u64 {
    60
}

fn default_register_retries() -> u32 {
    1
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_poll_attempts() -> u32 {
    REGISTRATION_POLL_ATTEMPTS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PmonConfig {
    /// Explicit supervisor executable. Takes precedence over `install_root`.
    pub executable: Option<PathBuf>,
    /// Product install root, searched as `<root>/<version>/bin/WCCILpmon`.
    pub install_root: Option<PathBuf>,
    pub version: Option<String>,
    /// 0 disables the limit.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_register_retries")]
    pub register_retries: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PmonConfig {
    fn default() -> Self {
        Self {
            executable: None,
            install_root: None,
            version: None,
            command_timeout_secs: default_command_timeout_secs(),
            register_retries: default_register_retries(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_attempts: default_poll_attempts(),
            log_level: default_log_level(),
        }
    }
}

impl PmonConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            command_timeout: (self.command_timeout_secs > 0)
                .then(|| Duration::from_secs(self.command_timeout_secs)),
            register_retries: self.register_retries,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            attempts: self.poll_attempts,
        }
    }

    /// The resolver matching whichever of `executable` / `install_root` is set.
    pub fn resolver(&self) -> Option<Box<dyn ExecutableResolver>> {
        if let Some(ref path) = self.executable {
            return Some(Box::new(FixedPathResolver::new(path)));
        }
        self.install_root
            .as_ref()
            .map(|root| Box::new(InstallRootResolver::new(root)) as Box<dyn ExecutableResolver>)
    }

    pub fn log_level(&self) -> Result<Level> {
        parse_log_level(&self.log_level)
    }
}

pub fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.parse::<Level>() {
        Ok(level) => Ok(level),
        Err(_) => bail!("invalid log level '{raw}', expected error, warn, info, debug or trace"),
    }
}

pub fn config_path() -> PathBuf {
    std::env::var("DD_PMON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read the YAML file at `path`. A missing file yields the defaults; a file
/// that exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<PmonConfig> {
    if !path.exists() {
        warn!(
            "config file {} does not exist, using defaults",
            path.display()
        );
        return Ok(PmonConfig::default());
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(PmonConfig::default());
    }
    let config: PmonConfig =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    config.log_level()?;
    Ok(config)
}
