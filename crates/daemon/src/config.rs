// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Resolved in three layers, later ones winning: built-in defaults, the
//! optional `rld.toml` in the data directory, then `RL_*` environment
//! variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rl_storage::StoreConfig;
use serde::Deserialize;
use thiserror::Error;

/// Optional config file inside the data directory
pub const CONFIG_FILE: &str = "rld.toml";
pub const LOCK_FILE: &str = "rld.pid";
pub const LOG_FILE: &str = "rld.log";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Environment variable naming the data directory when no argument is given
pub const ENV_DATA_DIR: &str = "RL_DATA_DIR";
const ENV_LISTEN_ADDR: &str = "RL_LISTEN_ADDR";
const ENV_SNAPSHOT_INTERVAL_MS: &str = "RL_SNAPSHOT_INTERVAL_MS";
const ENV_SYNC_WRITES: &str = "RL_SYNC_WRITES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Snapshot interval must be greater than zero")]
    ZeroInterval,
}

/// Tunable settings, as they appear in `rld.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Address the TCP listener binds to
    pub listen_addr: String,
    /// Time between background snapshot cycles
    #[serde(with = "humantime_serde")]
    pub snapshot_interval: Duration,
    /// fsync the log after every write
    pub sync_writes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            sync_writes: true,
        }
    }
}

impl Settings {
    /// Overlay environment variables, looked up through `get`
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = get(ENV_LISTEN_ADDR) {
            self.listen_addr = addr;
        }

        if let Some(raw) = get(ENV_SNAPSHOT_INTERVAL_MS) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_SNAPSHOT_INTERVAL_MS,
                    value: raw.clone(),
                })?;
            self.snapshot_interval = Duration::from_millis(ms);
        }

        if let Some(raw) = get(ENV_SYNC_WRITES) {
            self.sync_writes = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: ENV_SYNC_WRITES,
                        value: raw,
                    })
                }
            };
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

/// Fully resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the log, snapshot, pid and daemon log files
    pub data_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Configuration with default settings for `data_dir`
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            lock_path: data_dir.join(LOCK_FILE),
            log_path: data_dir.join(LOG_FILE),
            settings: Settings::default(),
        }
    }

    /// Resolve configuration from the config file and process environment
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with(data_dir, |var| std::env::var(var).ok())
    }

    pub fn load_with<F>(data_dir: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_data_dir(data_dir);

        let path = data_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                config.settings =
                    toml::from_str(&content).map_err(|source| ConfigError::Parse {
                        path: path.clone(),
                        source,
                    })?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(ConfigError::Read { path, source }),
        }

        config.settings.apply_env(env)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Storage settings for the list store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            sync_writes: self.settings.sync_writes,
        }
    }
}

/// Pick the data directory: explicit argument, then `RL_DATA_DIR`, then cwd
pub fn resolve_data_dir(arg: Option<&str>) -> std::io::Result<PathBuf> {
    if let Some(dir) = arg {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    std::env::current_dir()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
