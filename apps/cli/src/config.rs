//! Application configuration.
//!
//! Read from `<config_dir>/salute/config.json` unless a path is given.
//! Every field is optional; a missing file means all defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the template database lives.
    pub data_dir: PathBuf,
    pub database_file: String,
    pub feedback_dismiss_ms: u64,
    pub response_timeout_ms: u64,
    pub port_capacity: usize,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("salute"),
            database_file: "salute.db".to_string(),
            feedback_dismiss_ms: 5000,
            response_timeout_ms: 1000,
            port_capacity: salute_bus::DEFAULT_PORT_CAPACITY,
            log_filter: "info,salute=debug".to_string(),
        }
    }
}

impl Config {
    /// Config file in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("salute").join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; the default one may be missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// SQLite file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// How long feedback stays on screen.
    pub fn feedback_dismiss(&self) -> Duration {
        Duration::from_millis(self.feedback_dismiss_ms)
    }

    /// How long to wait for the coordinator to acknowledge.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
