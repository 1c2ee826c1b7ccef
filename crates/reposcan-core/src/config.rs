// SPDX-License-Identifier: Apache-2.0

//! Configuration management for RepoScan.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `REPOSCAN_`)
//! 2. Config file: `~/.config/reposcan/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Override the worker pool size via environment variable
//! REPOSCAN_SCAN__WORKER_POOL_SIZE=10 reposcan scan
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ScanError;

/// Application configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scan orchestration settings.
    pub scan: ScanConfig,
    /// GitHub API settings.
    pub github: GitHubConfig,
}

/// Scan orchestration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of repositories scanned concurrently. Kept small to respect
    /// upstream rate limits.
    pub worker_pool_size: usize,
    /// Per-repository timeout in seconds. A timed-out repository is recorded
    /// as a zero-finding result with an error marker.
    pub repository_timeout_seconds: u64,
    /// Files larger than this are skipped during secret scanning.
    pub max_file_size_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 5,
            repository_timeout_seconds: 300,
            max_file_size_bytes: 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// Per-repository timeout as a [`Duration`].
    #[must_use]
    pub fn repository_timeout(&self) -> Duration {
        Duration::from_secs(self.repository_timeout_seconds)
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Page size for repository listing requests.
    pub page_size: u8,
    /// Directory names skipped while walking repository trees.
    pub skip_directories: Vec<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            skip_directories: [
                ".git",
                "node_modules",
                ".next",
                "dist",
                "build",
                ".vscode",
                ".idea",
                "__pycache__",
                ".pytest_cache",
                "coverage",
                ".nyc_output",
                "logs",
                "tmp",
                "temp",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

/// Returns the configuration directory path (`~/.config/reposcan`).
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("reposcan"))
}

/// Returns the configuration file path (`~/.config/reposcan/config.toml`).
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Loads configuration from file and environment, falling back to defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but is malformed, or if an
/// environment override fails to deserialize.
pub fn load_config() -> Result<AppConfig, ScanError> {
    let mut builder = Config::builder();

    if let Some(path) = config_file_path() {
        builder = builder.add_source(File::from(path).required(false));
    }

    let settings = builder
        .add_source(Environment::with_prefix("REPOSCAN").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
