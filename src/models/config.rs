//! Configuration model.

use crate::models::catalog::COMPLETION_THRESHOLD;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library root used when a command is given no path.
    pub library_path: Option<PathBuf>,
    /// SQLite catalog file.
    pub database_path: PathBuf,
    /// Media prober configuration.
    pub probe: ProbeConfig,
    /// Sync configuration.
    pub sync: SyncConfig,
    /// Fraction of the duration after which an episode counts as watched.
    pub completion_threshold: f64,
}

/// Media prober configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// ffprobe executable.
    pub ffprobe_path: String,
    /// Per-file timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent prober processes.
    pub max_concurrent: usize,
}

/// Sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Series folders processed concurrently.
    pub series_workers: usize,
    /// Seconds to wait for one directory walk or file stat.
    pub scan_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: None,
            database_path: dirs_config_path().join("aniplay.db"),
            probe: ProbeConfig::default(),
            sync: SyncConfig::default(),
            completion_threshold: COMPLETION_THRESHOLD,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            timeout_secs: 30,
            max_concurrent: 4,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            series_workers: 4,
            scan_timeout_secs: 120,
        }
    }
}

/// Get the configuration directory path.
pub fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aniplay")
}

/// Default location of the configuration file.
pub fn default_config_file() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a specific file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load configuration from the default file, falling back to defaults.
pub fn load_config() -> Config {
    let config_path = default_config_file();

    if config_path.exists() {
        match load_config_from(&config_path) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", config_path.display(), e);
            }
        }
    }

    Config::default()
}
