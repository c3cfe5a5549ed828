//! CLI command implementations.

pub mod check;
pub mod list;
pub mod progress;
pub mod reconcile;
pub mod sync;
pub mod titles;

use crate::models::config::{load_config, load_config_from, Config};
use crate::store::Catalog;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load the configuration file and apply command line overrides.
pub fn resolve_config(config_file: Option<&Path>, db: Option<&Path>) -> Result<Config> {
    let mut config = match config_file {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => load_config(),
    };

    if let Some(db) = db {
        config.database_path = db.to_path_buf();
    }

    Ok(config)
}

/// Open the configured catalog.
pub fn open_catalog(config: &Config) -> Result<Catalog> {
    let catalog = Catalog::open(&config.database_path).with_context(|| {
        format!("Failed to open catalog: {}", config.database_path.display())
    })?;
    Ok(catalog.with_completion_threshold(config.completion_threshold))
}

/// The library root given on the command line, else the configured one.
pub fn resolve_library_path(path: Option<&Path>, config: &Config) -> Result<PathBuf> {
    path.map(Path::to_path_buf)
        .or_else(|| config.library_path.clone())
        .context("No library path given and none configured (set library_path in config.toml)")
}
