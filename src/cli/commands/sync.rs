//! Sync command implementation.

use crate::core::sync::{SyncEngine, SyncMode, SyncOptions};
use crate::models::config::Config;
use crate::services::ffprobe::{self, FfprobeProber};
use crate::store::Catalog;
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Scan the library and update the catalog.
pub async fn sync(catalog: Catalog, config: &Config, library: &Path, full: bool) -> Result<()> {
    let mode = if full { SyncMode::Full } else { SyncMode::Incremental };

    println!("{}", "Syncing library...".bold().cyan());
    println!("  Library: {}", library.display());
    println!("  Mode: {}", if full { "full" } else { "incremental" });
    println!();

    let ffprobe_path = Path::new(&config.probe.ffprobe_path);
    if ffprobe::is_installed(ffprobe_path).await {
        if let Ok(version) = ffprobe::get_version(ffprobe_path).await {
            tracing::debug!("Using {}", version);
        }
    } else {
        println!(
            "{}",
            format!(
                "[WARN] '{}' not found, durations and tracks will stay unknown",
                config.probe.ffprobe_path
            )
            .yellow()
        );
        println!();
    }

    let prober = FfprobeProber::new(
        ffprobe_path,
        Duration::from_secs(config.probe.timeout_secs),
    );
    let engine = SyncEngine::new(
        Arc::new(Mutex::new(catalog)),
        Arc::new(prober),
        SyncOptions::from(config),
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Scanning series folders...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let summary = engine.sync(library, mode).await?;

    pb.finish_with_message("Scan complete");

    println!();
    println!("{}", "[SYNC] Complete!".bold().green());
    println!(
        "  Series: {} ({} new)",
        summary.series_seen, summary.series_created
    );
    println!(
        "  Episodes: {} ({} new, {} updated)",
        summary.episodes_seen, summary.episodes_created, summary.episodes_updated
    );
    println!("  Probed: {}", summary.probed);

    if summary.probe_failures > 0 {
        println!(
            "{}",
            format!(
                "  {} file(s) could not be probed, they will be retried next sync",
                summary.probe_failures
            )
            .yellow()
        );
    }

    if !summary.file_errors.is_empty() {
        println!();
        println!("{}", "Unreadable files (left as stored):".bold().red());
        for path in &summary.file_errors {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
