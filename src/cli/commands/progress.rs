//! Watch progress commands: progress, watched and history.

use crate::cli::args::WatchTarget;
use crate::models::catalog::{EpisodeId, WatchProgress};
use crate::store::Catalog;
use crate::utils::format::format_time;
use anyhow::Result;
use colored::Colorize;

/// Show or set the progress of one episode.
pub async fn progress(catalog: &Catalog, episode_id: EpisodeId, set: Option<f64>) -> Result<()> {
    let episode = catalog
        .get_episode(episode_id)?
        .ok_or(crate::Error::EpisodeNotFound(episode_id))?;

    let progress = match set {
        Some(seconds) => {
            if !seconds.is_finite() || seconds < 0.0 {
                anyhow::bail!("Position must be a non-negative number of seconds");
            }
            Some(catalog.set_progress(episode_id, seconds, false)?)
        }
        None => catalog.get_progress(episode_id)?,
    };

    println!("{}", episode.display_title().bold());
    match progress {
        Some(p) => print_progress(&p, episode.duration_seconds),
        None => println!("  Not watched yet"),
    }

    Ok(())
}

fn print_progress(progress: &WatchProgress, duration: f64) {
    let position = if duration > 0.0 {
        format!(
            "{} / {}",
            format_time(progress.timestamp_seconds),
            format_time(duration)
        )
    } else {
        format_time(progress.timestamp_seconds)
    };
    println!("  Position: {}", position);
    println!(
        "  Completed: {}",
        if progress.completed {
            "yes".green()
        } else {
            "no".yellow()
        }
    );
    println!(
        "  Last watched: {}",
        progress.last_watched.format("%Y-%m-%d %H:%M")
    );
}

/// Mark an episode or a series watched or unwatched.
pub async fn watched(catalog: &Catalog, target: WatchTarget, id: i64, unset: bool) -> Result<()> {
    let watched = !unset;
    let state = if watched { "watched" } else { "unwatched" };

    match target {
        WatchTarget::Episode => {
            catalog.mark_episode_watched(id, watched)?;
            println!("{}", format!("Episode {} marked as {}", id, state).green());
        }
        WatchTarget::Series => {
            let count = catalog.mark_series_watched(id, watched)?;
            println!(
                "{}",
                format!("{} episode(s) of series {} marked as {}", count, id, state).green()
            );
        }
    }

    Ok(())
}

/// Recently watched episodes, newest first.
pub async fn history(catalog: &Catalog, limit: usize) -> Result<()> {
    let entries = catalog.recent_progress(limit)?;
    if entries.is_empty() {
        println!("No watch history yet.");
        return Ok(());
    }

    println!("{}", "Recently watched".bold().cyan());
    for entry in &entries {
        let title = catalog
            .get_episode(entry.episode_id)?
            .map(|e| e.display_title().to_string())
            .unwrap_or_else(|| format!("Episode {}", entry.episode_id));
        let marker = if entry.completed {
            "✓".green().to_string()
        } else {
            format_time(entry.timestamp_seconds)
        };
        println!(
            "  {}  {:>5}  {}  {}",
            entry.last_watched.format("%Y-%m-%d %H:%M"),
            entry.episode_id,
            title,
            marker
        );
    }

    Ok(())
}
