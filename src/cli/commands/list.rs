//! List command implementation.

use crate::models::catalog::{Episode, SeriesId};
use crate::store::Catalog;
use crate::utils::format::{format_size, format_time};
use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;

/// Group label for files directly in the series root.
const ROOT_GROUP: &str = "Main";

/// List all series, or the episodes of one.
pub async fn list(catalog: &Catalog, series_id: Option<SeriesId>) -> Result<()> {
    match series_id {
        Some(id) => list_episodes(catalog, id),
        None => list_series(catalog),
    }
}

fn list_series(catalog: &Catalog) -> Result<()> {
    let series = catalog.list_series()?;
    if series.is_empty() {
        println!("Catalog is empty. Run 'aniplay sync' first.");
        return Ok(());
    }

    println!("{}", "Series".bold().cyan());
    println!("{}", "=".repeat(60));
    for s in &series {
        let episodes = catalog.list_episodes(s.id)?;
        println!(
            "  {:>4}  {}  ({} episodes, {})",
            s.id,
            s.name.bold(),
            episodes.len(),
            format_size(s.total_size_bytes)
        );
    }
    println!();
    println!("  {} series", series.len());

    Ok(())
}

fn list_episodes(catalog: &Catalog, series_id: SeriesId) -> Result<()> {
    let series = catalog
        .get_series(series_id)?
        .ok_or(crate::Error::SeriesNotFound(series_id))?;
    let episodes = catalog.list_episodes(series_id)?;

    println!("{}", series.name.bold().cyan());
    println!("  {}", series.path.display());
    if let Some(poster) = &series.thumbnail_path {
        println!("  Poster: {}", poster.display());
    }
    println!();

    // BTreeMap keeps folders sorted; the root group is printed first.
    let mut groups: BTreeMap<&str, Vec<&Episode>> = BTreeMap::new();
    let mut root: Vec<&Episode> = Vec::new();
    for episode in &episodes {
        match episode.folder_name.as_deref() {
            Some(folder) => groups.entry(folder).or_default().push(episode),
            None => root.push(episode),
        }
    }

    if !root.is_empty() {
        print_group(catalog, ROOT_GROUP, &root)?;
    }
    for (folder, group) in &groups {
        print_group(catalog, folder, group)?;
    }

    if episodes.is_empty() {
        println!("No episodes.");
    }

    Ok(())
}

fn print_group(catalog: &Catalog, label: &str, episodes: &[&Episode]) -> Result<()> {
    println!("{}", format!("[{}]", label).bold());
    for episode in episodes {
        let number = match (episode.season_number, episode.episode_number) {
            (Some(s), Some(e)) => format!("S{:02}E{:02}", s, e),
            (None, Some(e)) => format!("E{:02}", e),
            _ => "-".to_string(),
        };
        let watched = match catalog.get_progress(episode.id)? {
            Some(p) if p.completed => "[watched]".green().to_string(),
            Some(p) => format!("[{}]", format_time(p.timestamp_seconds)).yellow().to_string(),
            None => String::new(),
        };
        let duration = if episode.duration_seconds > 0.0 {
            format_time(episode.duration_seconds)
        } else {
            "?".to_string()
        };
        println!(
            "  {:>5}  {:<7} {}  ({}) {}",
            episode.id,
            number,
            episode.display_title(),
            duration,
            watched
        );
    }
    println!();
    Ok(())
}
