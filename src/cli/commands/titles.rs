//! Titles command implementation.

use crate::core::identity::display_title;
use crate::core::titles::preview_titles;
use crate::store::Catalog;
use anyhow::Result;
use colored::Colorize;

/// Print what title extraction would suggest for every episode.
pub async fn titles(catalog: &Catalog) -> Result<()> {
    let previews = preview_titles(catalog)?;
    if previews.is_empty() {
        println!("No episodes found in catalog.");
        return Ok(());
    }

    let total: usize = previews.iter().map(|p| p.episodes.len()).sum();
    println!("{}", "Title Extraction Dry-Run".bold().cyan());
    println!("  Total episodes: {}", total);

    let mut fallback = 0;
    for series in &previews {
        println!();
        println!("{}", format!("## {}", series.series_name).bold());
        println!("{}", "-".repeat(40));
        for preview in &series.episodes {
            let status = if preview.matched() {
                "[MATCHED] ".green()
            } else {
                fallback += 1;
                "[FALLBACK]".yellow()
            };
            println!("{} Filename: {}", status, preview.filename);
            match &preview.suggested {
                Some(suggested) => println!("           Suggested: {}", suggested),
                None => println!(
                    "           Shown as: {}",
                    display_title(&preview.filename).dimmed()
                ),
            }
        }
    }

    println!();
    println!("  {} matched, {} fallback", total - fallback, fallback);
    Ok(())
}
