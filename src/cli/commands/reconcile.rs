//! Reconcile command implementation.

use crate::core::reconcile::reconcile_paths;
use crate::store::Catalog;
use crate::utils::fs::file_name_string;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Updates printed before the list is truncated.
const MAX_LISTED_UPDATES: usize = 15;

/// Repair the recorded paths of moved episodes.
pub async fn reconcile(catalog: &Catalog, library: &Path, apply: bool) -> Result<()> {
    println!("{}", "Reconciling episode paths...".bold().cyan());
    println!("  Library: {}", library.display());
    if !apply {
        println!("{}", "  [DRY RUN] No changes will be saved.".yellow());
    }
    println!();

    let report = reconcile_paths(catalog, library, apply)?;

    if report.updated.is_empty() {
        println!("No moved episodes detected.");
    } else {
        println!("Found {} episodes that moved:", report.updated.len());
        for update in report.updated.iter().take(MAX_LISTED_UPDATES) {
            let merge_tag = if update.merged {
                format!(" {}", "[Merged]".magenta())
            } else {
                String::new()
            };
            println!(
                "  [M]{} {}: {} -> {}",
                merge_tag,
                update.series_hint,
                file_name_string(&update.old_path),
                file_name_string(&update.new_path)
            );
        }
        if report.updated.len() > MAX_LISTED_UPDATES {
            println!(
                "  ... and {} more.",
                report.updated.len() - MAX_LISTED_UPDATES
            );
        }
    }

    println!();
    println!("{}", "Reconciliation Summary".bold().green());
    println!("  {} {}", "Files found:".bold(), report.total_files_found);
    println!("  {} {}", "Episodes updated:".bold(), report.updated.len());
    println!("  {} {}", "Merged into other series:".bold(), report.merged);
    println!("  {} {}", "Episodes unchanged:".bold(), report.unchanged);
    println!("  {} {}", "Files not found:".bold(), report.unresolved.len());
    if !report.failed.is_empty() {
        println!("  {} {}", "Errors:".bold().red(), report.failed.len());
    }
    println!();

    if !apply && !report.updated.is_empty() {
        println!("To apply these changes and keep your watch progress, run with --apply");
    } else if apply {
        println!("{}", "Reconciliation complete! Watch progress has been preserved.".green());
    }

    Ok(())
}
