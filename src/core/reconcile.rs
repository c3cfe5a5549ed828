//! Orphan reconciliation.
//!
//! Finds the new location of catalog episodes whose recorded path is gone,
//! searching the whole library rather than the old series folder, and
//! detects files that moved into another series' folder.

use crate::core::scanner;
use crate::models::catalog::{Episode, EpisodeId, SeriesId};
use crate::models::report::{PathUpdate, ReconcileReport};
use crate::models::scan::PhysicalEpisode;
use crate::store::Catalog;
use crate::utils::fs::{canonical_root, child_directories};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Where an episode should point after reconciliation.
enum Resolution<'a> {
    /// Recorded path exists and matches the scan.
    Unchanged,
    Moved(&'a PhysicalEpisode),
    Unresolved,
}

/// Scan output indexed for lookups.
struct LibraryIndex {
    by_path: HashMap<PathBuf, PhysicalEpisode>,
    by_filename: HashMap<String, Vec<PhysicalEpisode>>,
    total: usize,
}

impl LibraryIndex {
    fn build(root: &Path) -> Self {
        let mut by_path = HashMap::new();
        let mut by_filename: HashMap<String, Vec<PhysicalEpisode>> = HashMap::new();
        let mut total = 0;

        for folder in child_directories(root) {
            for episode in scanner::scan_series_folder(&folder) {
                total += 1;
                by_filename
                    .entry(episode.filename.clone())
                    .or_default()
                    .push(episode.clone());
                by_path.insert(episode.path.clone(), episode);
            }
        }

        Self {
            by_path,
            by_filename,
            total,
        }
    }

    fn resolve<'a>(&'a self, episode: &Episode) -> Resolution<'a> {
        if let Some(found) = self.by_path.get(&episode.path) {
            let metadata_changed = found.season_number != episode.season_number
                || found.folder_name != episode.folder_name;
            return if metadata_changed {
                Resolution::Moved(found)
            } else {
                Resolution::Unchanged
            };
        }

        if episode.path.exists() {
            // Still on disk but outside the scan, e.g. an unsupported extension.
            return Resolution::Unchanged;
        }

        let candidates = match self.by_filename.get(&episode.filename) {
            Some(candidates) => candidates,
            None => return Resolution::Unresolved,
        };

        if candidates.len() == 1 {
            return Resolution::Moved(&candidates[0]);
        }

        let mut matching = candidates.iter().filter(|c| {
            c.season_number == episode.season_number && c.episode_number == episode.episode_number
        });
        match (matching.next(), matching.next()) {
            (Some(only), None) => Resolution::Moved(only),
            _ => Resolution::Unresolved,
        }
    }
}

/// Top-level folder of `path` below `root`.
fn series_folder_name(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()?
        .components()
        .find_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
}

/// Match catalog episodes to their current files.
///
/// With `apply == false` nothing is written but the report lists every
/// change that would be made. The full library is indexed before any
/// episode is evaluated.
pub fn reconcile_paths(catalog: &Catalog, library_root: &Path, apply: bool) -> Result<ReconcileReport> {
    let root = canonical_root(library_root);
    let mut report = ReconcileReport {
        applied: apply,
        ..Default::default()
    };

    if !root.is_dir() {
        tracing::warn!("Library path not found, nothing to reconcile: {}", root.display());
        return Ok(report);
    }

    let index = LibraryIndex::build(&root);
    report.total_files_found = index.total;
    tracing::info!(
        "Indexed {} files under {} for reconciliation",
        index.total,
        root.display()
    );

    let series_by_path: HashMap<PathBuf, SeriesId> = catalog
        .list_series()?
        .into_iter()
        .map(|s| (s.path, s.id))
        .collect();

    let episodes = catalog.list_all_episodes()?;
    let recorded_paths: HashMap<PathBuf, EpisodeId> =
        episodes.iter().map(|e| (e.path.clone(), e.id)).collect();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for episode in &episodes {
        let found = match index.resolve(episode) {
            Resolution::Unchanged => {
                report.unchanged += 1;
                continue;
            }
            Resolution::Unresolved => {
                tracing::debug!("Unresolved: {}", episode.path.display());
                report.unresolved.push(episode.path.clone());
                continue;
            }
            Resolution::Moved(found) => found,
        };

        let owned_elsewhere = recorded_paths
            .get(&found.path)
            .map(|id| *id != episode.id)
            .unwrap_or(false);
        if owned_elsewhere || !claimed.insert(found.path.clone()) {
            tracing::warn!(
                "Episode {} resolves to {} which another episode already owns",
                episode.id,
                found.path.display()
            );
            report.failed.push(episode.path.clone());
            continue;
        }

        let series_hint = series_folder_name(&root, &found.path).unwrap_or_default();
        let target_series = series_by_path.get(&root.join(&series_hint)).copied();
        let merged = target_series.map(|id| id != episode.series_id).unwrap_or(false);

        if apply {
            let written = catalog.relocate_episode(
                episode.id,
                &found.path,
                &found.filename,
                found.folder_name.as_deref(),
                found.season_number,
                target_series.filter(|_| merged),
            );
            if let Err(e) = written {
                tracing::error!("Failed to migrate episode {}: {}", episode.id, e);
                report.failed.push(episode.path.clone());
                continue;
            }
        }

        if merged {
            report.merged += 1;
        }
        report.updated.push(PathUpdate {
            episode_id: episode.id,
            series_hint,
            old_path: episode.path.clone(),
            new_path: found.path.clone(),
            merged,
        });
    }

    tracing::info!(
        "Reconciliation {}: {} updated, {} merged, {} unresolved, {} unchanged, {} failed",
        if apply { "applied" } else { "dry run" },
        report.updated.len(),
        report.merged,
        report.unresolved.len(),
        report.unchanged,
        report.failed.len()
    );

    Ok(report)
}
