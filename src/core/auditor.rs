//! Read-only organization checks for series folders.

use crate::core::{identity, scanner};
use crate::models::report::{AuditReport, AuditStatus, Issue};
use crate::models::scan::PhysicalEpisode;
use crate::utils::fs::{canonical_root, child_directories, file_name_string};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Number of example root filenames reported for mixed content.
const MIXED_CONTENT_EXAMPLES: usize = 3;

/// Audit one series folder. Never touches the catalog.
pub fn audit_series(series_root: &Path) -> AuditReport {
    let root = canonical_root(series_root);
    let episodes = scanner::scan_series_folder(&root);
    audit_episodes(&episodes)
}

/// Audit every series folder of a library, sorted by folder name.
pub fn audit_library(library_root: &Path) -> Vec<(String, AuditReport)> {
    let root = canonical_root(library_root);
    let mut reports: Vec<(String, AuditReport)> = child_directories(&root)
        .iter()
        .map(|folder| (file_name_string(folder), audit_series(folder)))
        .collect();
    reports.sort_by(|a, b| a.0.cmp(&b.0));
    reports
}

/// Run every check over the scan of one series.
pub fn audit_episodes(episodes: &[PhysicalEpisode]) -> AuditReport {
    if episodes.is_empty() {
        return AuditReport::empty();
    }

    let mut root_files: Vec<&PhysicalEpisode> =
        episodes.iter().filter(|e| e.folder_name.is_none()).collect();
    root_files.sort_by(|a, b| a.filename.cmp(&b.filename));

    let media_folders: BTreeSet<&str> = episodes
        .iter()
        .filter_map(|e| e.folder_name.as_deref())
        .collect();

    let mut issues = Vec::new();

    if !root_files.is_empty() && !media_folders.is_empty() {
        issues.push(Issue::MixedContent {
            root_videos: root_files.len(),
            media_folders: media_folders.len(),
            files: root_files
                .iter()
                .take(MIXED_CONTENT_EXAMPLES)
                .map(|e| e.filename.clone())
                .collect(),
        });
    }

    for folder in &media_folders {
        if !identity::is_standard_folder_name(folder) {
            issues.push(Issue::NonStandardFolder {
                folder: folder.to_string(),
            });
        }
    }

    let seasons: BTreeSet<u32> = episodes.iter().filter_map(|e| e.season_number).collect();
    let has_season_folders = media_folders
        .iter()
        .any(|f| identity::is_season_folder_name(f));

    if seasons.len() > 1 && !has_season_folders {
        issues.push(Issue::MissingSeasonFolders {
            seasons: seasons.iter().copied().collect(),
        });
    } else if seasons.len() == 1 && !has_season_folders && !root_files.is_empty() {
        if let Some(&season) = seasons.iter().next() {
            issues.push(Issue::MissingSeasonFolder { season });
        }
    }

    let mut folder_seasons: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for episode in episodes {
        if let (Some(folder), Some(season)) = (episode.folder_name.as_deref(), episode.season_number) {
            folder_seasons.entry(folder).or_default().insert(season);
        }
    }
    for (folder, seasons) in folder_seasons {
        if seasons.len() > 1 {
            issues.push(Issue::InconsistentSeasons {
                folder: folder.to_string(),
                seasons: seasons.into_iter().collect(),
            });
        }
    }

    AuditReport {
        status: if issues.is_empty() {
            AuditStatus::Ok
        } else {
            AuditStatus::Issues
        },
        issues,
        total_videos: episodes.len(),
        root_videos: root_files.len(),
        media_folders: media_folders.iter().map(|f| f.to_string()).collect(),
    }
}
