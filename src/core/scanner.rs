//! Series folder scanner.
//!
//! Walks a series root, parses each video filename and fills in the season
//! from `Season N` folders when the filename has none. Nothing here touches
//! the catalog.

use crate::core::identity;
use crate::models::scan::PhysicalEpisode;
use crate::utils::fs::{child_directories, file_name_string, is_video_file};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Poster filenames checked in a series root, in priority order.
pub const POSTER_NAMES: &[&str] = &[
    "folder.jpg",
    "folder.png",
    "poster.jpg",
    "poster.png",
    "cover.jpg",
    "cover.png",
    "banner.jpg",
    "banner.png",
];

/// All video files under `root`, sorted and deduplicated.
///
/// Symlinked files are included; symlinked directories are not descended.
/// A missing or unreadable root yields an empty list.
pub fn video_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::debug!("Not a directory, nothing to scan: {}", root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.path().is_file() && is_video_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files.dedup();
    files
}

/// Path components below `root`, as strings.
fn relative_parts(root: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Build the descriptor of one video file under `root`.
pub fn describe_file(root: &Path, path: &Path) -> PhysicalEpisode {
    let filename = file_name_string(path);
    let parts = relative_parts(root, path);
    let mut number = identity::parse_episode_number(&filename);

    if number.season.is_none() && parts.len() > 1 {
        number.season = parts
            .iter()
            .find_map(|part| identity::season_from_component(part));
    }

    let folder_name = if parts.len() > 1 {
        parts.first().cloned()
    } else {
        None
    };

    PhysicalEpisode {
        filename,
        path: path.to_path_buf(),
        season_number: number.season,
        episode_number: number.episode,
        folder_name,
    }
}

/// Scan a single series folder.
///
/// Handles both `Series/Episode.mkv` and `Series/Season 1/Episode.mkv`.
/// Output order is by path; consumers sort by [`PhysicalEpisode::sort_key`].
pub fn scan_series_folder(root: &Path) -> Vec<PhysicalEpisode> {
    let episodes: Vec<PhysicalEpisode> = video_files(root)
        .iter()
        .map(|path| describe_file(root, path))
        .collect();

    tracing::debug!(
        "Scanned {}: {} video files",
        root.display(),
        episodes.len()
    );

    episodes
}

/// Scan every series folder of a library.
pub fn scan_library(library_root: &Path) -> Vec<PhysicalEpisode> {
    child_directories(library_root)
        .iter()
        .flat_map(|folder| scan_series_folder(folder))
        .collect()
}

/// Look for a poster image directly inside a series root.
///
/// Exact names are checked first, then a case-insensitive pass over the
/// directory listing. Read errors mean "no poster".
pub fn find_poster(root: &Path) -> Option<PathBuf> {
    for name in POSTER_NAMES {
        let candidate = root.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let entries = std::fs::read_dir(root).ok()?;
    let by_lower_name: HashMap<String, PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .map(|p| (file_name_string(&p).to_lowercase(), p))
        .collect();

    POSTER_NAMES
        .iter()
        .find_map(|name| by_lower_name.get(*name).cloned())
}
