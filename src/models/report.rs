//! Structured results of sync, reconciliation and audit runs.

use crate::models::catalog::EpisodeId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub series_seen: usize,
    pub series_created: usize,
    pub episodes_seen: usize,
    pub episodes_created: usize,
    pub episodes_updated: usize,
    /// Episodes whose tracks and duration were (re)probed successfully.
    pub probed: usize,
    pub probe_failures: usize,
    /// Files that could not be read and were left as previously stored.
    pub file_errors: Vec<PathBuf>,
}

impl SyncSummary {
    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: SyncSummary) {
        self.series_seen += other.series_seen;
        self.series_created += other.series_created;
        self.episodes_seen += other.episodes_seen;
        self.episodes_created += other.episodes_created;
        self.episodes_updated += other.episodes_updated;
        self.probed += other.probed;
        self.probe_failures += other.probe_failures;
        self.file_errors.extend(other.file_errors);
    }
}

/// One episode whose recorded location changed (or would change).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathUpdate {
    pub episode_id: EpisodeId,
    /// Top-level folder the file now lives in.
    pub series_hint: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// The file now lives under a different series' folder.
    pub merged: bool,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub updated: Vec<PathUpdate>,
    /// Recorded paths that could not be resolved to a unique file.
    pub unresolved: Vec<PathBuf>,
    pub unchanged: usize,
    pub merged: usize,
    /// Resolved episodes that could not be written.
    pub failed: Vec<PathBuf>,
    pub total_files_found: usize,
    /// False for a dry run.
    pub applied: bool,
}

/// Overall verdict of a series audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    /// No video files at all.
    Empty,
    /// Scanned, nothing to report.
    Ok,
    Issues,
}

/// How loudly an issue should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A structural problem found in a series folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Issue {
    /// Videos in the root and in subfolders at the same time.
    MixedContent {
        root_videos: usize,
        media_folders: usize,
        /// Up to three example root filenames.
        files: Vec<String>,
    },
    NonStandardFolder { folder: String },
    /// Several seasons but no season folders.
    MissingSeasonFolders { seasons: Vec<u32> },
    /// One season with episodes only in the root.
    MissingSeasonFolder { season: u32 },
    InconsistentSeasons { folder: String, seasons: Vec<u32> },
}

impl Issue {
    /// Stable snake-case identifier.
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::MixedContent { .. } => "mixed_content",
            Issue::NonStandardFolder { .. } => "non_standard_folder",
            Issue::MissingSeasonFolders { .. } => "missing_season_folders",
            Issue::MissingSeasonFolder { .. } => "missing_season_folder",
            Issue::InconsistentSeasons { .. } => "inconsistent_seasons",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Issue::MissingSeasonFolder { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Issue::MixedContent {
                root_videos,
                media_folders,
                ..
            } => format!(
                "Found {} videos in root and {} subfolders containing media.",
                root_videos, media_folders
            ),
            Issue::NonStandardFolder { folder } => format!(
                "Subfolder '{}' does not follow 'Season X' or 'Specials' naming convention.",
                folder
            ),
            Issue::MissingSeasonFolders { seasons } => format!(
                "Multiple seasons ({}) detected but no season folders used.",
                join_numbers(seasons)
            ),
            Issue::MissingSeasonFolder { season } => format!(
                "Single season ({}) detected but no 'Season {}' folder used (episodes in root).",
                season, season
            ),
            Issue::InconsistentSeasons { folder, seasons } => format!(
                "Folder '{}' contains episodes from multiple seasons: {}.",
                folder,
                join_numbers(seasons)
            ),
        }
    }
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of auditing one series folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub status: AuditStatus,
    pub issues: Vec<Issue>,
    pub total_videos: usize,
    pub root_videos: usize,
    /// Subfolders that contain videos, sorted.
    pub media_folders: Vec<String>,
}

impl AuditReport {
    pub fn empty() -> Self {
        Self {
            status: AuditStatus::Empty,
            issues: Vec::new(),
            total_videos: 0,
            root_videos: 0,
            media_folders: Vec::new(),
        }
    }

    pub fn has_issue(&self, kind: &str) -> bool {
        self.issues.iter().any(|i| i.kind() == kind)
    }
}
