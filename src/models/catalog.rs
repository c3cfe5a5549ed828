//! Persisted catalog entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Row id of a series.
pub type SeriesId = i64;

/// Row id of an episode.
pub type EpisodeId = i64;

/// Fraction of the duration after which an episode counts as watched.
pub const COMPLETION_THRESHOLD: f64 = 0.9;

/// A top-level folder of the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    /// Display name, the folder name unless edited.
    pub name: String,
    /// Absolute folder path. Unique.
    pub path: PathBuf,
    /// Poster image, if one was found or set.
    pub thumbnail_path: Option<PathBuf>,
    /// Cached URL of the poster uploaded by the presence integration.
    pub presence_image_url: Option<String>,
    /// Sum of the sizes of its episodes.
    pub total_size_bytes: i64,
    pub date_added: DateTime<Utc>,
}

/// A single video file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub series_id: SeriesId,
    pub filename: String,
    /// Absolute file path. Unique.
    pub path: PathBuf,
    /// User-edited or filename-derived title.
    pub title: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    /// Immediate subfolder under the series root, `None` for root-level files.
    pub folder_name: Option<String>,
    /// `0.0` means unknown and still to be probed.
    pub duration_seconds: f64,
    pub size_bytes: i64,
    pub date_added: DateTime<Utc>,
}

impl Episode {
    /// Title to show, falling back to the filename.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.filename,
        }
    }

    /// Whether the stored title is missing or blank.
    pub fn has_title(&self) -> bool {
        self.title
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Fields needed to insert a new episode row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEpisode {
    pub series_id: SeriesId,
    pub filename: String,
    pub path: PathBuf,
    pub title: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub folder_name: Option<String>,
    pub size_bytes: i64,
}

/// Kind of a container stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Subtitle,
    Video,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
            TrackKind::Video => "video",
        }
    }

    /// Parse an ffprobe `codec_type`. Data and attachment streams yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(TrackKind::Audio),
            "subtitle" => Some(TrackKind::Subtitle),
            "video" => Some(TrackKind::Video),
            _ => None,
        }
    }

    /// Capitalized label used for untitled tracks.
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Audio => "Audio",
            TrackKind::Subtitle => "Subtitle",
            TrackKind::Video => "Video",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored audio, video or subtitle stream of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub episode_id: EpisodeId,
    /// Container stream index.
    pub stream_index: u32,
    pub kind: TrackKind,
    pub codec: String,
    pub language: String,
    pub title: String,
    /// 0-based position among subtitle streams only.
    pub subtitle_ordinal: Option<u32>,
}

/// Playback position of an episode. At most one per episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgress {
    pub episode_id: EpisodeId,
    pub timestamp_seconds: f64,
    pub completed: bool,
    pub last_watched: DateTime<Utc>,
}

/// Completion derived from position and duration.
///
/// Returns `None` when the duration is unknown, in which case completion
/// has to be set explicitly.
pub fn derive_completion(timestamp_seconds: f64, duration_seconds: f64, threshold: f64) -> Option<bool> {
    if duration_seconds > 0.0 {
        Some(timestamp_seconds / duration_seconds >= threshold)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_completion_threshold() {
        assert_eq!(derive_completion(901.0, 1000.0, COMPLETION_THRESHOLD), Some(true));
        assert_eq!(derive_completion(900.0, 1000.0, COMPLETION_THRESHOLD), Some(true));
        assert_eq!(derive_completion(899.0, 1000.0, COMPLETION_THRESHOLD), Some(false));
        assert_eq!(derive_completion(500.0, 0.0, COMPLETION_THRESHOLD), None);
    }

    #[test]
    fn test_track_kind_parse() {
        assert_eq!(TrackKind::parse("audio"), Some(TrackKind::Audio));
        assert_eq!(TrackKind::parse("subtitle"), Some(TrackKind::Subtitle));
        assert_eq!(TrackKind::parse("attachment"), None);
        assert_eq!(TrackKind::Video.to_string(), "video");
    }

    #[test]
    fn test_display_title_falls_back_to_filename() {
        let mut episode = Episode {
            id: 1,
            series_id: 1,
            filename: "Show - 01.mkv".to_string(),
            path: PathBuf::from("/lib/Show/Show - 01.mkv"),
            title: None,
            season_number: None,
            episode_number: Some(1),
            folder_name: None,
            duration_seconds: 0.0,
            size_bytes: 0,
            date_added: Utc::now(),
        };
        assert_eq!(episode.display_title(), "Show - 01.mkv");
        assert!(!episode.has_title());

        episode.title = Some("  ".to_string());
        assert_eq!(episode.display_title(), "Show - 01.mkv");

        episode.title = Some("Pilot".to_string());
        assert_eq!(episode.display_title(), "Pilot");
        assert!(episode.has_title());
    }
}
