//! Scan output models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Season/episode guess parsed from a filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeNumber {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// A video file found on disk under a series root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalEpisode {
    /// File name without path.
    pub filename: String,
    /// Full path to the file.
    pub path: PathBuf,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    /// Immediate child-of-root directory, `None` for files in the root.
    pub folder_name: Option<String>,
}

impl PhysicalEpisode {
    /// Sort key used by consumers: season, episode, then filename.
    pub fn sort_key(&self) -> (Option<u32>, Option<u32>, &str) {
        (self.season_number, self.episode_number, self.filename.as_str())
    }
}
