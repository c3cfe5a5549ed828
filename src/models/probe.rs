//! What the media prober reports for a file.

use crate::models::catalog::TrackKind;
use serde::{Deserialize, Serialize};

/// One stream reported by the prober.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbedTrack {
    pub stream_index: u32,
    pub kind: TrackKind,
    pub codec: String,
    pub language: String,
    pub title: String,
    /// 0-based position among subtitle streams, subtitles only.
    pub subtitle_ordinal: Option<u32>,
}

/// Duration and streams of a media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutput {
    pub duration_seconds: f64,
    pub tracks: Vec<ProbedTrack>,
}
