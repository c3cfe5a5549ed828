//! FFprobe service for extracting duration and stream layout.

use crate::models::catalog::TrackKind;
use crate::models::probe::{ProbeOutput, ProbedTrack};
use crate::services::MediaProber;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// FFprobe output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

/// FFprobe stream information.
#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// FFprobe format information.
#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse the JSON printed by `ffprobe -print_format json -show_streams -show_format`.
///
/// Streams other than audio, video and subtitle are skipped. Missing language
/// tags become `"und"`, missing titles become `"<Kind> <index>"`.
pub fn parse_probe_output(json: &[u8]) -> Result<ProbeOutput> {
    let ffprobe: FfprobeOutput = serde_json::from_slice(json)?;

    let duration_seconds = ffprobe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let mut tracks = Vec::new();
    let mut subtitle_count = 0u32;

    for stream in ffprobe.streams {
        let Some(kind) = stream.codec_type.as_deref().and_then(TrackKind::parse) else {
            continue;
        };

        let language = stream
            .tags
            .get("language")
            .cloned()
            .unwrap_or_else(|| "und".to_string());
        let title = stream
            .tags
            .get("title")
            .cloned()
            .unwrap_or_else(|| format!("{} {}", kind.label(), stream.index));

        let subtitle_ordinal = if kind == TrackKind::Subtitle {
            subtitle_count += 1;
            Some(subtitle_count - 1)
        } else {
            None
        };

        tracks.push(ProbedTrack {
            stream_index: stream.index,
            kind,
            codec: stream.codec_name.unwrap_or_default(),
            language,
            title,
            subtitle_ordinal,
        });
    }

    Ok(ProbeOutput {
        duration_seconds,
        tracks,
    })
}

/// Check if ffprobe is installed.
pub async fn is_installed(ffprobe_path: &Path) -> bool {
    Command::new(ffprobe_path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Get ffprobe version.
pub async fn get_version(ffprobe_path: &Path) -> Result<String> {
    let output = Command::new(ffprobe_path).arg("-version").output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("unknown");

    Ok(first_line.to_string())
}

/// Prober backed by the external `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    async fn run(&self, path: &Path) -> Result<ProbeOutput> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::probe_failed(path, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::probe_failed(
                path,
                format!("exit status {}: {}", output.status, stderr.trim()),
            ));
        }

        parse_probe_output(&output.stdout).map_err(|e| Error::probe_failed(path, e.to_string()))
    }
}

impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput> {
        tracing::debug!("Probing file: {}", path.display());

        // kill_on_drop reaps the child when the timeout drops the future.
        match tokio::time::timeout(self.timeout, self.run(path)).await {
            Ok(result) => {
                if let Ok(output) = &result {
                    tracing::debug!("Found {} streams for {}", output.tracks.len(), path.display());
                }
                result
            }
            Err(_) => Err(Error::ProbeTimeout {
                path: path.display().to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "hevc"},
                {"index": 1, "codec_type": "audio", "codec_name": "aac",
                 "tags": {"language": "jpn", "title": "Japanese"}},
                {"index": 2, "codec_type": "subtitle", "codec_name": "ass",
                 "tags": {"language": "eng"}},
                {"index": 3, "codec_type": "attachment", "codec_name": "ttf"},
                {"index": 4, "codec_type": "subtitle", "codec_name": "subrip"}
            ],
            "format": {"duration": "1420.512000"}
        }"#;

        let output = parse_probe_output(json).unwrap();
        assert!((output.duration_seconds - 1420.512).abs() < 1e-6);
        assert_eq!(output.tracks.len(), 4);

        let video = &output.tracks[0];
        assert_eq!(video.kind, TrackKind::Video);
        assert_eq!(video.language, "und");
        assert_eq!(video.title, "Video 0");
        assert_eq!(video.subtitle_ordinal, None);

        let audio = &output.tracks[1];
        assert_eq!(audio.language, "jpn");
        assert_eq!(audio.title, "Japanese");

        let subs: Vec<_> = output
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Subtitle)
            .map(|t| (t.stream_index, t.subtitle_ordinal, t.title.as_str()))
            .collect();
        assert_eq!(subs, vec![(2, Some(0), "Subtitle 2"), (4, Some(1), "Subtitle 4")]);
    }

    #[test]
    fn test_parse_probe_output_without_format() {
        let output = parse_probe_output(br#"{"streams": []}"#).unwrap();
        assert_eq!(output.duration_seconds, 0.0);
        assert!(output.tracks.is_empty());

        let output = parse_probe_output(br#"{"format": {"duration": "N/A"}}"#).unwrap();
        assert_eq!(output.duration_seconds, 0.0);
    }

    #[test]
    fn test_parse_probe_output_rejects_garbage() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_probe_failure() {
        let prober = FfprobeProber::new(
            "/nonexistent/ffprobe-binary",
            Duration::from_secs(5),
        );
        let err = prober.probe(Path::new("/tmp/x.mkv")).await.unwrap_err();
        assert!(matches!(err, Error::ProbeFailed { .. }));
        assert!(!is_installed(prober.ffprobe_path()).await);
    }
}
