//! Filename heuristics: season/episode numbers and episode titles.
//!
//! Both extractors are ordered pattern chains where the first match wins.
//! The order is part of the behavior and is exposed as constants so it can
//! be tested and reused.

use crate::models::scan::EpisodeNumber;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Episode number patterns, highest confidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePattern {
    /// `S01E05`, case-insensitive. The only pattern that yields a season.
    SeasonEpisode,
    /// `Show - 05`
    DashNumber,
    /// `Episode 05`, `Episode.05`, case-insensitive.
    EpisodeWord,
    /// First standalone run of 1-3 digits.
    BareNumber,
}

/// Order in which episode patterns are tried.
pub const EPISODE_PATTERN_PRIORITY: [EpisodePattern; 4] = [
    EpisodePattern::SeasonEpisode,
    EpisodePattern::DashNumber,
    EpisodePattern::EpisodeWord,
    EpisodePattern::BareNumber,
];

impl EpisodePattern {
    fn source(self) -> &'static str {
        match self {
            EpisodePattern::SeasonEpisode => r"(?i)s(\d+)e(\d+)",
            EpisodePattern::DashNumber => r" - (\d+)\b",
            EpisodePattern::EpisodeWord => r"(?i)episode[\s._\-]*(\d+)",
            EpisodePattern::BareNumber => r"\b(\d{1,3})\b",
        }
    }

    fn regex(self) -> Option<&'static Regex> {
        static CELLS: [OnceLock<Option<Regex>>; 4] = [
            OnceLock::new(),
            OnceLock::new(),
            OnceLock::new(),
            OnceLock::new(),
        ];
        let cell = &CELLS[self as usize];
        cell.get_or_init(|| Regex::new(self.source()).ok()).as_ref()
    }

    /// Apply this pattern alone.
    pub fn apply(self, filename: &str) -> Option<EpisodeNumber> {
        let caps = self.regex()?.captures(filename)?;
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        match self {
            EpisodePattern::SeasonEpisode => Some(EpisodeNumber {
                season: number(1),
                episode: number(2),
            }),
            _ => Some(EpisodeNumber {
                season: None,
                episode: number(1),
            }),
        }
    }
}

/// Title patterns, tried against the tag-stripped file stem.
const TITLE_PATTERNS: [&str; 4] = [
    // Show - S01E01 - Title
    r"(?i).*?\s-\sS\d+E\d+\s-\s(.*?)$",
    // S01E01-Title
    r"(?i)S\d+E\d+-(.*?)$",
    // Show - 01 - Title
    r"(?i).*?\s-\s\d+\s-\s(.*?)$",
    // anything after S01E01 or EP 01 and a separator
    r"(?i)(?:S\d+E\d+|EP\s?\d+)[\s._\-]*(.*?)$",
];

/// Release tags in brackets or parentheses.
const TAG_PATTERNS: [&str; 2] = [r"\[.*?\]", r"\(.*?\)"];

fn compile_all<const N: usize>(
    cell: &'static OnceLock<Vec<Regex>>,
    sources: &[&str; N],
) -> &'static [Regex] {
    cell.get_or_init(|| sources.iter().filter_map(|s| Regex::new(s).ok()).collect())
}

fn title_patterns() -> &'static [Regex] {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    compile_all(&CELL, &TITLE_PATTERNS)
}

fn tag_patterns() -> &'static [Regex] {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    compile_all(&CELL, &TAG_PATTERNS)
}

fn season_token() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)season\s*(\d+)").ok())
        .as_ref()
}

fn standard_folder() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^(season\s*\d+|specials)$").ok())
        .as_ref()
}

fn season_folder() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^season\s*\d+$").ok())
        .as_ref()
}

/// Find the highest-priority pattern that matches and what it captured.
///
/// Once a pattern matches, lower ones are not consulted even if the captured
/// number fails to parse.
pub fn match_episode_pattern(filename: &str) -> Option<(EpisodePattern, EpisodeNumber)> {
    EPISODE_PATTERN_PRIORITY
        .iter()
        .find_map(|pattern| pattern.apply(filename).map(|number| (*pattern, number)))
}

/// Guess season and episode from a filename.
pub fn parse_episode_number(filename: &str) -> EpisodeNumber {
    match_episode_pattern(filename)
        .map(|(_, number)| number)
        .unwrap_or_default()
}

/// File stem with bracketed and parenthesized tags removed.
pub fn strip_tags(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());

    tag_patterns()
        .iter()
        .fold(stem, |name, re| re.replace_all(&name, "").to_string())
        .trim()
        .to_string()
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
}

/// Extract an episode title from a filename, if one of the patterns finds a
/// non-empty one.
pub fn extract_title(filename: &str) -> Option<String> {
    let cleaned = strip_tags(filename);

    for re in title_patterns() {
        if let Some(caps) = re.captures(&cleaned) {
            let title = caps.get(1).map(|m| trim_separators(m.as_str())).unwrap_or("");
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }

    None
}

/// Extracted title, or the tag-stripped stem when nothing was found.
pub fn display_title(filename: &str) -> String {
    extract_title(filename).unwrap_or_else(|| strip_tags(filename))
}

/// Season number from a `Season N` token anywhere in a path component.
pub fn season_from_component(name: &str) -> Option<u32> {
    season_token()?
        .captures(name)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}

/// `Season N` or `Specials`, the conventional subfolder names.
pub fn is_standard_folder_name(name: &str) -> bool {
    standard_folder().map(|re| re.is_match(name)).unwrap_or(false)
}

/// Strictly `Season N`.
pub fn is_season_folder_name(name: &str) -> bool {
    season_folder().map(|re| re.is_match(name)).unwrap_or(false)
}
