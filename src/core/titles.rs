//! Title extraction preview over the stored catalog.

use crate::core::identity;
use crate::models::catalog::{Episode, SeriesId};
use crate::store::Catalog;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;

/// What title extraction would suggest for one stored episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePreview {
    pub episode_id: i64,
    pub filename: String,
    /// `Season N: <title>`, or `None` when nothing was extracted.
    pub suggested: Option<String>,
}

impl TitlePreview {
    fn for_episode(episode: &Episode) -> Self {
        let season = episode.season_number.unwrap_or(1);
        Self {
            episode_id: episode.id,
            filename: episode.filename.clone(),
            suggested: identity::extract_title(&episode.filename)
                .map(|title| format!("Season {}: {}", season, title)),
        }
    }

    /// Extraction found a title; otherwise the filename is shown.
    pub fn matched(&self) -> bool {
        self.suggested.is_some()
    }
}

/// Previews for one series, in season/episode order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTitlePreview {
    pub series_id: SeriesId,
    pub series_name: String,
    pub episodes: Vec<TitlePreview>,
}

/// Dry run of title extraction for every stored episode. Writes nothing.
pub fn preview_titles(catalog: &Catalog) -> Result<Vec<SeriesTitlePreview>> {
    let names: HashMap<SeriesId, String> = catalog
        .list_series()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let mut episodes = catalog.list_all_episodes()?;
    episodes.sort_by_key(|e| {
        (
            e.series_id,
            e.season_number.unwrap_or(0),
            e.episode_number.unwrap_or(0),
        )
    });

    let mut previews: Vec<SeriesTitlePreview> = Vec::new();
    for episode in &episodes {
        let start_new = previews
            .last()
            .map(|p| p.series_id != episode.series_id)
            .unwrap_or(true);
        if start_new {
            previews.push(SeriesTitlePreview {
                series_id: episode.series_id,
                series_name: names
                    .get(&episode.series_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Unknown Series (ID: {})", episode.series_id)),
                episodes: Vec::new(),
            });
        }
        if let Some(current) = previews.last_mut() {
            current.episodes.push(TitlePreview::for_episode(episode));
        }
    }

    Ok(previews)
}
