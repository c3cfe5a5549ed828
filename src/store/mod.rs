//! SQLite-backed catalog store.
//!
//! Every row that has a natural key (series path, episode path, progress per
//! episode, track per stream index) is written with a single conflict-aware
//! statement, so concurrent or repeated syncs never create duplicates.

mod schema;

pub use schema::table_columns;

use crate::models::catalog::{
    derive_completion, Episode, EpisodeId, MediaTrack, NewEpisode, Series, SeriesId, TrackKind,
    WatchProgress, COMPLETION_THRESHOLD,
};
use crate::models::probe::ProbedTrack;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const SERIES_COLUMNS: &str =
    "id, name, path, thumbnail_path, presence_image_url, size_bytes, date_added";

const EPISODE_COLUMNS: &str = "id, series_id, filename, path, title, season_number, \
     episode_number, folder_name, duration, size_bytes, date_added";

const TRACK_COLUMNS: &str =
    "episode_id, stream_index, track_type, codec, language, title, subtitle_ordinal";

const PROGRESS_COLUMNS: &str = "episode_id, timestamp, completed, last_watched";

fn path_text(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn map_series(row: &Row) -> rusqlite::Result<Series> {
    Ok(Series {
        id: row.get(0)?,
        name: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        thumbnail_path: non_empty(row.get(3)?).map(PathBuf::from),
        presence_image_url: non_empty(row.get(4)?),
        total_size_bytes: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
        date_added: row
            .get::<_, Option<DateTime<Utc>>>(6)?
            .unwrap_or_else(Utc::now),
    })
}

fn map_episode(row: &Row) -> rusqlite::Result<Episode> {
    Ok(Episode {
        id: row.get(0)?,
        series_id: row.get(1)?,
        filename: row.get(2)?,
        path: PathBuf::from(row.get::<_, String>(3)?),
        title: row.get(4)?,
        season_number: row.get(5)?,
        episode_number: row.get(6)?,
        folder_name: non_empty(row.get(7)?),
        duration_seconds: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
        size_bytes: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
        date_added: row
            .get::<_, Option<DateTime<Utc>>>(10)?
            .unwrap_or_else(Utc::now),
    })
}

fn map_track(row: &Row) -> rusqlite::Result<MediaTrack> {
    let kind: String = row.get(2)?;
    let kind = TrackKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(2, kind.clone(), rusqlite::types::Type::Text)
    })?;

    Ok(MediaTrack {
        episode_id: row.get(0)?,
        stream_index: row.get(1)?,
        kind,
        codec: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        language: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        title: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        subtitle_ordinal: row.get(6)?,
    })
}

fn map_progress(row: &Row) -> rusqlite::Result<WatchProgress> {
    Ok(WatchProgress {
        episode_id: row.get(0)?,
        timestamp_seconds: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
        completed: row.get::<_, Option<bool>>(2)?.unwrap_or(false),
        last_watched: row
            .get::<_, Option<DateTime<Utc>>>(3)?
            .unwrap_or_else(Utc::now),
    })
}

/// The persisted catalog.
pub struct Catalog {
    conn: Connection,
    completion_threshold: f64,
}

impl Catalog {
    /// Open (or create) a catalog file, migrating older schemas.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened catalog at {}", path.display());
        Self::from_connection(conn)
    }

    /// A throwaway catalog, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            completion_threshold: COMPLETION_THRESHOLD,
        })
    }

    /// Override the fraction after which progress counts as completed.
    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold;
        self
    }

    pub fn completion_threshold(&self) -> f64 {
        self.completion_threshold
    }

    /// Underlying connection, for inspection in tests and tooling.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== SERIES ==========

    /// Fetch the series stored for `path`, inserting it first if needed.
    ///
    /// Returns whether a row was created.
    pub fn get_or_create_series(&self, path: &Path, name: &str) -> Result<(Series, bool)> {
        let inserted = self.conn.execute(
            "INSERT INTO series (name, path, size_bytes, date_added) VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(path) DO NOTHING",
            params![name, path_text(path), Utc::now()],
        )?;

        let series = self
            .find_series_by_path(path)?
            .ok_or_else(|| Error::other(format!("Series vanished after upsert: {}", path.display())))?;

        if inserted > 0 {
            tracing::info!("New series added: {} (ID: {})", series.name, series.id);
        }
        Ok((series, inserted > 0))
    }

    pub fn get_series(&self, id: SeriesId) -> Result<Option<Series>> {
        let series = self
            .conn
            .query_row(
                &format!("SELECT {} FROM series WHERE id = ?1", SERIES_COLUMNS),
                params![id],
                map_series,
            )
            .optional()?;
        Ok(series)
    }

    pub fn find_series_by_path(&self, path: &Path) -> Result<Option<Series>> {
        let series = self
            .conn
            .query_row(
                &format!("SELECT {} FROM series WHERE path = ?1", SERIES_COLUMNS),
                params![path_text(path)],
                map_series,
            )
            .optional()?;
        Ok(series)
    }

    /// All series ordered by name.
    pub fn list_series(&self) -> Result<Vec<Series>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM series ORDER BY name COLLATE NOCASE, id",
            SERIES_COLUMNS
        ))?;
        let series = stmt
            .query_map([], map_series)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    }

    /// Delete a series with its episodes, tracks and progress.
    pub fn delete_series(&self, id: SeriesId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM series WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn update_series_poster(&self, id: SeriesId, poster: Option<&Path>) -> Result<()> {
        tracing::info!(
            "Updating poster for series {} to: {}",
            id,
            poster.map(|p| p.display().to_string()).unwrap_or_default()
        );
        self.conn.execute(
            "UPDATE series SET thumbnail_path = ?1 WHERE id = ?2",
            params![poster.map(path_text), id],
        )?;
        Ok(())
    }

    pub fn update_series_presence_image_url(&self, id: SeriesId, url: Option<&str>) -> Result<()> {
        self.conn.execute(
            "UPDATE series SET presence_image_url = ?1 WHERE id = ?2",
            params![url, id],
        )?;
        Ok(())
    }

    pub fn update_series_size(&self, id: SeriesId, size_bytes: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE series SET size_bytes = ?1 WHERE id = ?2",
            params![size_bytes, id],
        )?;
        Ok(())
    }

    // ========== EPISODES ==========

    /// Fetch the episode stored for `new.path`, inserting it first if needed.
    ///
    /// An existing row is returned untouched. Returns whether a row was created.
    pub fn get_or_create_episode(&self, new: &NewEpisode) -> Result<(Episode, bool)> {
        let inserted = self.conn.execute(
            "INSERT INTO episodes
                (series_id, filename, path, title, duration, size_bytes,
                 episode_number, season_number, folder_name, date_added)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(path) DO NOTHING",
            params![
                new.series_id,
                new.filename,
                path_text(&new.path),
                new.title,
                new.size_bytes,
                new.episode_number,
                new.season_number,
                new.folder_name,
                Utc::now(),
            ],
        )?;

        let episode = self.find_episode_by_path(&new.path)?.ok_or_else(|| {
            Error::other(format!("Episode vanished after upsert: {}", new.path.display()))
        })?;

        if inserted > 0 {
            tracing::debug!("New episode added: {} (ID: {})", episode.filename, episode.id);
        }
        Ok((episode, inserted > 0))
    }

    pub fn get_episode(&self, id: EpisodeId) -> Result<Option<Episode>> {
        let episode = self
            .conn
            .query_row(
                &format!("SELECT {} FROM episodes WHERE id = ?1", EPISODE_COLUMNS),
                params![id],
                map_episode,
            )
            .optional()?;
        Ok(episode)
    }

    pub fn find_episode_by_path(&self, path: &Path) -> Result<Option<Episode>> {
        let episode = self
            .conn
            .query_row(
                &format!("SELECT {} FROM episodes WHERE path = ?1", EPISODE_COLUMNS),
                params![path_text(path)],
                map_episode,
            )
            .optional()?;
        Ok(episode)
    }

    /// Episodes of a series ordered by season, episode, filename.
    pub fn list_episodes(&self, series_id: SeriesId) -> Result<Vec<Episode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM episodes WHERE series_id = ?1
             ORDER BY season_number, episode_number, filename",
            EPISODE_COLUMNS
        ))?;
        let episodes = stmt
            .query_map(params![series_id], map_episode)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(episodes)
    }

    pub fn list_all_episodes(&self) -> Result<Vec<Episode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM episodes ORDER BY id", EPISODE_COLUMNS))?;
        let episodes = stmt
            .query_map([], map_episode)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(episodes)
    }

    /// Refresh the folder-derived identity fields.
    pub fn update_episode_identity(
        &self,
        id: EpisodeId,
        season_number: Option<u32>,
        episode_number: Option<u32>,
        folder_name: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE episodes SET season_number = ?1, episode_number = ?2, folder_name = ?3
             WHERE id = ?4",
            params![season_number, episode_number, folder_name, id],
        )?;
        Ok(())
    }

    pub fn update_episode_title(&self, id: EpisodeId, title: Option<&str>) -> Result<()> {
        self.conn.execute(
            "UPDATE episodes SET title = ?1 WHERE id = ?2",
            params![title, id],
        )?;
        Ok(())
    }

    pub fn update_episode_size(&self, id: EpisodeId, size_bytes: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE episodes SET size_bytes = ?1 WHERE id = ?2",
            params![size_bytes, id],
        )?;
        Ok(())
    }

    pub fn update_episode_duration(&self, id: EpisodeId, duration_seconds: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE episodes SET duration = ?1 WHERE id = ?2",
            params![duration_seconds, id],
        )?;
        Ok(())
    }

    /// Point an episode at its new location on disk, moving it to
    /// `series_id` when given. One statement, so a failure leaves the row as
    /// it was.
    pub fn relocate_episode(
        &self,
        id: EpisodeId,
        path: &Path,
        filename: &str,
        folder_name: Option<&str>,
        season_number: Option<u32>,
        series_id: Option<SeriesId>,
    ) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE episodes SET path = ?1, filename = ?2, folder_name = ?3, season_number = ?4,
                 series_id = COALESCE(?5, series_id)
             WHERE id = ?6",
            params![path_text(path), filename, folder_name, season_number, series_id, id],
        )?;
        if updated == 0 {
            return Err(Error::EpisodeNotFound(id));
        }
        Ok(())
    }

    /// Move an episode to another series.
    pub fn reassign_episode_series(&self, id: EpisodeId, series_id: SeriesId) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE episodes SET series_id = ?1 WHERE id = ?2",
            params![series_id, id],
        )?;
        if updated == 0 {
            return Err(Error::EpisodeNotFound(id));
        }
        Ok(())
    }

    // ========== TRACKS ==========

    pub fn tracks_for_episode(&self, episode_id: EpisodeId) -> Result<Vec<MediaTrack>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM media_tracks WHERE episode_id = ?1 ORDER BY stream_index",
            TRACK_COLUMNS
        ))?;
        let tracks = stmt
            .query_map(params![episode_id], map_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    pub fn track_count(&self, episode_id: EpisodeId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM media_tracks WHERE episode_id = ?1",
            params![episode_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Replace every track of an episode and record its duration.
    pub fn replace_tracks(
        &mut self,
        episode_id: EpisodeId,
        duration_seconds: f64,
        tracks: &[ProbedTrack],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM media_tracks WHERE episode_id = ?1",
            params![episode_id],
        )?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO media_tracks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                TRACK_COLUMNS
            ))?;
            for track in tracks {
                stmt.execute(params![
                    episode_id,
                    track.stream_index,
                    track.kind.as_str(),
                    track.codec,
                    track.language,
                    track.title,
                    track.subtitle_ordinal,
                ])?;
            }
        }
        tx.execute(
            "UPDATE episodes SET duration = ?1 WHERE id = ?2",
            params![duration_seconds, episode_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    // ========== PROGRESS ==========

    pub fn get_progress(&self, episode_id: EpisodeId) -> Result<Option<WatchProgress>> {
        let progress = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM watch_progress WHERE episode_id = ?1",
                    PROGRESS_COLUMNS
                ),
                params![episode_id],
                map_progress,
            )
            .optional()?;
        Ok(progress)
    }

    /// Record a playback position.
    ///
    /// When the episode duration is known, completion is derived from the
    /// threshold and `completed_hint` is ignored.
    pub fn set_progress(
        &self,
        episode_id: EpisodeId,
        timestamp_seconds: f64,
        completed_hint: bool,
    ) -> Result<WatchProgress> {
        let episode = self
            .get_episode(episode_id)?
            .ok_or(Error::EpisodeNotFound(episode_id))?;

        let completed = derive_completion(
            timestamp_seconds,
            episode.duration_seconds,
            self.completion_threshold,
        )
        .unwrap_or(completed_hint);

        let progress = WatchProgress {
            episode_id,
            timestamp_seconds,
            completed,
            last_watched: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO watch_progress (episode_id, timestamp, last_watched, completed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(episode_id) DO UPDATE SET
                timestamp = excluded.timestamp,
                last_watched = excluded.last_watched,
                completed = excluded.completed",
            params![
                progress.episode_id,
                progress.timestamp_seconds,
                progress.last_watched,
                progress.completed
            ],
        )?;

        Ok(progress)
    }

    /// Remove the progress row ("never watched").
    pub fn clear_progress(&self, episode_id: EpisodeId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM watch_progress WHERE episode_id = ?1",
            params![episode_id],
        )?;
        Ok(deleted > 0)
    }

    /// Mark one episode as fully watched, or drop its progress.
    pub fn mark_episode_watched(&self, episode_id: EpisodeId, watched: bool) -> Result<()> {
        if !watched {
            self.clear_progress(episode_id)?;
            return Ok(());
        }

        let written = self.conn.execute(
            "INSERT INTO watch_progress (episode_id, timestamp, last_watched, completed)
             SELECT id, duration, ?1, 1 FROM episodes WHERE id = ?2
             ON CONFLICT(episode_id) DO UPDATE SET
                timestamp = excluded.timestamp,
                last_watched = excluded.last_watched,
                completed = 1",
            params![Utc::now(), episode_id],
        )?;
        if written == 0 {
            return Err(Error::EpisodeNotFound(episode_id));
        }
        Ok(())
    }

    /// Mark every episode of a series watched or unwatched.
    ///
    /// Returns the number of progress rows written or removed.
    pub fn mark_series_watched(&self, series_id: SeriesId, watched: bool) -> Result<usize> {
        if self.get_series(series_id)?.is_none() {
            return Err(Error::SeriesNotFound(series_id));
        }

        let affected = if watched {
            self.conn.execute(
                "INSERT INTO watch_progress (episode_id, timestamp, last_watched, completed)
                 SELECT id, duration, ?1, 1 FROM episodes WHERE series_id = ?2
                 ON CONFLICT(episode_id) DO UPDATE SET
                    timestamp = excluded.timestamp,
                    last_watched = excluded.last_watched,
                    completed = 1",
                params![Utc::now(), series_id],
            )?
        } else {
            self.conn.execute(
                "DELETE FROM watch_progress
                 WHERE episode_id IN (SELECT id FROM episodes WHERE series_id = ?1)",
                params![series_id],
            )?
        };

        tracing::info!(
            "Marked {} episodes of series {} as {}",
            affected,
            series_id,
            if watched { "watched" } else { "unwatched" }
        );
        Ok(affected)
    }

    /// Most recently watched episodes first.
    pub fn recent_progress(&self, limit: usize) -> Result<Vec<WatchProgress>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM watch_progress ORDER BY last_watched DESC LIMIT ?1",
            PROGRESS_COLUMNS
        ))?;
        let progress = stmt
            .query_map(params![limit as i64], map_progress)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(progress)
    }
}
