//! Integration tests for the catalog store.

use aniplay::models::catalog::{NewEpisode, TrackKind};
use aniplay::models::probe::ProbedTrack;
use aniplay::store::{table_columns, Catalog};
use aniplay::Error;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn new_episode(series_id: i64, path: &str) -> NewEpisode {
    let path = PathBuf::from(path);
    NewEpisode {
        series_id,
        filename: path.file_name().unwrap().to_string_lossy().to_string(),
        path,
        title: None,
        season_number: Some(1),
        episode_number: Some(1),
        folder_name: None,
        size_bytes: 100,
    }
}

fn track(index: u32, kind: TrackKind, ordinal: Option<u32>) -> ProbedTrack {
    ProbedTrack {
        stream_index: index,
        kind,
        codec: "codec".to_string(),
        language: "und".to_string(),
        title: format!("{} {}", kind.label(), index),
        subtitle_ordinal: ordinal,
    }
}

#[test]
fn test_get_or_create_series_is_idempotent() {
    let catalog = Catalog::open_in_memory().unwrap();

    let (first, created) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    assert!(created);
    let (second, created) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    assert!(!created);

    assert_eq!(first.id, second.id);
    assert_eq!(catalog.list_series().unwrap().len(), 1);
}

#[test]
fn test_get_or_create_episode_keeps_existing_row() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();

    let mut new = new_episode(series.id, "/lib/Show/Show - 01.mkv");
    let (episode, created) = catalog.get_or_create_episode(&new).unwrap();
    assert!(created);
    assert_eq!(episode.duration_seconds, 0.0);

    new.title = Some("Other".to_string());
    let (again, created) = catalog.get_or_create_episode(&new).unwrap();
    assert!(!created);
    assert_eq!(again.id, episode.id);
    assert_eq!(again.title, None);
    assert_eq!(catalog.list_all_episodes().unwrap().len(), 1);
}

#[test]
fn test_list_episodes_order() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();

    let mut late = new_episode(series.id, "/lib/Show/b.mkv");
    late.season_number = Some(2);
    let mut early = new_episode(series.id, "/lib/Show/c.mkv");
    early.episode_number = Some(3);
    let first = new_episode(series.id, "/lib/Show/a.mkv");
    for ep in [&late, &early, &first] {
        catalog.get_or_create_episode(ep).unwrap();
    }

    let names: Vec<String> = catalog
        .list_episodes(series.id)
        .unwrap()
        .into_iter()
        .map(|e| e.filename)
        .collect();
    assert_eq!(names, vec!["a.mkv", "c.mkv", "b.mkv"]);
}

#[test]
fn test_progress_completion_threshold() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/01.mkv"))
        .unwrap();
    catalog.update_episode_duration(episode.id, 1000.0).unwrap();

    let progress = catalog.set_progress(episode.id, 901.0, false).unwrap();
    assert!(progress.completed);

    let progress = catalog.set_progress(episode.id, 899.0, true).unwrap();
    assert!(!progress.completed);

    let stored = catalog.get_progress(episode.id).unwrap().unwrap();
    assert_eq!(stored.timestamp_seconds, 899.0);
    assert!(!stored.completed);
}

#[test]
fn test_progress_without_duration_uses_hint() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/01.mkv"))
        .unwrap();

    assert!(!catalog.set_progress(episode.id, 5000.0, false).unwrap().completed);
    assert!(catalog.set_progress(episode.id, 10.0, true).unwrap().completed);

    let err = catalog.set_progress(9999, 1.0, false).unwrap_err();
    assert!(matches!(err, Error::EpisodeNotFound(9999)));
}

#[test]
fn test_mark_watched_and_unwatched() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    let (one, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/01.mkv"))
        .unwrap();
    let (two, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/02.mkv"))
        .unwrap();
    catalog.update_episode_duration(one.id, 1440.0).unwrap();

    catalog.mark_episode_watched(one.id, true).unwrap();
    let progress = catalog.get_progress(one.id).unwrap().unwrap();
    assert!(progress.completed);
    assert_eq!(progress.timestamp_seconds, 1440.0);

    catalog.mark_episode_watched(one.id, false).unwrap();
    assert!(catalog.get_progress(one.id).unwrap().is_none());

    assert_eq!(catalog.mark_series_watched(series.id, true).unwrap(), 2);
    assert!(catalog.get_progress(two.id).unwrap().unwrap().completed);
    assert_eq!(catalog.recent_progress(10).unwrap().len(), 2);
    assert_eq!(catalog.recent_progress(1).unwrap().len(), 1);

    assert_eq!(catalog.mark_series_watched(series.id, false).unwrap(), 2);
    assert!(catalog.recent_progress(10).unwrap().is_empty());

    assert!(matches!(
        catalog.mark_episode_watched(4242, true),
        Err(Error::EpisodeNotFound(4242))
    ));
    assert!(matches!(
        catalog.mark_series_watched(4242, true),
        Err(Error::SeriesNotFound(4242))
    ));
}

#[test]
fn test_replace_tracks_is_wholesale() {
    let mut catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/01.mkv"))
        .unwrap();

    catalog
        .replace_tracks(
            episode.id,
            1420.5,
            &[
                track(0, TrackKind::Video, None),
                track(1, TrackKind::Audio, None),
                track(2, TrackKind::Subtitle, Some(0)),
                track(3, TrackKind::Subtitle, Some(1)),
            ],
        )
        .unwrap();
    assert_eq!(catalog.track_count(episode.id).unwrap(), 4);
    assert_eq!(catalog.get_episode(episode.id).unwrap().unwrap().duration_seconds, 1420.5);

    catalog
        .replace_tracks(episode.id, 1421.0, &[track(1, TrackKind::Audio, None)])
        .unwrap();
    let tracks = catalog.tracks_for_episode(episode.id).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].stream_index, 1);
    assert_eq!(tracks[0].kind, TrackKind::Audio);
    assert_eq!(tracks[0].title, "Audio 1");
}

#[test]
fn test_delete_series_cascades() {
    let mut catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/Show/01.mkv"))
        .unwrap();
    catalog
        .replace_tracks(episode.id, 10.0, &[track(0, TrackKind::Video, None)])
        .unwrap();
    catalog.set_progress(episode.id, 5.0, false).unwrap();

    assert!(catalog.delete_series(series.id).unwrap());
    assert!(catalog.get_episode(episode.id).unwrap().is_none());
    assert_eq!(catalog.track_count(episode.id).unwrap(), 0);
    assert!(catalog.get_progress(episode.id).unwrap().is_none());
}

#[test]
fn test_relocate_moves_path_and_series_together() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (old_series, _) = catalog.get_or_create_series(Path::new("/lib/A"), "A").unwrap();
    let (new_series, _) = catalog.get_or_create_series(Path::new("/lib/B"), "B").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(old_series.id, "/lib/A/01.mkv"))
        .unwrap();

    catalog
        .relocate_episode(
            episode.id,
            Path::new("/lib/B/Season 2/01.mkv"),
            "01.mkv",
            Some("Season 2"),
            Some(2),
            Some(new_series.id),
        )
        .unwrap();

    let stored = catalog.get_episode(episode.id).unwrap().unwrap();
    assert_eq!(stored.path, PathBuf::from("/lib/B/Season 2/01.mkv"));
    assert_eq!(stored.series_id, new_series.id);
    assert_eq!(stored.season_number, Some(2));
    assert_eq!(stored.folder_name.as_deref(), Some("Season 2"));
}

#[test]
fn test_failed_relocate_leaves_row_untouched() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/A"), "A").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(series.id, "/lib/A/01.mkv"))
        .unwrap();

    // No series 9999, so the foreign key rejects the whole update.
    let result = catalog.relocate_episode(
        episode.id,
        Path::new("/lib/Gone/01.mkv"),
        "01.mkv",
        None,
        None,
        Some(9999),
    );
    assert!(result.is_err());
    assert_eq!(catalog.get_episode(episode.id).unwrap().unwrap(), episode);

    assert!(matches!(
        catalog.relocate_episode(12345, Path::new("/x.mkv"), "x.mkv", None, None, None),
        Err(Error::EpisodeNotFound(12345))
    ));
}

#[test]
fn test_reassign_episode_series() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (first, _) = catalog.get_or_create_series(Path::new("/lib/A"), "A").unwrap();
    let (second, _) = catalog.get_or_create_series(Path::new("/lib/B"), "B").unwrap();
    let (episode, _) = catalog
        .get_or_create_episode(&new_episode(first.id, "/lib/A/01.mkv"))
        .unwrap();

    catalog.reassign_episode_series(episode.id, second.id).unwrap();
    assert_eq!(catalog.list_episodes(second.id).unwrap().len(), 1);
    assert!(catalog.list_episodes(first.id).unwrap().is_empty());
}

#[test]
fn test_series_updates() {
    let catalog = Catalog::open_in_memory().unwrap();
    let (series, _) = catalog.get_or_create_series(Path::new("/lib/Show"), "Show").unwrap();
    assert_eq!(series.thumbnail_path, None);

    catalog
        .update_series_poster(series.id, Some(Path::new("/lib/Show/poster.jpg")))
        .unwrap();
    catalog
        .update_series_presence_image_url(series.id, Some("https://img.example/1.png"))
        .unwrap();
    catalog.update_series_size(series.id, 4096).unwrap();

    let stored = catalog.find_series_by_path(Path::new("/lib/Show")).unwrap().unwrap();
    assert_eq!(stored.thumbnail_path, Some(PathBuf::from("/lib/Show/poster.jpg")));
    assert_eq!(stored.presence_image_url.as_deref(), Some("https://img.example/1.png"));
    assert_eq!(stored.total_size_bytes, 4096);
}

#[test]
fn test_open_migrates_old_schema() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("aniplay.db");
    std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();

    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                thumbnail_path TEXT,
                date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                series_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                duration REAL DEFAULT 0,
                episode_number INTEGER,
                season_number INTEGER,
                date_added TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (series_id) REFERENCES series (id) ON DELETE CASCADE
            );
            INSERT INTO series (name, path) VALUES ('Old', '/lib/Old');
            INSERT INTO episodes (series_id, filename, path, episode_number)
                VALUES (1, 'Old - 01.mkv', '/lib/Old/Old - 01.mkv', 1);",
        )
        .unwrap();
    }

    let catalog = Catalog::open(&db_path).unwrap();
    let columns = table_columns(catalog.connection(), "episodes").unwrap();
    for column in ["folder_name", "title", "size_bytes"] {
        assert!(columns.iter().any(|c| c == column), "missing {}", column);
    }
    let columns = table_columns(catalog.connection(), "series").unwrap();
    assert!(columns.iter().any(|c| c == "presence_image_url"));

    let episodes = catalog.list_all_episodes().unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].folder_name, None);
    assert_eq!(episodes[0].size_bytes, 0);
    assert_eq!(episodes[0].episode_number, Some(1));

    // Reopening an up-to-date file is a no-op.
    drop(catalog);
    let catalog = Catalog::open(&db_path).unwrap();
    assert_eq!(catalog.list_series().unwrap().len(), 1);
}

#[test]
fn test_open_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("a").join("b").join("catalog.db");
    Catalog::open(&db_path).unwrap();
    assert!(db_path.exists());
}
