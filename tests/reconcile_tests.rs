//! Integration tests for orphan reconciliation.

use aniplay::core::reconcile::reconcile_paths;
use aniplay::core::sync::{SyncEngine, SyncMode, SyncOptions};
use aniplay::models::probe::ProbeOutput;
use aniplay::services::MediaProber;
use aniplay::store::Catalog;
use aniplay::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

struct NullProber;

impl MediaProber for NullProber {
    async fn probe(&self, _path: &Path) -> Result<ProbeOutput> {
        Ok(ProbeOutput::default())
    }
}

fn write(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "fake video content").unwrap();
    path
}

fn move_file(root: &Path, from: &str, to: &str) -> PathBuf {
    let target = root.join(to);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::rename(root.join(from), &target).unwrap();
    target
}

/// Sync `root` into a fresh in-memory catalog.
async fn synced_catalog(root: &Path) -> Arc<Mutex<Catalog>> {
    let catalog = Arc::new(Mutex::new(Catalog::open_in_memory().unwrap()));
    let engine = SyncEngine::new(catalog.clone(), Arc::new(NullProber), SyncOptions::default());
    engine.sync(root, SyncMode::Incremental).await.unwrap();
    catalog
}

fn library() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    (temp_dir, root)
}

#[tokio::test]
async fn test_unique_move_within_series() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show/Show - 01.mkv");
    write(&root, "Show/Show - 02.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;

    let episode = catalog.find_episode_by_path(&old_path).unwrap().unwrap();
    catalog.set_progress(episode.id, 300.0, false).unwrap();
    let new_path = move_file(&root, "Show/Show - 01.mkv", "Show/Season 1/Show - 01.mkv");

    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert!(report.applied);
    assert_eq!(report.total_files_found, 2);
    assert_eq!(report.unchanged, 1);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.merged, 0);
    assert_eq!(report.updated.len(), 1);

    let update = &report.updated[0];
    assert_eq!(update.episode_id, episode.id);
    assert_eq!(update.series_hint, "Show");
    assert_eq!(update.old_path, old_path);
    assert_eq!(update.new_path, new_path);
    assert!(!update.merged);

    let stored = catalog.get_episode(episode.id).unwrap().unwrap();
    assert_eq!(stored.path, new_path);
    assert_eq!(stored.series_id, episode.series_id);
    assert_eq!(stored.folder_name.as_deref(), Some("Season 1"));
    assert_eq!(stored.season_number, Some(1));
    assert_eq!(catalog.get_progress(episode.id).unwrap().unwrap().timestamp_seconds, 300.0);
}

#[tokio::test]
async fn test_move_into_other_series_is_a_merge() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show [GroupA]/Show - 01.mkv");
    write(&root, "Show [GroupB]/Show - 02.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;

    let episode = catalog.find_episode_by_path(&old_path).unwrap().unwrap();
    let target_series = catalog
        .find_series_by_path(&root.join("Show [GroupB]"))
        .unwrap()
        .unwrap();
    let new_path = move_file(&root, "Show [GroupA]/Show - 01.mkv", "Show [GroupB]/Show - 01.mkv");

    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.merged, 1);
    assert!(report.updated[0].merged);
    assert_eq!(report.updated[0].series_hint, "Show [GroupB]");

    let stored = catalog.get_episode(episode.id).unwrap().unwrap();
    assert_eq!(stored.path, new_path);
    assert_eq!(stored.series_id, target_series.id);
    assert_ne!(stored.series_id, episode.series_id);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show [GroupA]/Show - 01.mkv");
    write(&root, "Show [GroupB]/Show - 02.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;
    let before = catalog.list_all_episodes().unwrap();

    move_file(&root, "Show [GroupA]/Show - 01.mkv", "Show [GroupB]/Show - 01.mkv");

    let report = reconcile_paths(&catalog, &root, false).unwrap();
    assert!(!report.applied);
    assert_eq!(report.updated.len(), 1);
    assert!(report.updated[0].merged);
    assert_eq!(report.updated[0].old_path, old_path);

    assert_eq!(catalog.list_all_episodes().unwrap(), before);
}

#[tokio::test]
async fn test_ambiguous_candidates_stay_unresolved() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show/Show - 05.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;

    fs::remove_file(&old_path).unwrap();
    write(&root, "Show/Season 2/Show - 05.mkv");
    write(&root, "Show/Season 3/Show - 05.mkv");

    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert!(report.updated.is_empty());
    assert_eq!(report.unresolved, vec![old_path.clone()]);
    assert!(catalog.find_episode_by_path(&old_path).unwrap().is_some());
}

#[tokio::test]
async fn test_season_episode_match_breaks_tie() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show/Show - 05.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;

    // Recorded as (None, 5); only the copy outside a season folder matches.
    let expected = move_file(&root, "Show/Show - 05.mkv", "Archive/Show - 05.mkv");
    write(&root, "Show/Season 2/Show - 05.mkv");

    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].old_path, old_path);
    assert_eq!(report.updated[0].new_path, expected);
    assert!(!report.updated[0].merged);
}

#[tokio::test]
async fn test_missing_file_is_unresolved_not_deleted() {
    let (_temp_dir, root) = library();
    let gone = write(&root, "Show/Show - 01.mkv");
    let catalog = synced_catalog(&root).await;
    let catalog = catalog.lock().await;
    fs::remove_file(&gone).unwrap();

    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert_eq!(report.unresolved, vec![gone.clone()]);
    assert_eq!(report.total_files_found, 0);
    assert_eq!(catalog.list_all_episodes().unwrap().len(), 1);
}

#[tokio::test]
async fn test_target_owned_by_another_episode_fails() {
    let (_temp_dir, root) = library();
    let old_path = write(&root, "Show/Show - 01.mkv");
    let catalog = synced_catalog(&root).await;

    // A sync after the move already created a row for the new location.
    move_file(&root, "Show/Show - 01.mkv", "Show/Season 1/Show - 01.mkv");
    let engine = SyncEngine::new(catalog.clone(), Arc::new(NullProber), SyncOptions::default());
    engine.sync(&root, SyncMode::Incremental).await.unwrap();

    let catalog = catalog.lock().await;
    let report = reconcile_paths(&catalog, &root, true).unwrap();
    assert_eq!(report.failed, vec![old_path.clone()]);
    assert!(report.updated.is_empty());
    assert_eq!(report.unchanged, 1);
    assert!(catalog.find_episode_by_path(&old_path).unwrap().is_some());
}

#[test]
fn test_missing_root_gives_empty_report() {
    let catalog = Catalog::open_in_memory().unwrap();
    let report = reconcile_paths(&catalog, Path::new("/nonexistent/library/12345"), false).unwrap();
    assert_eq!(report.total_files_found, 0);
    assert!(report.updated.is_empty());
    assert!(report.unresolved.is_empty());
}
