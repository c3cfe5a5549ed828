//! Library synchronization.
//!
//! Every immediate subdirectory of the library root is a series. Each series
//! folder is scanned and diffed against the catalog; episodes without
//! duration or tracks are handed to the prober.

use crate::core::{identity, scanner};
use crate::models::catalog::{Episode, NewEpisode, SeriesId};
use crate::models::config::Config;
use crate::models::report::SyncSummary;
use crate::models::scan::PhysicalEpisode;
use crate::services::MediaProber;
use crate::store::Catalog;
use crate::utils::fs::{canonical_root, child_directories, file_name_string};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

/// How existing rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Keep user edits: fill missing titles and sizes only.
    #[default]
    Incremental,
    /// Re-derive titles, numbering and sizes from the current files.
    Full,
}

impl SyncMode {
    pub fn is_full(&self) -> bool {
        matches!(self, SyncMode::Full)
    }
}

/// Concurrency limits for a sync run.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub series_workers: usize,
    pub max_concurrent_probes: usize,
    /// Limit for one directory listing, series walk or file stat.
    pub scan_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            series_workers: config.sync.series_workers.max(1),
            max_concurrent_probes: config.probe.max_concurrent.max(1),
            scan_timeout: Duration::from_secs(config.sync.scan_timeout_secs.max(1)),
        }
    }
}

/// Keeps the catalog in step with a library folder.
pub struct SyncEngine<P> {
    catalog: Arc<Mutex<Catalog>>,
    prober: Arc<P>,
    options: SyncOptions,
    probe_slots: Arc<Semaphore>,
}

impl<P: MediaProber> SyncEngine<P> {
    pub fn new(catalog: Arc<Mutex<Catalog>>, prober: Arc<P>, options: SyncOptions) -> Self {
        let probe_slots = Arc::new(Semaphore::new(options.max_concurrent_probes.max(1)));
        Self {
            catalog,
            prober,
            options,
            probe_slots,
        }
    }

    pub fn catalog(&self) -> &Arc<Mutex<Catalog>> {
        &self.catalog
    }

    /// Sync every series folder under `library_root`.
    ///
    /// A missing root is a no-op. Per-file problems are counted in the
    /// summary; only catalog failures abort the run.
    pub async fn sync(&self, library_root: &Path, mode: SyncMode) -> Result<SyncSummary> {
        let root = canonical_root(library_root);
        if !root.is_dir() {
            tracing::warn!("Library root not available, skipping sync: {}", root.display());
            return Ok(SyncSummary::default());
        }

        tracing::info!("Starting library scan ({:?}): {}", mode, root.display());

        let listing_root = root.clone();
        let listing = within(
            self.options.scan_timeout,
            tokio::task::spawn_blocking(move || child_directories(&listing_root)),
        )
        .await;
        let folders = match listing {
            Some(joined) => {
                joined.map_err(|e| Error::other(format!("Directory listing task failed: {}", e)))?
            }
            None => {
                tracing::warn!("Timed out listing library root: {}", root.display());
                return Ok(SyncSummary {
                    file_errors: vec![root],
                    ..Default::default()
                });
            }
        };

        let results: Vec<Result<SyncSummary>> = stream::iter(folders)
            .map(|folder| async move { self.sync_series(&folder, mode).await })
            .buffer_unordered(self.options.series_workers.max(1))
            .collect()
            .await;

        let mut summary = SyncSummary::default();
        for result in results {
            summary.absorb(result?);
        }

        tracing::info!(
            "Library scan complete: {} series, {} episodes ({} new, {} updated, {} probed)",
            summary.series_seen,
            summary.episodes_seen,
            summary.episodes_created,
            summary.episodes_updated,
            summary.probed
        );
        Ok(summary)
    }

    /// Sync one series folder.
    pub async fn sync_series(&self, folder: &Path, mode: SyncMode) -> Result<SyncSummary> {
        let mut summary = SyncSummary {
            series_seen: 1,
            ..Default::default()
        };
        let name = file_name_string(folder);
        tracing::info!("Scanning series: {}", name);

        let scan_root = folder.to_path_buf();
        let scan = within(
            self.options.scan_timeout,
            tokio::task::spawn_blocking(move || {
                (
                    scanner::find_poster(&scan_root),
                    scanner::scan_series_folder(&scan_root),
                )
            }),
        )
        .await;
        let (poster, mut episodes) = match scan {
            Some(joined) => joined
                .map_err(|e| Error::other(format!("Scan task failed for {}: {}", name, e)))?,
            None => {
                tracing::warn!("Timed out scanning {}, left as stored", folder.display());
                summary.file_errors.push(folder.to_path_buf());
                return Ok(summary);
            }
        };

        episodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        tracing::info!("  Found {} media files in {}", episodes.len(), name);

        let series_id = {
            let catalog = self.catalog.lock().await;
            let (series, created) = catalog.get_or_create_series(folder, &name)?;
            if created {
                summary.series_created += 1;
            }

            let stored_poster_valid = series
                .thumbnail_path
                .as_deref()
                .map(|p| p.exists())
                .unwrap_or(false);
            if (mode.is_full() || !stored_poster_valid)
                && poster.is_some()
                && poster != series.thumbnail_path
            {
                catalog.update_series_poster(series.id, poster.as_deref())?;
            }
            series.id
        };

        let mut total_size = 0i64;
        for physical in &episodes {
            summary.episodes_seen += 1;
            if let Some(size) = self.sync_episode(series_id, physical, mode, &mut summary).await? {
                total_size += size;
            }
        }

        self.catalog
            .lock()
            .await
            .update_series_size(series_id, total_size)?;

        Ok(summary)
    }

    /// Upsert one file and probe it if needed.
    ///
    /// Returns the size on disk, or the stored size when the file cannot be
    /// stat'ed.
    async fn sync_episode(
        &self,
        series_id: SeriesId,
        physical: &PhysicalEpisode,
        mode: SyncMode,
        summary: &mut SyncSummary,
    ) -> Result<Option<i64>> {
        let stat = within(self.options.scan_timeout, tokio::fs::metadata(&physical.path)).await;
        let size_on_disk = match stat {
            Some(Ok(meta)) => meta.len() as i64,
            Some(Err(e)) => {
                tracing::warn!("Cannot stat {}: {}", physical.path.display(), e);
                return self.stored_size(physical, summary).await;
            }
            None => {
                tracing::warn!("Timed out reading {}", physical.path.display());
                return self.stored_size(physical, summary).await;
            }
        };

        let (episode, needs_probe) = {
            let catalog = self.catalog.lock().await;
            let (episode, created) = catalog.get_or_create_episode(&NewEpisode {
                series_id,
                filename: physical.filename.clone(),
                path: physical.path.clone(),
                title: identity::extract_title(&physical.filename),
                season_number: physical.season_number,
                episode_number: physical.episode_number,
                folder_name: physical.folder_name.clone(),
                size_bytes: size_on_disk,
            })?;

            let episode = if created {
                summary.episodes_created += 1;
                episode
            } else {
                let refreshed = apply_metadata(&catalog, episode, physical, size_on_disk, mode)?;
                if refreshed.1 {
                    summary.episodes_updated += 1;
                }
                refreshed.0
            };

            let needs_probe =
                episode.duration_seconds <= 0.0 || catalog.track_count(episode.id)? == 0;
            (episode, needs_probe)
        };

        if needs_probe {
            self.probe_episode(&episode, summary).await?;
        }

        Ok(Some(size_on_disk))
    }

    /// Record an unreadable file and fall back to its stored size.
    async fn stored_size(
        &self,
        physical: &PhysicalEpisode,
        summary: &mut SyncSummary,
    ) -> Result<Option<i64>> {
        summary.file_errors.push(physical.path.clone());
        let catalog = self.catalog.lock().await;
        let stored = catalog.find_episode_by_path(&physical.path)?;
        Ok(stored.map(|ep| ep.size_bytes))
    }

    /// Probe outside the catalog lock, then replace tracks in one transaction.
    async fn probe_episode(&self, episode: &Episode, summary: &mut SyncSummary) -> Result<()> {
        tracing::info!("    Probing metadata: {}", episode.filename);

        let result = {
            let _permit = self
                .probe_slots
                .acquire()
                .await
                .map_err(|e| Error::other(format!("Probe pool closed: {}", e)))?;
            self.prober.probe(&episode.path).await
        };

        match result {
            Ok(output) => {
                let track_count = output.tracks.len();
                self.catalog.lock().await.replace_tracks(
                    episode.id,
                    output.duration_seconds,
                    &output.tracks,
                )?;
                summary.probed += 1;
                tracing::info!("      Success: {} tracks found", track_count);
            }
            Err(e) => {
                summary.probe_failures += 1;
                tracing::warn!("      Probe failed, will retry next sync: {}", e);
            }
        }
        Ok(())
    }
}

/// Await a filesystem task, or `None` once `limit` has passed.
///
/// A blocking task that times out keeps running on its thread; only the
/// sync stops waiting for it.
async fn within<T>(limit: Duration, task: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(limit, task).await.ok()
}

/// Write mode-dependent fields of an existing row.
///
/// Returns the row as stored afterwards and whether anything changed.
fn apply_metadata(
    catalog: &Catalog,
    mut episode: Episode,
    physical: &PhysicalEpisode,
    size_on_disk: i64,
    mode: SyncMode,
) -> Result<(Episode, bool)> {
    let mut changed = false;

    if episode.season_number != physical.season_number
        || episode.episode_number != physical.episode_number
        || episode.folder_name != physical.folder_name
    {
        catalog.update_episode_identity(
            episode.id,
            physical.season_number,
            physical.episode_number,
            physical.folder_name.as_deref(),
        )?;
        episode.season_number = physical.season_number;
        episode.episode_number = physical.episode_number;
        episode.folder_name = physical.folder_name.clone();
        changed = true;
    }

    let derived_title = identity::extract_title(&physical.filename);
    let write_title = match mode {
        SyncMode::Full => episode.title != derived_title,
        SyncMode::Incremental => !episode.has_title() && derived_title.is_some(),
    };
    if write_title {
        catalog.update_episode_title(episode.id, derived_title.as_deref())?;
        episode.title = derived_title;
        changed = true;
    }

    let write_size = match mode {
        SyncMode::Full => episode.size_bytes != size_on_disk,
        SyncMode::Incremental => episode.size_bytes <= 0 && size_on_disk > 0,
    };
    if write_size {
        catalog.update_episode_size(episode.id, size_on_disk)?;
        episode.size_bytes = size_on_disk;
        changed = true;
    }

    Ok((episode, changed))
}
