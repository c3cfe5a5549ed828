//! Media prober interface.

use crate::models::probe::ProbeOutput;
use crate::Result;
use std::future::Future;
use std::path::Path;

/// Something that can report the duration and streams of a media file.
///
/// Sync only depends on this trait, so tests can substitute a fake.
pub trait MediaProber: Send + Sync {
    fn probe(&self, path: &Path) -> impl Future<Output = Result<ProbeOutput>> + Send;
}
