//! Core business logic modules.

pub mod auditor;
pub mod identity;
pub mod reconcile;
pub mod scanner;
pub mod sync;
pub mod titles;

pub use auditor::{audit_library, audit_series};
pub use reconcile::reconcile_paths;
pub use sync::{SyncEngine, SyncMode, SyncOptions};
pub use titles::preview_titles;
