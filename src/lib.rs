//! AniPlay catalog library
//!
//! Keeps a persisted catalog of a series/season/episode folder tree consistent
//! with the filesystem: scanning, filename heuristics, incremental and full
//! sync, orphan reconciliation and a read-only organization audit.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
