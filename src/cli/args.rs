//! Command line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// AniPlay - Keep a video library catalog in step with its folders
#[derive(Parser, Debug)]
#[command(name = "aniplay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to <config dir>/aniplay/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Catalog database file, overrides the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the library and update the catalog
    Sync {
        /// Library root (defaults to the configured library path)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Re-derive titles, numbering and sizes, overwriting edits
        #[arg(long)]
        full: bool,
    },

    /// Find moved or renamed episodes and repair their paths
    Reconcile {
        /// Library root (defaults to the configured library path)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Write the changes (dry run otherwise)
        #[arg(long)]
        apply: bool,
    },

    /// Check series folders for organization problems
    Check {
        /// Library root (defaults to the configured library path)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// List series, or the episodes of one series
    List {
        /// Series ID
        #[arg(value_name = "SERIES_ID")]
        series_id: Option<i64>,
    },

    /// Show or set the playback position of an episode
    Progress {
        /// Episode ID
        #[arg(value_name = "EPISODE_ID")]
        episode_id: i64,

        /// New position in seconds
        #[arg(long, value_name = "SECONDS")]
        set: Option<f64>,
    },

    /// Mark an episode or a whole series as watched
    Watched {
        /// What the ID refers to
        #[arg(value_enum)]
        target: WatchTarget,

        /// Episode or series ID
        #[arg(value_name = "ID")]
        id: i64,

        /// Mark as unwatched instead
        #[arg(long)]
        unset: bool,
    },

    /// Show recently watched episodes
    History {
        /// Maximum number of entries
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Preview the titles extraction would give every episode
    Titles,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchTarget {
    Episode,
    Series,
}
