//! AniPlay CLI
//!
//! Keeps a video library catalog in step with a series/season folder tree.

use aniplay::cli::{
    args::{Cli, Commands},
    commands::{self, check, list, progress, reconcile, sync, titles},
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = commands::resolve_config(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Commands::Sync { path, full } => {
            let library = commands::resolve_library_path(path.as_deref(), &config)?;
            let catalog = commands::open_catalog(&config)?;
            sync::sync(catalog, &config, &library, full).await?;
        }

        Commands::Reconcile { path, apply } => {
            let library = commands::resolve_library_path(path.as_deref(), &config)?;
            let catalog = commands::open_catalog(&config)?;
            reconcile::reconcile(&catalog, &library, apply).await?;
        }

        Commands::Check { path } => {
            let library = commands::resolve_library_path(path.as_deref(), &config)?;
            check::check(&library).await?;
        }

        Commands::List { series_id } => {
            let catalog = commands::open_catalog(&config)?;
            list::list(&catalog, series_id).await?;
        }

        Commands::Progress { episode_id, set } => {
            let catalog = commands::open_catalog(&config)?;
            progress::progress(&catalog, episode_id, set).await?;
        }

        Commands::Watched { target, id, unset } => {
            let catalog = commands::open_catalog(&config)?;
            progress::watched(&catalog, target, id, unset).await?;
        }

        Commands::History { limit } => {
            let catalog = commands::open_catalog(&config)?;
            progress::history(&catalog, limit).await?;
        }

        Commands::Titles => {
            let catalog = commands::open_catalog(&config)?;
            titles::titles(&catalog).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("aniplay=debug")
    } else {
        EnvFilter::new("aniplay=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
