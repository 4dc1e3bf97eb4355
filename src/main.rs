//! Poster Renamer CLI
//!
//! A command-line tool that matches poster images to movies, shows and
//! collections and syncs them into an asset library.

use clap::Parser;
use poster_renamer::cli::{
    args::{CacheAction, Cli, Commands},
    commands::{cache, clean, matching, run},
};
use poster_renamer::models::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize logging
    init_logging(cli.verbose, config.log_level.as_deref());

    match cli.command {
        Commands::Run { catalogues, webhook } => {
            run::run(&config, &catalogues, webhook).await?;
        }

        Commands::Match {
            catalogues,
            alt,
            show_unmatched,
        } => {
            matching::match_posters(&config, &catalogues, alt, show_unmatched).await?;
        }

        Commands::Clean { catalogues } => {
            clean::clean(&config, &catalogues).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::List {
                webhook_only,
                media_type,
            } => {
                cache::list(&config, webhook_only, media_type.as_deref()).await?;
            }
            CacheAction::Show { path } => {
                cache::show(&config, &path).await?;
            }
        },
    }

    Ok(())
}

/// Initialize the logging system.
///
/// `--verbose` wins over the configured level.
fn init_logging(verbose: bool, level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("poster_renamer=debug")
    } else if let Some(level) = level {
        EnvFilter::try_new(format!("poster_renamer={}", level))
            .unwrap_or_else(|_| EnvFilter::new("poster_renamer=info"))
    } else {
        EnvFilter::new("poster_renamer=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
