//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Poster Renamer - Match poster art to your media and sync it into an asset library
#[derive(Parser, Debug)]
#[command(name = "poster-renamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.toml
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match posters and sync them into the asset library
    Run {
        /// Catalogue snapshot(s), merged into one catalogue
        #[arg(long = "catalogue", value_name = "CATALOGUE_FILE", required = true)]
        catalogues: Vec<PathBuf>,

        /// Mark the run as webhook-triggered
        #[arg(long)]
        webhook: bool,
    },

    /// Show what would be matched without writing anything
    Match {
        /// Catalogue snapshot(s), merged into one catalogue
        #[arg(long = "catalogue", value_name = "CATALOGUE_FILE", required = true)]
        catalogues: Vec<PathBuf>,

        /// Also try alternate titles
        #[arg(long)]
        alt: bool,

        /// List unmatched entities
        #[arg(long)]
        show_unmatched: bool,
    },

    /// Remove orphan assets and stale cache records
    Clean {
        /// Catalogue snapshot(s), merged into one catalogue
        #[arg(long = "catalogue", value_name = "CATALOGUE_FILE", required = true)]
        catalogues: Vec<PathBuf>,
    },

    /// Inspect the persistent cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached target files
    List {
        /// Only records written by webhook runs
        #[arg(long)]
        webhook_only: bool,

        /// Only one media type (movies, shows, collections)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        media_type: Option<String>,
    },

    /// Show one cache record
    Show {
        /// Target file path
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}
