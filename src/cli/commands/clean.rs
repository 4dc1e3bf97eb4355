//! Clean command implementation.

use crate::core::cache::SqliteCache;
use crate::core::catalogue::{CatalogueSource, JsonCatalogue};
use crate::core::gc::{collect_garbage, CleanupSettings};
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Remove orphan assets, backups and cache records.
pub async fn clean(config: &Config, catalogues: &[PathBuf]) -> Result<()> {
    println!("{}", "[CLEAN] Removing orphan assets...".bold().cyan());
    println!();

    let catalogue = JsonCatalogue::from_paths(catalogues).fetch()?;
    let cache = SqliteCache::open(&config.cache_path)?;
    let settings = CleanupSettings {
        target_root: config.renamer.target_dir.clone(),
        backup_root: config.renamer.backup_dir.clone(),
        asset_folders: config.renamer.asset_folders,
        clean_assets: true,
    };

    let summary = collect_garbage(&cache, &catalogue, &settings)?;

    println!("{}", "[Cleanup Summary]".bold().green());
    println!("  {} {}", "Assets removed:".bold(), summary.removed_assets);
    println!("  {} {}", "Backups removed:".bold(), summary.removed_backups);
    println!("  {} {}", "Cache records removed:".bold(), summary.removed_records);
    println!("  {} {}", "Folders removed:".bold(), summary.removed_dirs);

    Ok(())
}
