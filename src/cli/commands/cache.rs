//! Cache command implementation.

use crate::core::cache::{PersistentCache, SqliteCache};
use crate::models::cache::CacheFilter;
use crate::models::config::Config;
use crate::models::media::MediaType;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// List cached target files.
pub async fn list(config: &Config, webhook_only: bool, media_type: Option<&str>) -> Result<()> {
    let media_type = match media_type {
        Some(value) => Some(
            MediaType::parse(value)
                .ok_or_else(|| crate::Error::other(format!("Unknown media type: {}", value)))?,
        ),
        None => None,
    };
    let filter = CacheFilter {
        webhook_run: webhook_only.then_some(true),
        media_type,
    };

    let cache = SqliteCache::open(&config.cache_path)?;
    let records = cache.list_all(&filter)?;

    if records.is_empty() {
        println!("No cache records found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:<10} {}",
        "Type".bold(),
        "Border".bold(),
        "Webhook".bold(),
        "Path".bold()
    );
    println!("{}", "-".repeat(80));

    for record in records.values() {
        println!(
            "{:<12} {:<8} {:<10} {}",
            record.media_type.as_str(),
            record.border_setting.as_deref().unwrap_or("-"),
            if record.webhook_run { "yes" } else { "no" },
            record.file_path.display()
        );
    }

    println!();
    println!("{} {}", "Total:".bold(), records.len());
    Ok(())
}

/// Show one cache record.
pub async fn show(config: &Config, path: &Path) -> Result<()> {
    let cache = SqliteCache::open(&config.cache_path)?;

    match cache.get(path)? {
        Some(record) => {
            println!("{} {}", "Cache record:".bold().cyan(), record.file_path.display());
            println!();
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => {
            println!("{} {}", "No cache record for".yellow(), path.display());
        }
    }

    Ok(())
}
