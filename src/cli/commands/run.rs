//! Run command implementation.

use crate::core::catalogue::JsonCatalogue;
use crate::core::pipeline::RunSettings;
use crate::core::progress::BarProgress;
use crate::core::scheduler::{JobRecord, JobRequest, JobScheduler};
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Match and sync posters for the union of the catalogue snapshots.
///
/// All files are merged into one catalogue and one job, so cleanup and the
/// unmatched ledger see every entity at once.
pub async fn run(config: &Config, catalogues: &[PathBuf], webhook: bool) -> Result<()> {
    println!("{}", "[RUN] Syncing posters...".bold().cyan());
    println!();

    let settings = RunSettings::from_config(&config.renamer, webhook)?;
    let scheduler = JobScheduler::default().with_sink(Arc::new(BarProgress::new()));

    let request = JobRequest {
        name: "renamer".to_string(),
        settings,
        cache_path: config.cache_path.clone(),
        source: Arc::new(JsonCatalogue::from_paths(catalogues)),
        uploader: None,
    };

    let record = scheduler.submit(request).await;
    println!();
    print_summary(&record);

    if record.succeeded() {
        Ok(())
    } else {
        record.summary.into_result().map(|_| ())
    }
}

fn print_summary(record: &JobRecord) {
    let summary = &record.summary;
    let status = if record.succeeded() {
        "completed".green()
    } else {
        "failed".red()
    };
    println!("{} {} ({})", "[Job]".bold(), record.job_id, status);

    let stats = &summary.match_stats;
    println!("  {} {}", "Posters scanned:".bold(), summary.posters_scanned);
    println!(
        "  {} {} collections, {} movies, {} shows ({} partial)",
        "Matched:".bold(),
        stats.collections_matched,
        stats.movies_matched,
        stats.shows_fully_matched,
        stats.shows_partial
    );
    println!("  {} {}", "Unmatched:".bold(), stats.total_unmatched());
    println!(
        "  {} {} written, {} unchanged, {} failed",
        "Synced:".bold(),
        summary.sync.written,
        summary.sync.skipped,
        summary.sync.failed
    );
    for (path, reason) in &summary.sync.failures {
        println!("    {} {} - {}", "!".red(), path.display(), reason);
    }
    if let Some(cleanup) = &summary.cleanup {
        println!(
            "  {} {} assets, {} cache records, {} folders",
            "Cleaned:".bold(),
            cleanup.removed_assets + cleanup.removed_backups,
            cleanup.removed_records,
            cleanup.removed_dirs
        );
    }
    if let crate::core::pipeline::Stage::Failed(reason) = &summary.stage {
        println!("  {} {}", "Error:".bold().red(), reason);
    }
    println!();
}
