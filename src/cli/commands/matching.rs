//! Match command implementation.
//!
//! Builds the index and matches the catalogue without touching the asset
//! library or the cache.

use crate::core::catalogue::{CatalogueSource, JsonCatalogue};
use crate::core::matcher::{MatchContext, PosterSlot};
use crate::core::orchestrator::match_catalogue;
use crate::core::progress::{NoProgress, ProgressTracker};
use crate::core::scanner::scan_sources;
use crate::core::search_index::SearchIndex;
use crate::generators::target::target_for;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Print the matches a run would sync.
pub async fn match_posters(
    config: &Config,
    catalogues: &[PathBuf],
    alt: bool,
    show_unmatched: bool,
) -> Result<()> {
    println!("{}", "[MATCH] Matching posters (dry run)...".bold().cyan());
    println!();

    let catalogue = JsonCatalogue::from_paths(catalogues).fetch()?;
    let scan = scan_sources(&config.renamer.source_dirs);
    let index = SearchIndex::build(scan.posters);
    let ctx = MatchContext {
        alt_titles: alt || config.renamer.match_alt,
        webhook_run: false,
    };

    let sink = NoProgress;
    let mut progress = ProgressTracker::new(&sink, "match");
    let report = match_catalogue(&catalogue, &index, &ctx, &mut progress);

    for m in &report.matches {
        let slot = match m.slot {
            PosterSlot::Poster => String::new(),
            PosterSlot::Season(n) => format!(" [season {}]", n),
            PosterSlot::Specials => " [specials]".to_string(),
        };
        println!(
            "  {} {}{} -> {}",
            m.media_type.to_string().dimmed(),
            m.poster.stem,
            slot,
            target_for(m, config.renamer.asset_folders).display().to_string().green()
        );
    }

    println!();
    println!("{}", "[Match Summary]".bold().green());
    println!("  {} {}", "Posters indexed:".bold(), index.len());
    println!("  {} {}", "Matched posters:".bold(), report.matches.len());
    println!("  {} {}", "Unmatched entities:".bold(), report.stats.total_unmatched());
    println!(
        "  {} {} missing poster, {} missing seasons, {} missing only specials",
        "Partial shows:".bold(),
        report.stats.shows_missing_poster,
        report.stats.shows_missing_seasons,
        report.stats.shows_missing_only_specials
    );

    if show_unmatched && !report.unmatched.is_empty() {
        println!();
        println!("{}", "[Unmatched]".bold().yellow());
        for collection in &report.unmatched.collections {
            println!("  collection {}", collection.title);
        }
        for movie in &report.unmatched.movies {
            println!("  movie      {}", movie.title);
        }
        for show in &report.unmatched.shows {
            let poster = if show.missing_poster { " (no poster)" } else { "" };
            println!("  show       {}{} {}", show.title, poster, show.missing_seasons.join(", "));
        }
    }

    Ok(())
}
