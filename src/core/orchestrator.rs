//! Match orchestrator.
//!
//! Runs the matchers over the whole catalogue: collections first, then
//! movies, then shows, sharing one [`ClaimRegistry`].

use crate::core::matcher::{match_collection, match_movie, match_show, ClaimRegistry, Match, MatchContext};
use crate::core::progress::{Phase, ProgressTracker};
use crate::core::search_index::SearchIndex;
use crate::models::media::{Catalogue, Collection, Movie};
use serde::Serialize;

/// Matching counters, for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub collections_matched: usize,
    pub collections_unmatched: usize,
    pub movies_matched: usize,
    pub movies_unmatched: usize,
    pub shows_fully_matched: usize,
    pub shows_partial: usize,
    pub shows_unmatched: usize,
    /// Shows with season art but no series poster.
    pub shows_missing_poster: usize,
    /// Shows missing at least one season that has episodes.
    pub shows_missing_seasons: usize,
    /// Shows whose only missing season is specials.
    pub shows_missing_only_specials: usize,
    pub seasons_matched: usize,
}

impl MatchStats {
    /// Number of entities with at least one match.
    pub fn total_matched(&self) -> usize {
        self.collections_matched + self.movies_matched + self.shows_fully_matched + self.shows_partial
    }

    /// Number of entities without any match.
    pub fn total_unmatched(&self) -> usize {
        self.collections_unmatched + self.movies_unmatched + self.shows_unmatched
    }
}

/// A show that is not fully matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedShow {
    pub title: String,
    pub missing_poster: bool,
    /// Season labels with episodes and no poster.
    pub missing_seasons: Vec<String>,
}

/// Entities left without art.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnmatchedReport {
    pub movies: Vec<Movie>,
    pub collections: Vec<Collection>,
    pub shows: Vec<UnmatchedShow>,
}

impl UnmatchedReport {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.collections.is_empty() && self.shows.is_empty()
    }
}

/// Output of a matching run.
#[derive(Debug, Default)]
pub struct MatchReport {
    pub matches: Vec<Match>,
    pub stats: MatchStats,
    pub unmatched: UnmatchedReport,
    pub claims: ClaimRegistry,
}

/// Match every entity in the catalogue.
pub fn match_catalogue(
    catalogue: &Catalogue,
    index: &SearchIndex,
    ctx: &MatchContext,
    progress: &mut ProgressTracker<'_>,
) -> MatchReport {
    let mut report = MatchReport::default();
    let total = catalogue.len();
    let mut done = 0;

    for collection in &catalogue.collections {
        match match_collection(index, collection, &mut report.claims, ctx) {
            Some(m) => {
                report.stats.collections_matched += 1;
                report.matches.push(m);
            }
            None => {
                tracing::debug!("No poster for collection {}", collection.title);
                report.stats.collections_unmatched += 1;
                report.unmatched.collections.push(collection.clone());
            }
        }
        done += 1;
        progress.phase(Phase::Matching, done, total);
    }

    for movie in &catalogue.movies {
        match match_movie(index, movie, &mut report.claims, ctx) {
            Some(m) => {
                report.stats.movies_matched += 1;
                report.matches.push(m);
            }
            None => {
                tracing::debug!("No poster for movie {}", movie.title);
                report.stats.movies_unmatched += 1;
                report.unmatched.movies.push(movie.clone());
            }
        }
        done += 1;
        progress.phase(Phase::Matching, done, total);
    }

    for show in &catalogue.shows {
        let outcome = match_show(index, show, &mut report.claims, ctx);
        let stats = &mut report.stats;
        stats.seasons_matched += outcome.claimed_seasons.len();

        if outcome.is_fully_matched() {
            stats.shows_fully_matched += 1;
        } else {
            if outcome.is_unmatched() {
                tracing::debug!("No poster for show {}", show.title);
                stats.shows_unmatched += 1;
            } else {
                stats.shows_partial += 1;
            }
            if !outcome.poster_matched {
                stats.shows_missing_poster += 1;
            }
            if outcome.missing_only_specials() {
                stats.shows_missing_only_specials += 1;
            } else if !outcome.missing_seasons.is_empty() {
                stats.shows_missing_seasons += 1;
            }
            report.unmatched.shows.push(UnmatchedShow {
                title: show.title.clone(),
                missing_poster: !outcome.poster_matched,
                missing_seasons: outcome.missing_labels(),
            });
        }

        report.matches.extend(outcome.matches);
        done += 1;
        progress.phase(Phase::Matching, done, total);
    }

    tracing::info!(
        "Matched {} entities ({} posters), {} unmatched",
        report.stats.total_matched(),
        report.matches.len(),
        report.stats.total_unmatched()
    );

    report
}
