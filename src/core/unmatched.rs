//! Unmatched-assets ledger.
//!
//! Persists which entities still have no art after a run, with totals.
//! The ledger is replaced wholesale on every write.

use crate::core::orchestrator::{UnmatchedReport, UnmatchedShow};
use crate::models::media::{Catalogue, MediaType};
use crate::Result;
use serde::Serialize;

/// Only movies with this status are reported.
const RELEASED: &str = "released";

/// Ledger totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnmatchedTotals {
    pub total_movies: usize,
    pub total_series: usize,
    pub total_seasons: usize,
    pub total_collections: usize,
    pub unmatched_movies: usize,
    pub unmatched_series: usize,
    pub unmatched_seasons: usize,
    pub unmatched_collections: usize,
}

/// Everything written to the ledger in one go.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerEntries {
    pub movies: Vec<String>,
    pub collections: Vec<String>,
    pub shows: Vec<UnmatchedShow>,
    pub totals: UnmatchedTotals,
}

/// Storage for the ledger.
pub trait UnmatchedLedger {
    /// Wipe the ledger and store `entries`.
    fn replace_unmatched(&self, entries: &LedgerEntries) -> Result<()>;
    /// Totals of the last write.
    fn unmatched_totals(&self) -> Result<Option<UnmatchedTotals>>;
    /// Unmatched titles of one media type.
    fn unmatched_titles(&self, media_type: MediaType) -> Result<Vec<String>>;
}

fn is_released(status: &str) -> bool {
    status.eq_ignore_ascii_case(RELEASED)
}

/// Build ledger entries from a matching report.
pub fn ledger_entries(catalogue: &Catalogue, report: &UnmatchedReport) -> LedgerEntries {
    let movies: Vec<String> = report
        .movies
        .iter()
        .filter(|m| is_released(&m.status))
        .map(|m| m.title.clone())
        .collect();
    let collections: Vec<String> = report.collections.iter().map(|c| c.title.clone()).collect();
    let shows: Vec<UnmatchedShow> = report
        .shows
        .iter()
        .filter(|s| s.missing_poster || !s.missing_seasons.is_empty())
        .cloned()
        .collect();

    let totals = UnmatchedTotals {
        total_movies: catalogue.movies.iter().filter(|m| is_released(&m.status)).count(),
        total_series: catalogue.shows.len(),
        total_seasons: catalogue
            .shows
            .iter()
            .flat_map(|s| s.seasons.iter())
            .filter(|s| s.has_episodes)
            .count(),
        total_collections: catalogue.collections.len(),
        unmatched_movies: movies.len(),
        unmatched_series: shows.iter().filter(|s| s.missing_poster).count(),
        unmatched_seasons: shows.iter().map(|s| s.missing_seasons.len()).sum(),
        unmatched_collections: collections.len(),
    };

    LedgerEntries {
        movies,
        collections,
        shows,
        totals,
    }
}

/// Replace the ledger with the current report.
pub fn write_unmatched(
    ledger: &dyn UnmatchedLedger,
    catalogue: &Catalogue,
    report: &UnmatchedReport,
) -> Result<UnmatchedTotals> {
    let entries = ledger_entries(catalogue, report);
    ledger.replace_unmatched(&entries)?;
    tracing::info!(
        "Unmatched: {} movies, {} series, {} seasons, {} collections",
        entries.totals.unmatched_movies,
        entries.totals.unmatched_series,
        entries.totals.unmatched_seasons,
        entries.totals.unmatched_collections
    );
    Ok(entries.totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::SqliteCache;
    use crate::models::media::{Collection, Movie, Season, Show};

    fn sample() -> (Catalogue, UnmatchedReport) {
        let released = Movie {
            title: "Heat (1995)".to_string(),
            status: "released".to_string(),
            ..Default::default()
        };
        let announced = Movie {
            title: "Future (2030)".to_string(),
            status: "announced".to_string(),
            ..Default::default()
        };
        let show = Show {
            title: "Lost (2004)".to_string(),
            seasons: vec![Season::numbered(1, true), Season::numbered(2, false)],
            ..Default::default()
        };
        let collection = Collection {
            title: "Alien Collection".to_string(),
            library: None,
        };

        let catalogue = Catalogue {
            movies: vec![released.clone(), announced.clone()],
            shows: vec![show],
            collections: vec![collection.clone()],
        };
        let report = UnmatchedReport {
            movies: vec![released, announced],
            collections: vec![collection],
            shows: vec![UnmatchedShow {
                title: "Lost (2004)".to_string(),
                missing_poster: true,
                missing_seasons: vec!["season01".to_string()],
            }],
        };
        (catalogue, report)
    }

    #[test]
    fn test_only_released_movies() {
        let (catalogue, report) = sample();
        let entries = ledger_entries(&catalogue, &report);
        assert_eq!(entries.movies, vec!["Heat (1995)"]);
        assert_eq!(entries.totals.total_movies, 1);
        assert_eq!(entries.totals.total_seasons, 1);
        assert_eq!(entries.totals.unmatched_seasons, 1);
        assert_eq!(entries.totals.unmatched_series, 1);
    }

    #[test]
    fn test_write_replaces_ledger() {
        let cache = SqliteCache::in_memory().unwrap();
        let (catalogue, report) = sample();

        write_unmatched(&cache, &catalogue, &report).unwrap();
        write_unmatched(&cache, &catalogue, &report).unwrap();

        assert_eq!(cache.unmatched_titles(MediaType::Movies).unwrap(), vec!["Heat (1995)"]);
        assert_eq!(cache.unmatched_titles(MediaType::Shows).unwrap(), vec!["Lost (2004)"]);
        assert_eq!(
            cache.unmatched_totals().unwrap().map(|t| t.unmatched_collections),
            Some(1)
        );

        write_unmatched(&cache, &catalogue, &UnmatchedReport::default()).unwrap();
        assert!(cache.unmatched_titles(MediaType::Collections).unwrap().is_empty());
    }
}
