//! Media catalogue sources.
//!
//! A catalogue is a read-only snapshot of movies, shows and collections
//! fetched once at the start of a run. Shows reported by several media
//! manager instances are merged into one entry.

use crate::models::media::{Catalogue, Collection, Movie, Season, Show};
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies the catalogue for a run.
pub trait CatalogueSource: Send + Sync {
    fn fetch(&self) -> Result<Catalogue>;
}

/// One media manager's part of a snapshot file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SnapshotPart {
    movies: Vec<Movie>,
    shows: Vec<Show>,
    collections: Vec<Collection>,
}

/// Snapshot file layout: either a single catalogue or a list of parts, one
/// per instance.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Instances(Vec<SnapshotPart>),
    Single(SnapshotPart),
}

/// Catalogue loaded from one or more JSON snapshot files.
///
/// Every file is read and all parts are merged into a single snapshot, so
/// one run sees the union of the files.
#[derive(Debug, Clone)]
pub struct JsonCatalogue {
    paths: Vec<PathBuf>,
}

impl JsonCatalogue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Parse snapshot JSON.
    pub fn parse(content: &str) -> Result<Catalogue> {
        let catalogue =
            Self::parse_parts(content).map_err(|e| crate::Error::Catalogue(e.to_string()))?;
        Ok(merge_catalogue(catalogue))
    }

    /// Concatenate the parts of one snapshot without merging.
    fn parse_parts(content: &str) -> serde_json::Result<Catalogue> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        let parts = match snapshot {
            Snapshot::Instances(parts) => parts,
            Snapshot::Single(part) => vec![part],
        };

        let mut catalogue = Catalogue::default();
        for part in parts {
            catalogue.movies.extend(part.movies);
            catalogue.shows.extend(part.shows);
            catalogue.collections.extend(part.collections);
        }
        Ok(catalogue)
    }

    fn read(path: &Path) -> Result<Catalogue> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Catalogue(format!("{}: {}", path.display(), e)))?;
        Self::parse_parts(&content)
            .map_err(|e| crate::Error::Catalogue(format!("{}: {}", path.display(), e)))
    }
}

impl CatalogueSource for JsonCatalogue {
    fn fetch(&self) -> Result<Catalogue> {
        if self.paths.is_empty() {
            return Err(crate::Error::Catalogue("no catalogue files given".to_string()));
        }

        let mut combined = Catalogue::default();
        for path in &self.paths {
            let part = Self::read(path)?;
            tracing::debug!("Read {} entities from {:?}", part.len(), path);
            combined.movies.extend(part.movies);
            combined.shows.extend(part.shows);
            combined.collections.extend(part.collections);
        }

        let catalogue = merge_catalogue(combined);
        tracing::info!(
            "Loaded catalogue: {} movies, {} shows ({} seasons), {} collections",
            catalogue.movies.len(),
            catalogue.shows.len(),
            catalogue.season_count(),
            catalogue.collections.len()
        );
        Ok(catalogue)
    }
}

/// Catalogue already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue(pub Catalogue);

impl CatalogueSource for StaticCatalogue {
    fn fetch(&self) -> Result<Catalogue> {
        Ok(self.0.clone())
    }
}

/// Union two season lists; a season has episodes if any side says so.
fn merge_seasons(into: &mut Vec<Season>, from: Vec<Season>) {
    for season in from {
        match into.iter_mut().find(|s| s.season == season.season) {
            Some(existing) => existing.has_episodes |= season.has_episodes,
            None => into.push(season),
        }
    }
}

/// Merge shows by title and drop repeated movies and collections, keeping
/// the first occurrence.
pub fn merge_catalogue(catalogue: Catalogue) -> Catalogue {
    let mut shows: Vec<Show> = Vec::new();
    let mut show_slots: HashMap<String, usize> = HashMap::new();
    for show in catalogue.shows {
        match show_slots.get(&show.title) {
            Some(&slot) => {
                let existing = &mut shows[slot];
                existing.has_episodes |= show.has_episodes;
                merge_seasons(&mut existing.seasons, show.seasons);
                for alt in show.alternate_titles {
                    if !existing.alternate_titles.contains(&alt) {
                        existing.alternate_titles.push(alt);
                    }
                }
            }
            None => {
                show_slots.insert(show.title.clone(), shows.len());
                shows.push(show);
            }
        }
    }

    let mut seen_movies = std::collections::HashSet::new();
    let movies = catalogue
        .movies
        .into_iter()
        .filter(|m| seen_movies.insert(m.title.clone()))
        .collect();

    let mut seen_collections = std::collections::HashSet::new();
    let collections = catalogue
        .collections
        .into_iter()
        .filter(|c| seen_collections.insert(c.title.clone()))
        .collect();

    Catalogue {
        movies,
        shows,
        collections,
    }
}
