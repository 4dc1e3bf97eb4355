//! First-token search index over poster files.
//!
//! Poster names put the title first, so each file is registered under the
//! first token of its normalized stem and under that token's 3-character
//! prefix.

use crate::core::normalize::normalize;
use crate::models::poster::PosterFile;
use std::collections::HashMap;

/// Length of the prefix key.
pub const PREFIX_LENGTH: usize = 3;

/// Index bucket a poster is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// No year token and no season marker.
    Collection,
    /// Year token and no season marker.
    Movie,
    /// Every poster; season, specials or series art.
    Show,
}

#[derive(Debug, Default)]
struct Bucket {
    by_word: HashMap<String, Vec<usize>>,
    by_prefix: HashMap<String, Vec<usize>>,
}

impl Bucket {
    fn insert(&mut self, token: &str, slot: usize) {
        self.by_word.entry(token.to_string()).or_default().push(slot);
        if token.chars().count() > PREFIX_LENGTH {
            self.by_prefix.entry(prefix_of(token)).or_default().push(slot);
        }
    }
}

/// Read-only index built once per run.
#[derive(Debug, Default)]
pub struct SearchIndex {
    posters: Vec<PosterFile>,
    collections: Bucket,
    movies: Bucket,
    shows: Bucket,
}

fn prefix_of(token: &str) -> String {
    token.chars().take(PREFIX_LENGTH).collect()
}

fn first_token(normalized: &str) -> Option<&str> {
    normalized.split_whitespace().next()
}

impl SearchIndex {
    /// Build the index from scanned posters.
    pub fn build(posters: Vec<PosterFile>) -> Self {
        let mut index = SearchIndex {
            posters,
            ..Default::default()
        };

        for slot in 0..index.posters.len() {
            let attrs = &index.posters[slot].attrs;
            let Some(token) = first_token(&attrs.normalized).map(str::to_string) else {
                tracing::debug!("Not indexing poster with empty name: {:?}", index.posters[slot].path);
                continue;
            };
            let has_year = attrs.year.is_some();
            let has_season = attrs.has_season_info();

            if !has_year && !has_season {
                index.collections.insert(&token, slot);
            }
            if has_year && !has_season {
                index.movies.insert(&token, slot);
            }
            index.shows.insert(&token, slot);
        }

        tracing::debug!(
            "Indexed {} posters ({} collection keys, {} movie keys, {} show keys)",
            index.posters.len(),
            index.collections.by_word.len(),
            index.movies.by_word.len(),
            index.shows.by_word.len()
        );

        index
    }

    fn bucket(&self, kind: AssetKind) -> &Bucket {
        match kind {
            AssetKind::Collection => &self.collections,
            AssetKind::Movie => &self.movies,
            AssetKind::Show => &self.shows,
        }
    }

    /// Candidate posters for a title.
    ///
    /// Prefix hits come first, then exact first-token hits. Order follows
    /// the index and a poster can appear twice.
    pub fn search(&self, kind: AssetKind, title: &str) -> Vec<&PosterFile> {
        let normalized = normalize(title);
        let Some(token) = first_token(&normalized) else {
            return Vec::new();
        };

        let bucket = self.bucket(kind);
        let prefix_hits = bucket.by_prefix.get(&prefix_of(token)).into_iter().flatten();
        let word_hits = bucket.by_word.get(token).into_iter().flatten();

        prefix_hits
            .chain(word_hits)
            .filter_map(|&slot| self.posters.get(slot))
            .collect()
    }

    /// Every indexed poster.
    pub fn posters(&self) -> &[PosterFile] {
        &self.posters
    }

    /// Number of posters.
    pub fn len(&self) -> usize {
        self.posters.len()
    }

    /// Whether the index holds no posters.
    pub fn is_empty(&self) -> bool {
        self.posters.is_empty()
    }
}
