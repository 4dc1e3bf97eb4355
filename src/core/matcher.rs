//! Entity matchers.
//!
//! Each matcher looks up candidates in the [`SearchIndex`] and compares them
//! against one catalogue entity. A [`ClaimRegistry`] shared across all
//! passes guarantees a poster file is associated with at most one entity.

use crate::core::normalize::{extract_id, extract_year, normalize, strip_id, strip_year, title_key};
use crate::core::search_index::{AssetKind, SearchIndex};
use crate::models::media::{Collection, MediaType, Movie, Season, Show};
use crate::models::poster::{PosterAttributes, PosterFile, SeasonInfo};
use std::collections::HashSet;

/// Normalized names already claimed during a run.
#[derive(Debug, Default, Clone)]
pub struct ClaimRegistry {
    names: HashSet<String>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the poster's name (or its de-collectioned form) is taken.
    pub fn is_claimed(&self, attrs: &PosterAttributes) -> bool {
        self.names.contains(&attrs.normalized) || self.names.contains(&attrs.decollectioned)
    }

    /// Record a claimed name.
    pub fn claim(&mut self, name: &str) {
        if !name.is_empty() {
            self.names.insert(name.to_string());
        }
    }

    /// Whether a name is claimed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of claimed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Run-wide matching options.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    /// Try alternate titles.
    pub alt_titles: bool,
    /// Webhook-triggered run.
    pub webhook_run: bool,
}

impl MatchContext {
    /// Alternate titles are tried when enabled or for webhook runs.
    pub fn use_alt_titles(&self) -> bool {
        self.alt_titles || self.webhook_run
    }
}

/// Which artwork of an entity a poster fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosterSlot {
    /// Movie, collection or series poster.
    Poster,
    /// Numbered season.
    Season(u32),
    /// Season zero.
    Specials,
}

/// How a poster was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Id,
    Title,
    AltTitle,
}

/// One entity (or season) associated with one poster.
#[derive(Debug, Clone)]
pub struct Match {
    pub media_type: MediaType,
    /// Entity title, used for the target name.
    pub title: String,
    pub slot: PosterSlot,
    pub reason: MatchReason,
    pub poster: PosterFile,
    pub status: Option<String>,
    pub has_episodes: Option<bool>,
    pub has_file: Option<bool>,
    pub webhook_run: bool,
}

/// Result of matching one show.
#[derive(Debug, Clone, Default)]
pub struct ShowOutcome {
    pub matches: Vec<Match>,
    /// Series poster was found.
    pub poster_matched: bool,
    /// Season numbers that were claimed.
    pub claimed_seasons: Vec<u32>,
    /// Seasons with episodes and no poster.
    pub missing_seasons: Vec<Season>,
}

impl ShowOutcome {
    /// Series poster matched and every season with episodes claimed.
    pub fn is_fully_matched(&self) -> bool {
        self.poster_matched && self.missing_seasons.is_empty()
    }

    /// Nothing at all matched.
    pub fn is_unmatched(&self) -> bool {
        self.matches.is_empty()
    }

    /// The only missing seasons are specials.
    pub fn missing_only_specials(&self) -> bool {
        !self.missing_seasons.is_empty() && self.missing_seasons.iter().all(Season::is_specials)
    }

    /// Labels of the missing seasons.
    pub fn missing_labels(&self) -> Vec<String> {
        self.missing_seasons.iter().map(|s| s.season.clone()).collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Compare embedded ids. `Some(true)` on equality, `Some(false)` when both
/// carry ids that differ, `None` when either side has none.
fn id_matches(poster: &PosterAttributes, entity_title: &str) -> Option<bool> {
    let poster_id = poster.external_id.as_ref()?;
    let entity_id = extract_id(entity_title)?;
    Some(*poster_id == entity_id)
}

/// Comparison keys for a movie title: the title itself plus the title with
/// each known release year.
fn movie_keys(title: &str, years: &[String]) -> Vec<String> {
    let base = strip_id(title);
    let bare = strip_year(&base);
    let mut keys = vec![normalize(&base)];

    let own_year = extract_year(&base);
    for year in years.iter().chain(own_year.iter()) {
        let key = normalize(&format!("{} ({})", bare, year));
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Collection key with the ` collection` suffix removed.
fn collection_key(title: &str) -> String {
    let key = title_key(title);
    key.strip_suffix(" collection").unwrap_or(&key).to_string()
}

/// Match a movie poster.
pub fn match_movie(
    index: &SearchIndex,
    movie: &Movie,
    claims: &mut ClaimRegistry,
    ctx: &MatchContext,
) -> Option<Match> {
    let primary = movie_keys(&movie.title, &movie.years);
    let alternates: Vec<String> = if ctx.use_alt_titles() {
        movie
            .alternate_titles
            .iter()
            .flat_map(|alt| movie_keys(alt, &movie.years))
            .collect()
    } else {
        Vec::new()
    };

    let mut queries = vec![movie.title.as_str()];
    if ctx.use_alt_titles() {
        queries.extend(movie.alternate_titles.iter().map(String::as_str));
    }

    for query in queries {
        for poster in index.search(AssetKind::Movie, query) {
            let attrs = &poster.attrs;
            if claims.is_claimed(attrs) {
                continue;
            }
            if attrs.year.is_none() || attrs.has_season_info() || attrs.normalized.ends_with(" collection") {
                continue;
            }

            let reason = match id_matches(attrs, &movie.title) {
                Some(true) => Some(MatchReason::Id),
                Some(false) => None,
                None if primary.contains(&attrs.normalized) => Some(MatchReason::Title),
                None if alternates.contains(&attrs.normalized) => Some(MatchReason::AltTitle),
                None => None,
            };
            let Some(reason) = reason else {
                continue;
            };

            claims.claim(&attrs.normalized);
            claims.claim(&primary[0]);
            tracing::debug!("Matched movie {} -> {:?} ({:?})", movie.title, poster.path, reason);

            return Some(Match {
                media_type: MediaType::Movies,
                title: movie.title.clone(),
                slot: PosterSlot::Poster,
                reason,
                poster: poster.clone(),
                status: non_empty(&movie.status),
                has_episodes: None,
                has_file: Some(movie.has_file),
                webhook_run: ctx.webhook_run,
            });
        }
    }

    None
}

/// Match a collection poster. One file per collection.
pub fn match_collection(
    index: &SearchIndex,
    collection: &Collection,
    claims: &mut ClaimRegistry,
    ctx: &MatchContext,
) -> Option<Match> {
    let key = collection_key(&collection.title);

    for poster in index.search(AssetKind::Collection, &collection.title) {
        let attrs = &poster.attrs;
        if claims.is_claimed(attrs) || attrs.year.is_some() || attrs.has_season_info() {
            continue;
        }
        if attrs.decollectioned != key {
            continue;
        }

        claims.claim(&attrs.normalized);
        claims.claim(&title_key(&collection.title));
        tracing::debug!("Matched collection {} -> {:?}", collection.title, poster.path);

        return Some(Match {
            media_type: MediaType::Collections,
            title: collection.title.clone(),
            slot: PosterSlot::Poster,
            reason: MatchReason::Title,
            poster: poster.clone(),
            status: None,
            has_episodes: None,
            has_file: None,
            webhook_run: ctx.webhook_run,
        });
    }

    None
}

/// Match the series poster, season posters and specials of a show.
pub fn match_show(
    index: &SearchIndex,
    show: &Show,
    claims: &mut ClaimRegistry,
    ctx: &MatchContext,
) -> ShowOutcome {
    let primary = title_key(&show.title);
    let alternates: Vec<String> = if ctx.use_alt_titles() {
        show.alternate_titles.iter().map(|t| title_key(t)).collect()
    } else {
        Vec::new()
    };

    let mut queries = vec![show.title.as_str()];
    if ctx.use_alt_titles() {
        queries.extend(show.alternate_titles.iter().map(String::as_str));
    }

    let mut outcome = ShowOutcome::default();
    let mut claimed_seasons: HashSet<u32> = HashSet::new();
    let season_total = show.seasons.iter().filter(|s| s.number().is_some()).count();

    'queries: for query in queries {
        for poster in index.search(AssetKind::Show, query) {
            if outcome.poster_matched && claimed_seasons.len() == season_total {
                break 'queries;
            }

            let attrs = &poster.attrs;
            if claims.is_claimed(attrs) {
                continue;
            }

            let reason = match id_matches(attrs, &show.title) {
                Some(true) => Some(MatchReason::Id),
                Some(false) => None,
                None if attrs.title_key == primary => Some(MatchReason::Title),
                None if alternates.contains(&attrs.title_key) => Some(MatchReason::AltTitle),
                None => None,
            };
            let Some(reason) = reason else {
                continue;
            };

            let (slot, has_episodes) = match attrs.season {
                Some(info) => {
                    let number = match info {
                        SeasonInfo::Numbered(n) => n,
                        SeasonInfo::Specials => 0,
                    };
                    if claimed_seasons.contains(&number) {
                        continue;
                    }
                    let Some(season) = show.seasons.iter().find(|s| s.number() == Some(number)) else {
                        continue;
                    };
                    claimed_seasons.insert(number);
                    outcome.claimed_seasons.push(number);
                    let slot = if season.is_specials() {
                        PosterSlot::Specials
                    } else {
                        PosterSlot::Season(number)
                    };
                    (slot, Some(season.has_episodes))
                }
                None => {
                    if outcome.poster_matched {
                        continue;
                    }
                    outcome.poster_matched = true;
                    claims.claim(&primary);
                    (PosterSlot::Poster, Some(show.has_episodes))
                }
            };

            claims.claim(&attrs.normalized);
            tracing::debug!("Matched show {} {:?} -> {:?}", show.title, slot, poster.path);

            outcome.matches.push(Match {
                media_type: MediaType::Shows,
                title: show.title.clone(),
                slot,
                reason,
                poster: poster.clone(),
                status: non_empty(&show.status),
                has_episodes,
                has_file: None,
                webhook_run: ctx.webhook_run,
            });
        }
    }

    outcome.missing_seasons = show
        .seasons
        .iter()
        .filter(|s| s.has_episodes)
        .filter(|s| s.number().map_or(true, |n| !claimed_seasons.contains(&n)))
        .cloned()
        .collect();

    outcome
}
