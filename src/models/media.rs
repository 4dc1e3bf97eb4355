//! Media-related data models.
//!
//! A [`Catalogue`] is the read-only snapshot of movies, shows and collections
//! fetched from the media managers at the start of a run.

use serde::{Deserialize, Serialize};

/// Media type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movies,
    Shows,
    Collections,
}

impl MediaType {
    /// Name stored in the cache `media_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movies => "movies",
            MediaType::Shows => "shows",
            MediaType::Collections => "collections",
        }
    }

    /// Parse the cache column value back into a media type.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movies" => Some(MediaType::Movies),
            "shows" => Some(MediaType::Shows),
            "collections" => Some(MediaType::Collections),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movie as reported by a movie manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    /// Folder title, e.g. `Inception (2010) {tmdb-27205}`.
    pub title: String,
    /// Stable id inside the media manager.
    pub id: u64,
    /// Known release years (cinema, physical, digital).
    pub years: Vec<String>,
    /// Lifecycle status (`released`, `announced`, ...).
    pub status: String,
    /// Whether the manager has a video file for this movie.
    pub has_file: bool,
    /// Alternate/localized titles.
    pub alternate_titles: Vec<String>,
}

/// One season of a show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Season {
    /// Season label, `season00`..`seasonNN`.
    pub season: String,
    /// Whether any episode of the season is on disk.
    pub has_episodes: bool,
}

impl Season {
    /// Create a season from its number.
    pub fn numbered(number: u32, has_episodes: bool) -> Self {
        Self {
            season: format!("season{:02}", number),
            has_episodes,
        }
    }

    /// Numeric part of the label.
    pub fn number(&self) -> Option<u32> {
        self.season
            .trim()
            .to_lowercase()
            .strip_prefix("season")
            .and_then(|n| n.trim().parse().ok())
    }

    /// Whether this season holds the specials.
    pub fn is_specials(&self) -> bool {
        self.number() == Some(0)
    }
}

/// A TV show as reported by a series manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Show {
    /// Folder title, e.g. `The Office (2005) {tvdb-73244}`.
    pub title: String,
    /// Stable id inside the media manager.
    pub id: u64,
    /// Ordered seasons.
    pub seasons: Vec<Season>,
    /// Lifecycle status (`continuing`, `ended`, ...).
    pub status: String,
    /// Whether any episode of the show is on disk.
    pub has_episodes: bool,
    /// Alternate/localized titles.
    pub alternate_titles: Vec<String>,
}

/// A collection from a media server library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    /// Collection title, e.g. `Marvel Collection`.
    pub title: String,
    /// Library the collection belongs to.
    pub library: Option<String>,
}

/// Any entity a poster can belong to.
#[derive(Debug, Clone)]
pub enum MediaEntity {
    Movie(Movie),
    Show(Show),
    Collection(Collection),
}

impl MediaEntity {
    /// Entity title.
    pub fn title(&self) -> &str {
        match self {
            MediaEntity::Movie(m) => &m.title,
            MediaEntity::Show(s) => &s.title,
            MediaEntity::Collection(c) => &c.title,
        }
    }

    /// Media type of the entity.
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaEntity::Movie(_) => MediaType::Movies,
            MediaEntity::Show(_) => MediaType::Shows,
            MediaEntity::Collection(_) => MediaType::Collections,
        }
    }
}

/// Snapshot of every entity known for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalogue {
    pub movies: Vec<Movie>,
    pub shows: Vec<Show>,
    pub collections: Vec<Collection>,
}

impl Catalogue {
    /// Total number of entities.
    pub fn len(&self) -> usize {
        self.movies.len() + self.shows.len() + self.collections.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of seasons across all shows.
    pub fn season_count(&self) -> usize {
        self.shows.iter().map(|s| s.seasons.len()).sum()
    }

    /// Iterate over every entity.
    pub fn entities(&self) -> impl Iterator<Item = MediaEntity> + '_ {
        self.collections
            .iter()
            .cloned()
            .map(MediaEntity::Collection)
            .chain(self.movies.iter().cloned().map(MediaEntity::Movie))
            .chain(self.shows.iter().cloned().map(MediaEntity::Show))
    }
}
