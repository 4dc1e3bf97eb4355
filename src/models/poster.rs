//! Poster file model.

use crate::core::normalize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SEASON_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\s+-\s+season\s*(\d+)\s*$").ok());
static SPECIALS_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\s+-\s+specials\s*$").ok());

/// An external id tag such as `{tmdb-27205}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId {
    /// `imdb`, `tmdb` or `tvdb`.
    pub provider: String,
    /// Lowercased id value.
    pub value: String,
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}-{}}}", self.provider, self.value)
    }
}

/// Season marker found in a poster stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonInfo {
    /// `- Season NN`
    Numbered(u32),
    /// `- Specials`
    Specials,
}

/// Attributes derived once from a poster stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterAttributes {
    /// Normalized stem without id tag; the claim key.
    pub normalized: String,
    /// `normalized` without a trailing ` collection`.
    pub decollectioned: String,
    /// Normalized title part, with id tag and season marker removed.
    pub title_key: String,
    /// Parenthesized year token.
    pub year: Option<String>,
    /// Embedded external id.
    pub external_id: Option<ExternalId>,
    /// Season marker.
    pub season: Option<SeasonInfo>,
}

impl PosterAttributes {
    /// Derive every attribute from a file stem.
    pub fn derive(stem: &str) -> Self {
        let external_id = normalize::extract_id(stem);
        let without_id = normalize::strip_id(stem);

        let (season, title_part) = split_season(&without_id);

        let normalized = normalize::normalize(&without_id);
        let decollectioned = normalized
            .strip_suffix(" collection")
            .unwrap_or(&normalized)
            .to_string();

        Self {
            title_key: normalize::normalize(&title_part),
            year: normalize::extract_year(&title_part),
            decollectioned,
            normalized,
            external_id,
            season,
        }
    }

    /// Whether the stem carries a season or specials marker.
    pub fn has_season_info(&self) -> bool {
        self.season.is_some()
    }

    /// Season number, `0` for specials.
    pub fn season_number(&self) -> Option<u32> {
        match self.season {
            Some(SeasonInfo::Numbered(n)) => Some(n),
            Some(SeasonInfo::Specials) => Some(0),
            None => None,
        }
    }
}

/// Split a trailing season marker off a stem.
fn split_season(stem: &str) -> (Option<SeasonInfo>, String) {
    if let Some(re) = SEASON_RE.as_ref() {
        if let Some(caps) = re.captures(stem) {
            if let (Some(whole), Some(num)) = (caps.get(0), caps.get(1)) {
                if let Ok(n) = num.as_str().parse() {
                    return (Some(SeasonInfo::Numbered(n)), stem[..whole.start()].to_string());
                }
            }
        }
    }

    if let Some(re) = SPECIALS_RE.as_ref() {
        if let Some(whole) = re.find(stem) {
            return (Some(SeasonInfo::Specials), stem[..whole.start()].to_string());
        }
    }

    (None, stem.to_string())
}

/// An image file found in a source directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without extension.
    pub stem: String,
    /// Lowercased extension.
    pub extension: String,
    /// Derived attributes.
    pub attrs: PosterAttributes,
}

impl PosterFile {
    /// Build a poster from its path, deriving attributes.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = crate::utils::fs::get_extension(path).unwrap_or_default();
        let attrs = PosterAttributes::derive(&stem);

        Self {
            path: path.to_path_buf(),
            stem,
            extension,
            attrs,
        }
    }
}
