//! Persistent cache data model.

use crate::models::media::MediaType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Last synchronized state of one target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Target file path; primary key.
    pub file_path: PathBuf,
    /// Target file stem.
    pub file_name: String,
    /// Lifecycle status of the entity.
    pub status: Option<String>,
    /// Season or show has episodes on disk.
    pub has_episodes: Option<bool>,
    /// Movie has a video file.
    pub has_file: Option<bool>,
    /// Entity type.
    pub media_type: MediaType,
    /// Hash of the file as written to the target.
    pub file_hash: String,
    /// Hash of the untransformed source.
    pub original_file_hash: String,
    /// Source poster path.
    pub source_path: PathBuf,
    /// Whether a border transform was applied.
    pub border_replaced: bool,
    /// Border mode used (`remove` or `paint`).
    pub border_setting: Option<String>,
    /// Border color used, `#rrggbb`.
    pub border_color: Option<String>,
    /// Libraries the poster was uploaded to.
    pub uploaded_to_libraries: Vec<String>,
    /// Written or confirmed by a webhook-triggered run.
    pub webhook_run: bool,
    /// RFC3339 timestamp of the last write.
    pub timestamp: String,
}

/// A single column update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheField {
    Status(Option<String>),
    HasEpisodes(Option<bool>),
    HasFile(Option<bool>),
    WebhookRun(bool),
    UploadedToLibraries(Vec<String>),
}

impl CacheField {
    /// Column name updated by this field.
    pub fn column(&self) -> &'static str {
        match self {
            CacheField::Status(_) => "status",
            CacheField::HasEpisodes(_) => "has_episodes",
            CacheField::HasFile(_) => "has_file",
            CacheField::WebhookRun(_) => "webhook_run",
            CacheField::UploadedToLibraries(_) => "uploaded_to_libraries",
        }
    }
}

/// Filter for listing cache records.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFilter {
    /// Only records whose webhook flag equals this value.
    pub webhook_run: Option<bool>,
    /// Only records of this media type.
    pub media_type: Option<MediaType>,
}

impl CacheFilter {
    /// Whether a record passes the filter.
    pub fn accepts(&self, record: &CacheRecord) -> bool {
        self.webhook_run.map_or(true, |w| record.webhook_run == w)
            && self.media_type.map_or(true, |t| record.media_type == t)
    }
}
