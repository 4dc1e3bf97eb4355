//! Target path generator.
//!
//! Flat layout:
//! - `<Title>.ext`
//! - `<Title> - Season NN.ext`
//! - `<Title> - Specials.ext`
//!
//! Asset-folder layout:
//! - `<Title>/poster.ext`
//! - `<Title>/SeasonNN.ext`
//! - `<Title>/Season00.ext`

use crate::core::matcher::{Match, PosterSlot};
use std::path::PathBuf;

/// Target path, relative to the asset root.
pub fn target_path(title: &str, slot: PosterSlot, extension: &str, asset_folders: bool) -> PathBuf {
    let name = sanitize_filename::sanitize(title);

    if asset_folders {
        let file = match slot {
            PosterSlot::Poster => "poster".to_string(),
            PosterSlot::Season(n) => format!("Season{:02}", n),
            PosterSlot::Specials => "Season00".to_string(),
        };
        PathBuf::from(name).join(format!("{}.{}", file, extension))
    } else {
        let file = match slot {
            PosterSlot::Poster => name,
            PosterSlot::Season(n) => format!("{} - Season {:02}", name, n),
            PosterSlot::Specials => format!("{} - Specials", name),
        };
        PathBuf::from(format!("{}.{}", file, extension))
    }
}

/// Target path for a match.
pub fn target_for(m: &Match, asset_folders: bool) -> PathBuf {
    target_path(&m.title, m.slot, &m.poster.extension, asset_folders)
}
