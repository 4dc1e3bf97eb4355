//! Asset and cache garbage collection.
//!
//! Runs after a sync batch. Orphan asset files go first, then cache rows
//! pointing at missing files, then empty folders, so a second pass finds
//! nothing to do.

use crate::core::cache::PersistentCache;
use crate::core::normalize::title_key;
use crate::models::cache::CacheFilter;
use crate::models::media::Catalogue;
use crate::models::poster::PosterAttributes;
use crate::utils::fs::{is_image_file, remove_empty_dirs};
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Cleanup settings.
#[derive(Debug, Clone)]
pub struct CleanupSettings {
    pub target_root: PathBuf,
    pub backup_root: Option<PathBuf>,
    pub asset_folders: bool,
    /// Delete asset files whose entity left the catalogue.
    pub clean_assets: bool,
}

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed_assets: usize,
    pub removed_backups: usize,
    pub removed_records: usize,
    pub removed_dirs: usize,
}

impl CleanupSummary {
    /// Whether the pass changed anything.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Title keys of every entity in the catalogue, as they appear on disk.
fn catalogue_keys(catalogue: &Catalogue) -> HashSet<String> {
    catalogue
        .entities()
        .map(|e| title_key(&sanitize_filename::sanitize(e.title())))
        .collect()
}

/// Title key an asset file belongs to.
fn asset_key(root: &Path, path: &Path, asset_folders: bool) -> Option<String> {
    if asset_folders {
        let relative = path.strip_prefix(root).ok()?;
        let mut components = relative.components();
        let folder = components.next()?.as_os_str().to_string_lossy().to_string();
        // Loose files at the root of a folder layout have no owner.
        components.next()?;
        Some(title_key(&folder))
    } else {
        let stem = path.file_stem()?.to_string_lossy().to_string();
        Some(PosterAttributes::derive(&stem).title_key)
    }
}

/// Delete image files under `root` whose title is not in `keys`.
fn remove_orphan_assets(root: &Path, keys: &HashSet<String>, asset_folders: bool) -> usize {
    if !root.is_dir() {
        return 0;
    }

    let orphans: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
        .map(|e| e.into_path())
        .filter(|p| match asset_key(root, p, asset_folders) {
            Some(key) => !keys.contains(&key),
            None => true,
        })
        .collect();

    let mut removed = 0;
    for path in orphans {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Removed orphan asset: {:?}", path);
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {:?}: {}", path, e),
        }
    }
    removed
}

/// Run a full cleanup pass.
pub fn collect_garbage<C: PersistentCache + ?Sized>(
    cache: &C,
    catalogue: &Catalogue,
    settings: &CleanupSettings,
) -> Result<CleanupSummary> {
    let mut summary = CleanupSummary::default();

    if settings.clean_assets {
        let keys = catalogue_keys(catalogue);
        summary.removed_assets = remove_orphan_assets(&settings.target_root, &keys, settings.asset_folders);
        if let Some(backup_root) = &settings.backup_root {
            summary.removed_backups = remove_orphan_assets(backup_root, &keys, settings.asset_folders);
        }
    }

    for path in cache.list_all(&CacheFilter::default())?.into_keys() {
        if !path.starts_with(&settings.target_root) || !path.exists() {
            if cache.delete(&path)? {
                tracing::debug!("Removed cache record for missing file: {:?}", path);
                summary.removed_records += 1;
            }
        }
    }

    if settings.clean_assets {
        summary.removed_dirs = remove_empty_dirs(&settings.target_root);
        if let Some(backup_root) = &settings.backup_root {
            summary.removed_dirs += remove_empty_dirs(backup_root);
        }
    }

    tracing::info!(
        "Cleanup: {} assets, {} backups, {} cache records, {} folders removed",
        summary.removed_assets,
        summary.removed_backups,
        summary.removed_records,
        summary.removed_dirs
    );

    Ok(summary)
}
