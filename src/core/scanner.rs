//! Source directory scanner module.
//!
//! Collects poster images from the configured source directories. Only the
//! top level of each directory is read; the first directory that holds a
//! given file name wins.

use crate::models::poster::PosterFile;
use crate::utils::fs::is_image_file;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of scanning the source directories.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Poster files, in directory priority order.
    pub posters: Vec<PosterFile>,
    /// Files shadowed by a same-named file in an earlier directory.
    pub duplicates: Vec<PathBuf>,
    /// Files ignored because they are not png/jpg/jpeg.
    pub skipped_non_image: usize,
    /// Source directories that do not exist.
    pub missing_dirs: Vec<PathBuf>,
}

impl ScanResult {
    /// Number of posters found.
    pub fn total_posters(&self) -> usize {
        self.posters.len()
    }
}

/// Scan every source directory, highest priority first.
pub fn scan_sources(source_dirs: &[PathBuf]) -> ScanResult {
    let mut result = ScanResult::default();
    let mut seen_names: HashSet<String> = HashSet::new();

    for dir in source_dirs {
        if !dir.is_dir() {
            tracing::warn!("Source directory not found: {:?}", dir);
            result.missing_dirs.push(dir.clone());
            continue;
        }

        for path in list_files(dir) {
            if !is_image_file(&path) {
                result.skipped_non_image += 1;
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !seen_names.insert(name) {
                tracing::debug!("Skipping shadowed poster: {:?}", path);
                result.duplicates.push(path);
                continue;
            }

            result.posters.push(PosterFile::from_path(&path));
        }
    }

    tracing::info!(
        "Scanned {} source dirs: {} posters, {} duplicates",
        source_dirs.len(),
        result.posters.len(),
        result.duplicates.len()
    );

    result
}

/// Files directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
