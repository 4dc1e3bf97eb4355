//! File system utilities.

use crate::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Poster image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::copy(from, to)?;
    Ok(())
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file is a poster image based on extension.
pub fn is_image_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Remove empty directories below `root`, deepest first. `root` itself is kept.
pub fn remove_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = std::fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            match std::fs::remove_dir(entry.path()) {
                Ok(()) => {
                    tracing::debug!("Removed empty directory: {}", entry.path().display());
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", entry.path().display(), e);
                }
            }
        }
    }

    removed
}
