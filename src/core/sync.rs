//! Poster synchronization.
//!
//! Copies matched posters into the asset library, keyed by content hash so
//! an unchanged source under unchanged settings is never written twice.
//!
//! Per file:
//! 1. Hash the source
//! 2. Compare with the cache record of the target
//! 3. Stage the border transform and settle which record owns the hashes
//! 4. Back up the original, copy into place
//! 5. Upsert the cache record

use crate::core::border::{apply_border, BorderMode};
use crate::core::cache::PersistentCache;
use crate::core::matcher::Match;
use crate::core::progress::{Phase, ProgressTracker};
use crate::generators::target::target_for;
use crate::models::cache::{CacheField, CacheRecord};
use crate::models::media::MediaType;
use crate::utils::fs::copy_file;
use crate::utils::hash::sha256_file;
use crate::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings that stay fixed for a run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Asset library root.
    pub target_root: PathBuf,
    /// Root for untouched copies of the sources.
    pub backup_root: Option<PathBuf>,
    /// Per-entity folder layout.
    pub asset_folders: bool,
    /// Border transform, if enabled and valid.
    pub border: Option<BorderMode>,
    /// Webhook-triggered run.
    pub webhook_run: bool,
}

/// What happened to one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed; only the webhook flag may have been set.
    Skipped { flag_updated: bool },
    /// The target was (re)written.
    Written { first_write: bool },
}

/// A target that was written during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedAsset {
    pub target: PathBuf,
    pub media_type: MediaType,
    pub title: String,
}

/// Batch summary.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub written: usize,
    pub skipped: usize,
    pub flag_updates: usize,
    pub failed: usize,
    /// Targets written, in match order.
    pub synced: Vec<SyncedAsset>,
    /// Source path and reason for every failed file.
    pub failures: Vec<(PathBuf, String)>,
}

/// Border output waiting beside its target; removed on drop.
struct StagedPoster {
    path: PathBuf,
    hash: String,
}

impl Drop for StagedPoster {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove {:?}: {}", self.path, e);
            }
        }
    }
}

/// Compares matches against the cache and writes what changed.
pub struct SyncPipeline<'a, C: PersistentCache + ?Sized> {
    cache: &'a C,
    settings: SyncSettings,
}

impl<'a, C: PersistentCache + ?Sized> SyncPipeline<'a, C> {
    pub fn new(cache: &'a C, settings: SyncSettings) -> Self {
        Self { cache, settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Absolute target path of a match.
    pub fn target_path(&self, m: &Match) -> PathBuf {
        self.settings
            .target_root
            .join(target_for(m, self.settings.asset_folders))
    }

    fn border_state(&self) -> (bool, Option<String>, Option<String>) {
        match self.settings.border {
            Some(mode) => (true, Some(mode.setting().to_string()), mode.color_hex()),
            None => (false, None, None),
        }
    }

    fn is_unchanged(&self, record: &CacheRecord, m: &Match, target: &Path, original_hash: &str) -> bool {
        let (replaced, setting, color) = self.border_state();
        record.file_path == target
            && record.original_file_hash == original_hash
            && record.source_path == m.poster.path
            && record.border_replaced == replaced
            && record.border_setting == setting
            && record.border_color == color
            && target.exists()
    }

    fn reconcile_fields(&self, record: &CacheRecord, m: &Match) -> Result<()> {
        let mut fields = Vec::new();
        if record.status != m.status {
            fields.push(CacheField::Status(m.status.clone()));
        }
        if record.has_episodes != m.has_episodes {
            fields.push(CacheField::HasEpisodes(m.has_episodes));
        }
        if record.has_file != m.has_file {
            fields.push(CacheField::HasFile(m.has_file));
        }
        for field in fields {
            tracing::debug!("Updating {} for {:?}", field.column(), record.file_path);
            self.cache.update_field(&record.file_path, &field)?;
        }
        Ok(())
    }

    /// Copy the untouched source into the backup tree unless an identical
    /// copy is already there.
    fn backup(&self, m: &Match, original_hash: &str) -> Result<()> {
        let Some(root) = &self.settings.backup_root else {
            return Ok(());
        };
        let backup = root.join(target_for(m, self.settings.asset_folders));

        if backup.exists() && sha256_file(&backup)? == original_hash {
            tracing::debug!("Backup up to date: {:?}", backup);
            return Ok(());
        }

        copy_file(&m.poster.path, &backup)?;
        tracing::debug!("Backed up {:?} -> {:?}", m.poster.path, backup);
        Ok(())
    }

    /// Render the border transform to `temp_<name>` beside the target.
    fn stage_border(&self, mode: BorderMode, source: &Path, target: &Path) -> Result<StagedPoster> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut staged = StagedPoster {
            path: target.with_file_name(format!("temp_{}", file_name)),
            hash: String::new(),
        };

        apply_border(mode, source, &staged.path)?;
        staged.hash = sha256_file(&staged.path)?;
        Ok(staged)
    }

    /// Make sure no other cache row holds a hash about to be written.
    ///
    /// Rows left by the same source under another target, or pointing at a
    /// file that is gone, are dropped. A live row of another source is a
    /// conflict and nothing is written.
    fn release_hashes(&self, m: &Match, target: &Path, hashes: &[&str]) -> Result<()> {
        for hash in hashes {
            for other in self.cache.find_by_hash(hash)? {
                if other.file_path == target {
                    continue;
                }
                if other.source_path == m.poster.path || !other.file_path.exists() {
                    tracing::info!("Moving cache record {:?} -> {:?}", other.file_path, target);
                    self.cache.delete(&other.file_path)?;
                } else {
                    return Err(crate::Error::DuplicateContent {
                        path: m.poster.path.display().to_string(),
                        owner: other.file_path.display().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Synchronize one match.
    pub fn sync_one(&self, m: &Match) -> Result<SyncOutcome> {
        let target = self.target_path(m);
        let original_hash = sha256_file(&m.poster.path)?;
        let record = self.cache.get(&target)?;

        if let Some(record) = &record {
            if self.is_unchanged(record, m, &target, &original_hash) {
                let flag_updated = self.settings.webhook_run && !record.webhook_run;
                if flag_updated {
                    self.cache.update_field(&target, &CacheField::WebhookRun(true))?;
                }
                tracing::debug!("Unchanged, skipping: {:?}", target);
                return Ok(SyncOutcome::Skipped { flag_updated });
            }
            self.reconcile_fields(record, m)?;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let staged = match self.settings.border {
            Some(mode) => match self.stage_border(mode, &m.poster.path, &target) {
                Ok(staged) => Some(staged),
                Err(e) => {
                    tracing::warn!("Border transform failed for {:?}, copying original: {}", m.poster.path, e);
                    None
                }
            },
            None => None,
        };
        let file_hash = staged
            .as_ref()
            .map_or_else(|| original_hash.clone(), |s| s.hash.clone());

        let mut hashes = vec![original_hash.as_str()];
        if file_hash != original_hash {
            hashes.push(file_hash.as_str());
        }
        self.release_hashes(m, &target, &hashes)?;

        if let Err(e) = self.backup(m, &original_hash) {
            tracing::warn!("Backup failed for {:?}: {}", m.poster.path, e);
        }

        let previously_bordered = record.as_ref().is_some_and(|r| r.border_replaced);
        match &staged {
            Some(staged) => {
                fs::copy(&staged.path, &target)?;
            }
            None => {
                if previously_bordered && target.exists() {
                    fs::remove_file(&target)?;
                }
                fs::copy(&m.poster.path, &target)?;
            }
        }
        let border_replaced = staged.is_some();
        drop(staged);

        let (border_setting, border_color) = match (border_replaced, self.settings.border) {
            (true, Some(mode)) => (Some(mode.setting().to_string()), mode.color_hex()),
            _ => (None, None),
        };

        let content_changed = record
            .as_ref()
            .map_or(true, |r| r.original_file_hash != original_hash || r.file_hash != file_hash);
        let uploaded_to_libraries = match &record {
            Some(r) if !content_changed => r.uploaded_to_libraries.clone(),
            _ => Vec::new(),
        };

        let file_name = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        self.cache.upsert(&CacheRecord {
            file_path: target.clone(),
            file_name,
            status: m.status.clone(),
            has_episodes: m.has_episodes,
            has_file: m.has_file,
            media_type: m.media_type,
            file_hash,
            original_file_hash: original_hash,
            source_path: m.poster.path.clone(),
            border_replaced,
            border_setting,
            border_color,
            uploaded_to_libraries,
            webhook_run: self.settings.webhook_run,
            timestamp: Utc::now().to_rfc3339(),
        })?;

        tracing::info!("Synced {:?} -> {:?}", m.poster.path, target);
        Ok(SyncOutcome::Written {
            first_write: record.is_none(),
        })
    }

    /// Synchronize every match. Failures are logged and counted, never
    /// propagated.
    pub fn sync_all(&self, matches: &[Match], progress: &mut ProgressTracker<'_>) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let total = matches.len();

        for (i, m) in matches.iter().enumerate() {
            match self.sync_one(m) {
                Ok(SyncOutcome::Skipped { flag_updated }) => {
                    summary.skipped += 1;
                    if flag_updated {
                        summary.flag_updates += 1;
                    }
                }
                Ok(SyncOutcome::Written { .. }) => {
                    summary.written += 1;
                    summary.synced.push(SyncedAsset {
                        target: self.target_path(m),
                        media_type: m.media_type,
                        title: m.title.clone(),
                    });
                }
                Err(e) => {
                    tracing::error!("Sync failed: {} - {}", m.poster.path.display(), e);
                    summary.failed += 1;
                    summary.failures.push((m.poster.path.clone(), e.to_string()));
                }
            }
            progress.phase(Phase::Syncing, i + 1, total);
        }

        tracing::info!(
            "Sync complete: {} written, {} unchanged, {} failed",
            summary.written,
            summary.skipped,
            summary.failed
        );

        summary
    }
}
