//! Run pipeline.
//!
//! A run moves through `Indexing -> Matching -> Syncing -> Uploading -> Done`.
//! Each transition hands the next stage its input by value; a run-level
//! error moves the run to `Failed` and stops it.

use crate::core::cache::PersistentCache;
use crate::core::catalogue::CatalogueSource;
use crate::core::gc::{collect_garbage, CleanupSettings, CleanupSummary};
use crate::core::matcher::MatchContext;
use crate::core::orchestrator::{match_catalogue, MatchReport, MatchStats};
use crate::core::progress::{Phase, ProgressTracker};
use crate::core::scanner::scan_sources;
use crate::core::search_index::SearchIndex;
use crate::core::sync::{SyncPipeline, SyncSettings, SyncSummary, SyncedAsset};
use crate::core::unmatched::{write_unmatched, UnmatchedLedger, UnmatchedTotals};
use crate::models::cache::CacheField;
use crate::models::config::RenamerConfig;
use crate::models::media::Catalogue;
use crate::Result;
use std::path::PathBuf;

/// Observable stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Indexing,
    Matching,
    Syncing,
    /// Cleanup and library upload.
    Uploading,
    Done,
    Failed(String),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Indexing => "indexing",
            Stage::Matching => "matching",
            Stage::Syncing => "syncing",
            Stage::Uploading => "uploading",
            Stage::Done => "done",
            Stage::Failed(_) => "failed",
        }
    }
}

/// Uploads synced posters to media server libraries.
pub trait LibraryUploader: Send + Sync {
    /// Upload one asset. Returns the libraries it was uploaded to.
    fn upload(&self, asset: &SyncedAsset) -> Result<Vec<String>>;
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_dirs: Vec<PathBuf>,
    pub sync: SyncSettings,
    pub matching: MatchContext,
    pub unmatched_assets: bool,
    pub clean_assets: bool,
}

impl RunSettings {
    /// Resolve run settings from configuration.
    pub fn from_config(config: &RenamerConfig, webhook_run: bool) -> Result<Self> {
        if config.source_dirs.is_empty() {
            return Err(crate::Error::InvalidConfig("no source_dirs configured".to_string()));
        }

        Ok(Self {
            source_dirs: config.source_dirs.clone(),
            sync: SyncSettings {
                target_root: config.target_dir.clone(),
                backup_root: config.backup_dir.clone(),
                asset_folders: config.asset_folders,
                border: config.border_mode(),
                webhook_run,
            },
            matching: MatchContext {
                alt_titles: config.match_alt,
                webhook_run,
            },
            unmatched_assets: config.unmatched_assets,
            clean_assets: config.clean_assets,
        })
    }

    fn cleanup(&self) -> CleanupSettings {
        CleanupSettings {
            target_root: self.sync.target_root.clone(),
            backup_root: self.sync.backup_root.clone(),
            asset_folders: self.sync.asset_folders,
            clean_assets: self.clean_assets,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Final stage, `Done` or `Failed`.
    pub stage: Stage,
    /// Stage the run failed in, if any.
    pub failed_stage: Option<&'static str>,
    pub posters_scanned: usize,
    pub match_stats: MatchStats,
    pub sync: SyncSummary,
    pub unmatched: Option<UnmatchedTotals>,
    pub cleanup: Option<CleanupSummary>,
    pub uploaded: usize,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            stage: Stage::Indexing,
            failed_stage: None,
            posters_scanned: 0,
            match_stats: MatchStats::default(),
            sync: SyncSummary::default(),
            unmatched: None,
            cleanup: None,
            uploaded: 0,
        }
    }
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Convert a failed run into an error.
    pub fn into_result(self) -> Result<Self> {
        match &self.stage {
            Stage::Failed(reason) => Err(crate::Error::RunFailed {
                stage: self.failed_stage.unwrap_or("unknown").to_string(),
                reason: reason.clone(),
            }),
            _ => Ok(self),
        }
    }
}

/// Input handed from one stage to the next.
enum Transition {
    Index,
    Match {
        catalogue: Catalogue,
        index: SearchIndex,
    },
    Sync {
        catalogue: Catalogue,
        report: MatchReport,
    },
    Upload {
        catalogue: Catalogue,
        synced: Vec<SyncedAsset>,
    },
    Done,
}

impl Transition {
    fn stage(&self) -> Stage {
        match self {
            Transition::Index => Stage::Indexing,
            Transition::Match { .. } => Stage::Matching,
            Transition::Sync { .. } => Stage::Syncing,
            Transition::Upload { .. } => Stage::Uploading,
            Transition::Done => Stage::Done,
        }
    }
}

/// One run over a catalogue, a set of source dirs and a cache.
pub struct Pipeline<'a, C: PersistentCache + UnmatchedLedger> {
    settings: RunSettings,
    source: &'a dyn CatalogueSource,
    cache: &'a C,
    uploader: Option<&'a dyn LibraryUploader>,
}

impl<'a, C: PersistentCache + UnmatchedLedger> Pipeline<'a, C> {
    pub fn new(settings: RunSettings, source: &'a dyn CatalogueSource, cache: &'a C) -> Self {
        Self {
            settings,
            source,
            cache,
            uploader: None,
        }
    }

    pub fn with_uploader(mut self, uploader: &'a dyn LibraryUploader) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Run every stage to completion or failure.
    pub fn run(&self, progress: &mut ProgressTracker<'_>) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut next = Transition::Index;

        loop {
            let stage = next.stage();
            tracing::debug!("Run {} entering {}", progress.job_id(), stage.name());
            summary.stage = stage.clone();

            let step = match next {
                Transition::Index => self.index(&mut summary, progress),
                Transition::Match { catalogue, index } => {
                    self.match_stage(catalogue, &index, &mut summary, progress)
                }
                Transition::Sync { catalogue, report } => {
                    Ok(self.sync_stage(catalogue, &report, &mut summary, progress))
                }
                Transition::Upload { catalogue, synced } => {
                    self.upload_stage(&catalogue, &synced, &mut summary, progress)
                }
                Transition::Done => break,
            };

            next = match step {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Run {} failed during {}: {}", progress.job_id(), stage.name(), e);
                    summary.failed_stage = Some(stage.name());
                    summary.stage = Stage::Failed(e.to_string());
                    progress.fail();
                    return summary;
                }
            };
        }

        progress.complete();
        summary
    }

    fn index(&self, summary: &mut RunSummary, progress: &mut ProgressTracker<'_>) -> Result<Transition> {
        let catalogue = self.source.fetch()?;
        progress.phase(Phase::Indexing, 1, 3);

        std::fs::create_dir_all(&self.settings.sync.target_root)?;
        let scan = scan_sources(&self.settings.source_dirs);
        summary.posters_scanned = scan.total_posters();
        progress.phase(Phase::Indexing, 2, 3);

        let index = SearchIndex::build(scan.posters);
        progress.phase(Phase::Indexing, 3, 3);

        Ok(Transition::Match { catalogue, index })
    }

    fn match_stage(
        &self,
        catalogue: Catalogue,
        index: &SearchIndex,
        summary: &mut RunSummary,
        progress: &mut ProgressTracker<'_>,
    ) -> Result<Transition> {
        let report = match_catalogue(&catalogue, index, &self.settings.matching, progress);
        summary.match_stats = report.stats.clone();

        if self.settings.unmatched_assets {
            match write_unmatched(self.cache, &catalogue, &report.unmatched) {
                Ok(totals) => summary.unmatched = Some(totals),
                Err(e) => tracing::warn!("Failed to write unmatched ledger: {}", e),
            }
        }

        Ok(Transition::Sync { catalogue, report })
    }

    fn sync_stage(
        &self,
        catalogue: Catalogue,
        report: &MatchReport,
        summary: &mut RunSummary,
        progress: &mut ProgressTracker<'_>,
    ) -> Transition {
        let sync = SyncPipeline::new(self.cache, self.settings.sync.clone());
        summary.sync = sync.sync_all(&report.matches, progress);

        Transition::Upload {
            catalogue,
            synced: summary.sync.synced.clone(),
        }
    }

    fn upload_stage(
        &self,
        catalogue: &Catalogue,
        synced: &[SyncedAsset],
        summary: &mut RunSummary,
        progress: &mut ProgressTracker<'_>,
    ) -> Result<Transition> {
        summary.cleanup = Some(collect_garbage(self.cache, catalogue, &self.settings.cleanup())?);
        progress.phase(Phase::Finishing, 1, 2);

        if let Some(uploader) = self.uploader {
            for (i, asset) in synced.iter().enumerate() {
                match uploader.upload(asset) {
                    Ok(libraries) => {
                        self.cache
                            .update_field(&asset.target, &CacheField::UploadedToLibraries(libraries))?;
                        summary.uploaded += 1;
                    }
                    Err(e) => tracing::warn!("Upload failed for {:?}: {}", asset.target, e),
                }
                progress.phase(Phase::Finishing, synced.len() + i + 1, 2 * synced.len());
            }
        }

        Ok(Transition::Done)
    }
}
