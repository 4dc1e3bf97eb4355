//! Job scheduler.
//!
//! Runs whole pipelines on a bounded number of worker slots. Runs that share
//! a cache file are serialized so the cache only ever has one writer.

use crate::core::cache::SqliteCache;
use crate::core::catalogue::CatalogueSource;
use crate::core::pipeline::{LibraryUploader, Pipeline, RunSettings, RunSummary, Stage};
use crate::core::progress::{Fanout, ProgressMap, ProgressSink, ProgressState, ProgressTracker};
use crate::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Default number of worker slots.
pub const DEFAULT_SLOTS: usize = 2;

/// A run to schedule.
#[derive(Clone)]
pub struct JobRequest {
    /// Job name; the job id is `<name>_<NNNN>`.
    pub name: String,
    pub settings: RunSettings,
    pub cache_path: PathBuf,
    pub source: Arc<dyn CatalogueSource>,
    pub uploader: Option<Arc<dyn LibraryUploader>>,
}

/// Finished job, kept in the history.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub run_id: Uuid,
    pub job_id: String,
    pub name: String,
    pub started_at: String,
    pub finished_at: String,
    pub summary: RunSummary,
}

impl JobRecord {
    pub fn succeeded(&self) -> bool {
        self.summary.is_success()
    }
}

/// Bounded pool of pipeline runs.
pub struct JobScheduler {
    slots: usize,
    progress: ProgressMap,
    /// Extra sinks that see every update, e.g. a terminal bar.
    sinks: Vec<Arc<dyn ProgressSink>>,
    cache_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
    history: Mutex<Vec<JobRecord>>,
}

impl JobScheduler {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: slots.max(1),
            progress: ProgressMap::new(),
            sinks: Vec::new(),
            cache_locks: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Also send progress to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Shared progress of every job.
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    fn cache_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.cache_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Summary for a run that never reached the pipeline.
    fn fail_job(&self, job_id: &str, reason: String) -> RunSummary {
        tracing::error!("Job {} could not run: {}", job_id, reason);
        self.progress.report(job_id, 0, ProgressState::Failed);
        RunSummary {
            stage: Stage::Failed(reason),
            failed_stage: Some("indexing"),
            ..Default::default()
        }
    }

    /// Run one job to completion.
    pub async fn submit(&self, request: JobRequest) -> JobRecord {
        let job_id = self.progress.next_job_id(&request.name);
        let run_id = Uuid::new_v4();

        let lock = self.cache_lock(&request.cache_path);
        let _writer = lock.lock().await;

        let started_at = Utc::now().to_rfc3339();
        tracing::info!("Starting job {} (run {})", job_id, run_id);

        let mut sinks: Vec<Arc<dyn ProgressSink>> = vec![Arc::new(self.progress.clone())];
        sinks.extend(self.sinks.iter().cloned());
        let progress = Fanout(sinks);
        let task_job_id = job_id.clone();
        let JobRequest {
            name,
            settings,
            cache_path,
            source,
            uploader,
        } = request;

        let joined = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
            let cache = SqliteCache::open(&cache_path)?;
            let mut tracker = ProgressTracker::new(&progress, task_job_id);
            let mut pipeline = Pipeline::new(settings, source.as_ref(), &cache);
            if let Some(uploader) = uploader.as_deref() {
                pipeline = pipeline.with_uploader(uploader);
            }
            Ok(pipeline.run(&mut tracker))
        })
        .await;

        let summary = match joined {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => self.fail_job(&job_id, e.to_string()),
            Err(e) => self.fail_job(&job_id, format!("worker panicked: {}", e)),
        };

        let record = JobRecord {
            run_id,
            job_id,
            name,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            summary,
        };
        tracing::info!(
            "Job {} finished: {}",
            record.job_id,
            if record.succeeded() { "completed" } else { "failed" }
        );

        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        record
    }

    /// Run jobs, at most `slots` at a time.
    pub async fn run_all(&self, requests: Vec<JobRequest>) -> Vec<JobRecord> {
        stream::iter(requests)
            .map(|request| self.submit(request))
            .buffer_unordered(self.slots)
            .collect()
            .await
    }

    /// Every finished job, oldest first.
    pub fn history(&self) -> Vec<JobRecord> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Finished job by id.
    pub fn record(&self, job_id: &str) -> Result<JobRecord> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| r.job_id == job_id)
            .cloned()
            .ok_or_else(|| crate::Error::UnknownJob(job_id.to_string()))
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}
