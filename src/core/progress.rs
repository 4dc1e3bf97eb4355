//! Run progress reporting.
//!
//! Runs report a percentage and state per job id through a [`ProgressSink`].
//! Each phase of a run owns a fixed sub-range of the percentage.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Job state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Latest progress of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub percent: u8,
    pub state: ProgressState,
}

/// Receives progress updates. Return values are never inspected.
pub trait ProgressSink: Send + Sync {
    fn report(&self, job_id: &str, percent: u8, state: ProgressState);
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _job_id: &str, _percent: u8, _state: ProgressState) {}
}

/// Shared job id -> progress map.
#[derive(Debug, Clone, Default)]
pub struct ProgressMap {
    entries: Arc<Mutex<HashMap<String, ProgressEntry>>>,
    counter: Arc<AtomicU32>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a job id `<name>_<NNNN>` and register it as pending.
    pub fn next_job_id(&self, name: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = format!("{}_{:04}", name, n % 10_000);
        self.report(&job_id, 0, ProgressState::Pending);
        job_id
    }

    /// Progress of a job.
    pub fn get(&self, job_id: &str) -> Option<ProgressEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(job_id).copied()
    }

    /// Copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, ProgressEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ProgressSink for ProgressMap {
    fn report(&self, job_id: &str, percent: u8, state: ProgressState) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            job_id.to_string(),
            ProgressEntry {
                percent: percent.min(100),
                state,
            },
        );
    }
}

/// Forwards every update to several sinks.
#[derive(Clone, Default)]
pub struct Fanout(pub Vec<Arc<dyn ProgressSink>>);

impl ProgressSink for Fanout {
    fn report(&self, job_id: &str, percent: u8, state: ProgressState) {
        for sink in &self.0 {
            sink.report(job_id, percent, state);
        }
    }
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, job_id: &str, percent: u8, state: ProgressState) {
        self.bar.set_position(u64::from(percent));
        match state {
            ProgressState::Completed => self.bar.finish_with_message(format!("{} done", job_id)),
            ProgressState::Failed => self.bar.abandon_with_message(format!("{} failed", job_id)),
            _ => self.bar.set_message(job_id.to_string()),
        }
    }
}

/// Run phase and its share of the total percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Indexing,
    Matching,
    Syncing,
    Finishing,
}

impl Phase {
    /// Percentage range covered by the phase.
    pub fn range(&self) -> (u8, u8) {
        match self {
            Phase::Indexing => (0, 10),
            Phase::Matching => (10, 80),
            Phase::Syncing => (80, 95),
            Phase::Finishing => (95, 100),
        }
    }
}

/// Reports one job's progress, never going backwards.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    job_id: String,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink, job_id: impl Into<String>) -> Self {
        Self {
            sink,
            job_id: job_id.into(),
            last: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Last reported percentage.
    pub fn percent(&self) -> u8 {
        self.last
    }

    /// Report `done` of `total` steps inside `phase`.
    pub fn phase(&mut self, phase: Phase, done: usize, total: usize) {
        let (start, end) = phase.range();
        let span = usize::from(end - start);
        let offset = if total == 0 { span } else { span * done.min(total) / total };
        self.set(start.saturating_add(offset as u8));
    }

    /// Report an absolute percentage; lower values are ignored.
    pub fn set(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.last || (percent == 0 && self.last == 0) {
            self.last = percent;
            self.sink.report(&self.job_id, percent, ProgressState::InProgress);
        }
    }

    pub fn complete(&mut self) {
        self.last = 100;
        self.sink.report(&self.job_id, 100, ProgressState::Completed);
    }

    pub fn fail(&mut self) {
        self.sink.report(&self.job_id, self.last, ProgressState::Failed);
    }
}
