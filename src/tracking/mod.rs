//! Evaluation Tracking Module
//!
//! Read-side view over the evaluation runs produced by the training
//! pipeline, plus a small recorder used to append new evaluation results.
//! Backed by pluggable storage via the [`RunStore`](storage::RunStore)
//! trait.
//!
//! # Architecture
//!
//! - **`EvalRun`**: One evaluation execution, tagged with the training run
//!   it scored (`source_run_id`) and carrying a metric map
//! - **`MetricLookup`**: Resolves the authoritative metric value for a
//!   training run (most recent finished evaluation wins)
//! - **`EvalRecorder`**: Appends finished evaluation runs to a store
//! - **`RunStore`**: Pluggable persistence (JSON files, in-memory)
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use abandono::tracking::{EvalRecorder, MetricLookup};
//! use abandono::tracking::storage::InMemoryRunStore;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = EvalRecorder::new(InMemoryRunStore::new());
//! let mut metrics = HashMap::new();
//! metrics.insert("f1_score".to_string(), 0.85);
//! recorder.record_finished("train-run-42", metrics)?;
//!
//! let lookup = MetricLookup::new(recorder.store());
//! let value = lookup.metric_for_run("train-run-42", "f1_score")?;
//! assert_eq!(value, Some(0.85));
//! # Ok(())
//! # }
//! ```

pub mod storage;


use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use storage::{RunStore, RunStorageError};

/// Tag key linking an evaluation run back to the training run it scored
pub const SOURCE_RUN_TAG: &str = "source_run_id";

/// Current unix timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Status of an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is still executing
    Running,
    /// Run completed successfully
    Finished,
    /// Run failed
    Failed,
    /// Run was killed before completion
    Killed,
}

/// A single evaluation run
///
/// Carries the metric values produced by one evaluation of a training run.
/// Multiple evaluation runs may reference the same `source_run_id`
/// (re-evaluations); the most recent finished one is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRun {
    /// Unique identifier for the evaluation run
    pub run_id: String,
    /// Current status
    pub status: RunStatus,
    /// Unix timestamp (ms) when the run ended
    pub end_time_ms: Option<u64>,
    /// Tags: key -> value. `source_run_id` links to the evaluated training run
    pub tags: HashMap<String, String>,
    /// Metrics: name -> value
    pub metrics: HashMap<String, f64>,
}

impl EvalRun {
    /// Create a finished evaluation run for the given training run
    pub fn finished(
        run_id: impl Into<String>,
        source_run_id: &str,
        metrics: HashMap<String, f64>,
    ) -> Self {
        let mut tags = HashMap::new();
        tags.insert(SOURCE_RUN_TAG.to_string(), source_run_id.to_string());
        Self {
            run_id: run_id.into(),
            status: RunStatus::Finished,
            end_time_ms: Some(now_ms()),
            tags,
            metrics,
        }
    }

    /// The training run this evaluation scored, if tagged
    #[must_use]
    pub fn source_run_id(&self) -> Option<&str> {
        self.tags.get(SOURCE_RUN_TAG).map(String::as_str)
    }
}

/// Errors from evaluation tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    /// No finished evaluation run references the given training run.
    /// Distinct from a run that exists but lacks the requested metric,
    /// which surfaces as `Ok(None)` from the lookup.
    #[error("no finished evaluation run for training run: {0}")]
    NoFinishedEvaluation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RunStorageError),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Resolves evaluation metrics for training runs
///
/// Scans all evaluation runs, keeps those whose `source_run_id` tag matches
/// the training run and whose status is `Finished`, and reads the metric
/// from the one with the latest end time.
#[derive(Debug)]
pub struct MetricLookup<'a, S: RunStore> {
    store: &'a S,
}

impl<'a, S: RunStore> MetricLookup<'a, S> {
    /// Create a lookup over the given run store
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve the metric value for a training run
    ///
    /// Returns `Ok(Some(v))` when the latest finished evaluation carries the
    /// metric, `Ok(None)` when that evaluation exists but lacks the metric
    /// key, and `Err(TrackingError::NoFinishedEvaluation)` when no finished
    /// evaluation references the run at all.
    pub fn metric_for_run(&self, run_id: &str, metric_name: &str) -> Result<Option<f64>> {
        let runs = self.store.list_runs()?;
        let latest = runs
            .into_iter()
            .filter(|r| r.status == RunStatus::Finished && r.source_run_id() == Some(run_id))
            .max_by_key(|r| r.end_time_ms.unwrap_or(0))
            .ok_or_else(|| TrackingError::NoFinishedEvaluation(run_id.to_string()))?;

        debug!(
            eval_run = %latest.run_id,
            source_run = run_id,
            "selected latest finished evaluation"
        );
        Ok(latest.metrics.get(metric_name).copied())
    }
}

/// Appends evaluation runs to a store
///
/// Run IDs are generated as `eval-{n}`, with the counter seeded from the
/// number of runs already persisted.
#[derive(Debug)]
pub struct EvalRecorder<S: RunStore> {
    store: S,
    next_run_id: u64,
}

impl<S: RunStore> EvalRecorder<S> {
    /// Create a recorder over the given store
    pub fn new(store: S) -> Self {
        let next_run_id = store.list_runs().map(|r| r.len() as u64).unwrap_or(0) + 1;
        Self { store, next_run_id }
    }

    /// Record a finished evaluation of `source_run_id` with the given metrics
    ///
    /// Returns the persisted run.
    pub fn record_finished(
        &mut self,
        source_run_id: &str,
        metrics: HashMap<String, f64>,
    ) -> Result<EvalRun> {
        let run_id = format!("eval-{}", self.next_run_id);
        self.next_run_id += 1;

        let run = EvalRun::finished(run_id, source_run_id, metrics);
        self.store.save_run(&run)?;
        debug!(run_id = %run.run_id, source_run = source_run_id, "recorded evaluation run");
        Ok(run)
    }

    /// Shared access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the recorder, returning the store
    pub fn into_store(self) -> S {
        self.store
    }
}
