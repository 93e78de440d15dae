//! Evaluation-run storage backends
//!
//! Provides the `RunStore` trait and two implementations: a JSON
//! file-per-run store for local pipelines and an in-memory store for tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::EvalRun;

/// Errors from run storage operations
#[derive(Debug, thiserror::Error)]
pub enum RunStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {0}")]
    RunNotFound(String),
}

/// Result alias for run storage operations
pub type Result<T> = std::result::Result<T, RunStorageError>;

/// Trait for evaluation-run storage backends
///
/// Implementations persist and retrieve evaluation runs. The tracking
/// backend itself is an external collaborator; this trait is the seam the
/// registry core consumes it through.
pub trait RunStore {
    /// Save a run, replacing any prior run with the same ID
    fn save_run(&mut self, run: &EvalRun) -> Result<()>;

    /// Load a run by its ID
    fn load_run(&self, run_id: &str) -> Result<EvalRun>;

    /// List all stored runs across all experiments
    fn list_runs(&self) -> Result<Vec<EvalRun>>;

    /// Delete a run by its ID
    fn delete_run(&mut self, run_id: &str) -> Result<()>;
}

/// JSON file-based run store
///
/// Stores each evaluation run as a separate JSON file in a directory.
/// File names are `{run_id}.json`.
#[derive(Debug)]
pub struct JsonFileRunStore {
    dir: PathBuf,
}

impl JsonFileRunStore {
    /// Create a new JSON run store rooted at `dir`, creating it lazily on
    /// first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl RunStore for JsonFileRunStore {
    fn save_run(&mut self, run: &EvalRun) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(run)?;
        fs::write(self.run_path(&run.run_id), json)?;
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<EvalRun> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Err(RunStorageError::RunNotFound(run_id.to_string()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn list_runs(&self) -> Result<Vec<EvalRun>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut runs: Vec<EvalRun> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let json = fs::read_to_string(&path)?;
                runs.push(serde_json::from_str(&json)?);
            }
        }
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }

    fn delete_run(&mut self, run_id: &str) -> Result<()> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Err(RunStorageError::RunNotFound(run_id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

/// In-memory run store for testing
///
/// Stores runs in a `HashMap`. No persistence.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: HashMap<String, EvalRun>,
}

impl InMemoryRunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for InMemoryRunStore {
    fn save_run(&mut self, run: &EvalRun) -> Result<()> {
        self.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<EvalRun> {
        self.runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| RunStorageError::RunNotFound(run_id.to_string()))
    }

    fn list_runs(&self) -> Result<Vec<EvalRun>> {
        let mut runs: Vec<EvalRun> = self.runs.values().cloned().collect();
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }

    fn delete_run(&mut self, run_id: &str) -> Result<()> {
        self.runs
            .remove(run_id)
            .map(|_| ())
            .ok_or_else(|| RunStorageError::RunNotFound(run_id.to_string()))
    }
}
