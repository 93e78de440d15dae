//! Registry storage backends
//!
//! Provides the `RegistryBackend` trait and two implementations: a JSON
//! file-per-model store and an in-memory store for tests.
//!
//! The backend is deliberately dumb: it persists whole model records and
//! enforces no alias uniqueness. Last write wins; alias discipline lives in
//! the registry and promotion layers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ModelVersion, RegisteredModel};

/// Errors from registry storage operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Registered model not found: {0}")]
    ModelNotFound(String),

    #[error("Registered model already exists: {0}")]
    AlreadyExists(String),
}

/// Result alias for registry storage operations
pub type Result<T> = std::result::Result<T, RegistryStorageError>;

/// A registered model together with all of its versions
///
/// Versions are kept in ascending numeric order; the registry maintains
/// that ordering on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model: RegisteredModel,
    pub versions: Vec<ModelVersion>,
}

impl ModelRecord {
    /// Record for a freshly created model with no versions
    pub fn new(model: RegisteredModel) -> Self {
        Self { model, versions: Vec::new() }
    }
}

/// Trait for registry storage backends
pub trait RegistryBackend {
    /// Create a model record, failing if the name is already taken
    fn create_model(&mut self, record: &ModelRecord) -> Result<()>;

    /// Save a model record, replacing any prior record with the same name
    fn save_model(&mut self, record: &ModelRecord) -> Result<()>;

    /// Load a model record by name
    fn load_model(&self, name: &str) -> Result<ModelRecord>;

    /// List all model records, sorted by model name
    fn list_models(&self) -> Result<Vec<ModelRecord>>;
}

/// JSON file-based registry backend
///
/// Stores each registered model (with all its versions) as a separate JSON
/// file in a directory. File names are `{model_name}.json`.
#[derive(Debug)]
pub struct JsonFileRegistry {
    dir: PathBuf,
}

impl JsonFileRegistry {
    /// Create a new JSON registry rooted at `dir`, creating it lazily on
    /// first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl RegistryBackend for JsonFileRegistry {
    fn create_model(&mut self, record: &ModelRecord) -> Result<()> {
        self.ensure_dir()?;
        let path = self.model_path(&record.model.name);
        if path.exists() {
            return Err(RegistryStorageError::AlreadyExists(record.model.name.clone()));
        }
        let json = serde_json::to_string_pretty(record)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn save_model(&mut self, record: &ModelRecord) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.model_path(&record.model.name), json)?;
        Ok(())
    }

    fn load_model(&self, name: &str) -> Result<ModelRecord> {
        let path = self.model_path(name);
        if !path.exists() {
            return Err(RegistryStorageError::ModelNotFound(name.to_string()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn list_models(&self) -> Result<Vec<ModelRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut records: Vec<ModelRecord> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let json = fs::read_to_string(&path)?;
                records.push(serde_json::from_str(&json)?);
            }
        }
        records.sort_by(|a, b| a.model.name.cmp(&b.model.name));
        Ok(records)
    }
}

/// In-memory registry backend for testing
///
/// Stores records in a `BTreeMap`, so model iteration order is name order.
/// No persistence.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    models: BTreeMap<String, ModelRecord>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryBackend for InMemoryRegistry {
    fn create_model(&mut self, record: &ModelRecord) -> Result<()> {
        let name = record.model.name.clone();
        if self.models.contains_key(&name) {
            return Err(RegistryStorageError::AlreadyExists(name));
        }
        self.models.insert(name, record.clone());
        Ok(())
    }

    fn save_model(&mut self, record: &ModelRecord) -> Result<()> {
        self.models.insert(record.model.name.clone(), record.clone());
        Ok(())
    }

    fn load_model(&self, name: &str) -> Result<ModelRecord> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryStorageError::ModelNotFound(name.to_string()))
    }

    fn list_models(&self) -> Result<Vec<ModelRecord>> {
        Ok(self.models.values().cloned().collect())
    }
}
