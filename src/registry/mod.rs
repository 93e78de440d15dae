//! Model Registry Module
//!
//! CRUD over registered churn models, their versions, legacy lifecycle
//! stages, and aliases. Backed by pluggable storage via the
//! [`RegistryBackend`](storage::RegistryBackend) trait; the
//! champion/challenger gate lives in [`promotion`].
//!
//! Aliases decouple consumers from raw version numbers: serving loads
//! `models:/<name>@champion` and never needs to know which version that is.
//! Within one model the registry keeps each alias on at most one version;
//! the cross-model "one champion anywhere" convention is enforced by the
//! promotion protocol, not here.
//!
//! # Example
//!
//! ```
//! use abandono::registry::ModelRegistry;
//! use abandono::registry::storage::InMemoryRegistry;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ModelRegistry::new(InMemoryRegistry::new());
//! let mv = registry.register_version(
//!     "runs:/train-7/model",
//!     "churn_rf",
//!     None,
//!     Some("baseline random forest"),
//!     None,
//! )?;
//! assert_eq!(mv.version, "1");
//! assert_eq!(mv.run_id.as_deref(), Some("train-7"));
//!
//! registry.set_alias("churn_rf", "1", "staging")?;
//! let staged = registry.get_by_alias("churn_rf", "staging")?;
//! assert_eq!(staged.map(|v| v.version), Some("1".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod promotion;
pub mod storage;

#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::tracking::now_ms;
use storage::{ModelRecord, RegistryBackend, RegistryStorageError};

/// Legacy lifecycle stage for a model version
///
/// Kept for compatibility with stage-based consumers; alias-based routing
/// is the primary mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// No stage assigned
    None,
    /// Under validation
    Staging,
    /// Serving traffic
    Production,
    /// Retired
    Archived,
}

impl Stage {
    /// Display name for the stage
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::None => "None",
            Stage::Staging => "Staging",
            Stage::Production => "Production",
            Stage::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registration status of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStatus {
    /// Version is registered and usable
    Ready,
    /// Registration failed
    FailedRegistration,
}

/// A registered model
///
/// Created on first registration; never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredModel {
    /// Unique model name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Unix timestamp (ms) when the model was created
    pub creation_timestamp_ms: u64,
    /// Unix timestamp (ms) of the last mutation
    pub last_updated_timestamp_ms: u64,
}

impl RegisteredModel {
    fn new(name: &str, description: Option<&str>) -> Self {
        let now = now_ms();
        Self {
            name: name.to_string(),
            description: description.map(String::from),
            creation_timestamp_ms: now,
            last_updated_timestamp_ms: now,
        }
    }
}

/// A single version of a registered model
///
/// Identified by `(name, version)` where `version` is a monotonically
/// increasing integer string per model. Carries zero or more aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Parent model name
    pub name: String,
    /// Integer version string ("1", "2", ...)
    pub version: String,
    /// URI of the model artifact (e.g. `runs:/<run_id>/model`)
    pub model_uri: String,
    /// Training run that produced this version, if known
    pub run_id: Option<String>,
    /// Registration status
    pub status: VersionStatus,
    /// Legacy lifecycle stage
    pub stage: Stage,
    /// Optional description
    pub description: Option<String>,
    /// Arbitrary key-value tags
    pub tags: HashMap<String, String>,
    /// Aliases currently naming this version ("staging", "champion", ...)
    pub aliases: BTreeSet<String>,
    /// Unix timestamp (ms) when the version was created
    pub creation_timestamp_ms: u64,
}

impl ModelVersion {
    /// Numeric value of the version string
    ///
    /// Versions are registry-generated integers, so the parse is total for
    /// records this registry produced; anything foreign sorts as 0.
    #[must_use]
    pub fn version_number(&self) -> u64 {
        self.version.parse().unwrap_or(0)
    }
}

/// Per-version summary inside [`ModelInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: String,
    pub stage: Stage,
    pub status: VersionStatus,
    pub run_id: Option<String>,
    pub creation_timestamp_ms: u64,
}

/// Full description of a registered model and its versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: Option<String>,
    pub creation_timestamp_ms: u64,
    pub last_updated_timestamp_ms: u64,
    pub versions: Vec<VersionSummary>,
}

/// Errors from registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registered model not found: {name}")]
    ModelNotFound { name: String },

    #[error("model version not found: {name} v{version}")]
    VersionNotFound { name: String, version: String },

    #[error("Storage error: {0}")]
    Storage(#[from] RegistryStorageError),
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Default cap on search results
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Model registry
///
/// Wraps a [`RegistryBackend`] with the operations the churn pipeline
/// needs: registration, alias management, stage transitions, and search.
#[derive(Debug)]
pub struct ModelRegistry<B: RegistryBackend> {
    backend: B,
}

impl<B: RegistryBackend> ModelRegistry<B> {
    /// Create a registry over the given backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Shared access to the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Return the registered model named `name`, creating it if absent
    ///
    /// A creation race where the backend reports "already exists" is logged
    /// and treated as success: the existing record is re-read and returned.
    pub fn get_or_create_model(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<RegisteredModel> {
        match self.backend.load_model(name) {
            Ok(record) => return Ok(record.model),
            Err(RegistryStorageError::ModelNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        info!(model = name, "registered model not found, creating it");
        let record = ModelRecord::new(RegisteredModel::new(name, description));
        match self.backend.create_model(&record) {
            Ok(()) => Ok(record.model),
            Err(RegistryStorageError::AlreadyExists(_)) => {
                warn!(model = name, "model already exists, using existing record");
                Ok(self.backend.load_model(name)?.model)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register a new version of `model_name` pointing at `model_uri`
    ///
    /// Creates the registered model if needed. When `run_id` is not
    /// supplied and the URI follows the `runs:/<run_id>/...` convention,
    /// the run ID is derived from the URI. Tags are attached after the
    /// version is created.
    pub fn register_version(
        &mut self,
        model_uri: &str,
        model_name: &str,
        run_id: Option<&str>,
        description: Option<&str>,
        tags: Option<&HashMap<String, String>>,
    ) -> Result<ModelVersion> {
        info!(model = model_name, uri = model_uri, "registering model version");
        self.get_or_create_model(model_name, description)?;

        let run_id = run_id.map(String::from).or_else(|| run_id_from_uri(model_uri));

        let mut record = self.backend.load_model(model_name)?;
        let next = record.versions.iter().map(ModelVersion::version_number).max().unwrap_or(0) + 1;

        let version = ModelVersion {
            name: model_name.to_string(),
            version: next.to_string(),
            model_uri: model_uri.to_string(),
            run_id,
            status: VersionStatus::Ready,
            stage: Stage::None,
            description: description.map(String::from),
            tags: HashMap::new(),
            aliases: BTreeSet::new(),
            creation_timestamp_ms: now_ms(),
        };
        record.versions.push(version.clone());
        record.model.last_updated_timestamp_ms = now_ms();
        self.backend.save_model(&record)?;

        if let Some(tags) = tags {
            for (key, value) in tags {
                self.set_version_tag(model_name, &version.version, key, value)?;
            }
        }

        info!(model = model_name, version = %version.version, "model version registered");
        self.get_version(model_name, &version.version)
    }

    /// Set a tag on an existing model version
    pub fn set_version_tag(
        &mut self,
        model_name: &str,
        version: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.with_version(model_name, version, |mv| {
            mv.tags.insert(key.to_string(), value.to_string());
        })
    }

    /// Get a specific version of a model
    pub fn get_version(&self, model_name: &str, version: &str) -> Result<ModelVersion> {
        let record = self.load_record(model_name)?;
        record
            .versions
            .into_iter()
            .find(|v| v.version == version)
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version: version.to_string(),
            })
    }

    /// Point `alias` at the given version of `model_name`
    ///
    /// Last-write-wins: the alias is first cleared from any other version
    /// of the same model, so within one model an alias names at most one
    /// version. The cross-model champion convention is the promoter's job.
    pub fn set_alias(&mut self, model_name: &str, version: &str, alias: &str) -> Result<()> {
        info!(model = model_name, version, alias, "setting alias");
        let mut record = self.load_record(model_name)?;
        if !record.versions.iter().any(|v| v.version == version) {
            return Err(RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version: version.to_string(),
            });
        }
        for v in &mut record.versions {
            if v.version == version {
                v.aliases.insert(alias.to_string());
            } else {
                v.aliases.remove(alias);
            }
        }
        record.model.last_updated_timestamp_ms = now_ms();
        self.backend.save_model(&record)?;
        info!(model = model_name, alias, version, "alias set");
        Ok(())
    }

    /// Remove `alias` from whichever version of `model_name` holds it
    ///
    /// Returns `Ok(true)` if the alias was held and removed, `Ok(false)` if
    /// no version held it. Absence is informational, never an error.
    pub fn delete_alias(&mut self, model_name: &str, alias: &str) -> Result<bool> {
        let mut record = self.load_record(model_name)?;
        let mut removed = false;
        for v in &mut record.versions {
            removed |= v.aliases.remove(alias);
        }
        if removed {
            record.model.last_updated_timestamp_ms = now_ms();
            self.backend.save_model(&record)?;
            info!(model = model_name, alias, "alias deleted");
        } else {
            info!(model = model_name, alias, "no such alias to delete");
        }
        Ok(removed)
    }

    /// Get the version of `model_name` currently holding `alias`, if any
    pub fn get_by_alias(&self, model_name: &str, alias: &str) -> Result<Option<ModelVersion>> {
        let record = self.load_record(model_name)?;
        Ok(record.versions.into_iter().find(|v| v.aliases.contains(alias)))
    }

    /// Search model versions
    ///
    /// With no name filter, returns every version of every model: models in
    /// name order, versions in ascending numeric order. Results are capped
    /// at `max_results`.
    pub fn search_versions(
        &self,
        name_filter: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<ModelVersion>> {
        let records = match name_filter {
            Some(name) => vec![self.load_record(name)?],
            None => self.backend.list_models()?,
        };
        let mut versions: Vec<ModelVersion> = Vec::new();
        for record in records {
            versions.extend(record.versions);
            if versions.len() >= max_results {
                break;
            }
        }
        versions.truncate(max_results);
        Ok(versions)
    }

    /// Latest version of `model_name` per lifecycle stage
    ///
    /// Returns, for each stage (or each of `stages` when given), the
    /// numerically highest version currently in that stage.
    pub fn latest_versions(
        &self,
        model_name: &str,
        stages: Option<&[Stage]>,
    ) -> Result<Vec<ModelVersion>> {
        let record = self.load_record(model_name)?;
        let mut latest: HashMap<Stage, ModelVersion> = HashMap::new();
        for v in record.versions {
            if let Some(stages) = stages {
                if !stages.contains(&v.stage) {
                    continue;
                }
            }
            match latest.get(&v.stage) {
                Some(existing) if existing.version_number() >= v.version_number() => {}
                _ => {
                    latest.insert(v.stage, v);
                }
            }
        }
        let mut result: Vec<ModelVersion> = latest.into_values().collect();
        result.sort_by_key(ModelVersion::version_number);
        Ok(result)
    }

    /// Transition a version to a lifecycle stage
    ///
    /// With `archive_existing`, other versions already in the target stage
    /// are moved to `Archived` (only meaningful for Staging/Production).
    pub fn transition_stage(
        &mut self,
        model_name: &str,
        version: &str,
        stage: Stage,
        archive_existing: bool,
    ) -> Result<()> {
        info!(model = model_name, version, stage = %stage, "transitioning stage");
        let mut record = self.load_record(model_name)?;
        if !record.versions.iter().any(|v| v.version == version) {
            return Err(RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version: version.to_string(),
            });
        }
        for v in &mut record.versions {
            if v.version == version {
                v.stage = stage;
            } else if archive_existing
                && v.stage == stage
                && matches!(stage, Stage::Staging | Stage::Production)
            {
                v.stage = Stage::Archived;
            }
        }
        record.model.last_updated_timestamp_ms = now_ms();
        self.backend.save_model(&record)?;
        info!(model = model_name, version, stage = %stage, "stage transitioned");
        Ok(())
    }

    /// Delete a model version. Irreversible.
    pub fn delete_version(&mut self, model_name: &str, version: &str) -> Result<()> {
        let mut record = self.load_record(model_name)?;
        let before = record.versions.len();
        record.versions.retain(|v| v.version != version);
        if record.versions.len() == before {
            return Err(RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version: version.to_string(),
            });
        }
        record.model.last_updated_timestamp_ms = now_ms();
        self.backend.save_model(&record)?;
        info!(model = model_name, version, "model version deleted");
        Ok(())
    }

    /// Full info for a model: metadata plus per-version summaries
    pub fn model_info(&self, model_name: &str) -> Result<ModelInfo> {
        let record = self.load_record(model_name)?;
        Ok(ModelInfo {
            name: record.model.name,
            description: record.model.description,
            creation_timestamp_ms: record.model.creation_timestamp_ms,
            last_updated_timestamp_ms: record.model.last_updated_timestamp_ms,
            versions: record
                .versions
                .iter()
                .map(|v| VersionSummary {
                    version: v.version.clone(),
                    stage: v.stage,
                    status: v.status,
                    run_id: v.run_id.clone(),
                    creation_timestamp_ms: v.creation_timestamp_ms,
                })
                .collect(),
        })
    }

    /// Names of all registered models, capped at `max_results`
    pub fn list_models(&self, max_results: usize) -> Result<Vec<String>> {
        let mut names: Vec<String> =
            self.backend.list_models()?.into_iter().map(|r| r.model.name).collect();
        names.truncate(max_results);
        Ok(names)
    }

    fn load_record(&self, model_name: &str) -> Result<ModelRecord> {
        self.backend.load_model(model_name).map_err(|e| match e {
            RegistryStorageError::ModelNotFound(name) => RegistryError::ModelNotFound { name },
            other => RegistryError::Storage(other),
        })
    }

    fn with_version(
        &mut self,
        model_name: &str,
        version: &str,
        f: impl FnOnce(&mut ModelVersion),
    ) -> Result<()> {
        let mut record = self.load_record(model_name)?;
        let mv = record.versions.iter_mut().find(|v| v.version == version).ok_or_else(|| {
            RegistryError::VersionNotFound {
                name: model_name.to_string(),
                version: version.to_string(),
            }
        })?;
        f(mv);
        record.model.last_updated_timestamp_ms = now_ms();
        self.backend.save_model(&record)?;
        Ok(())
    }
}

/// Derive a run ID from a `runs:/<run_id>/...` model URI
fn run_id_from_uri(model_uri: &str) -> Option<String> {
    let rest = model_uri.strip_prefix("runs:/")?;
    let run_id = rest.split('/').next().unwrap_or(rest);
    if run_id.is_empty() {
        None
    } else {
        Some(run_id.to_string())
    }
}
