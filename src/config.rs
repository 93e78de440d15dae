//! Workspace configuration
//!
//! YAML configuration pointing the CLI at its two stores. Looked up from
//! `--config <path>`, then `abandono.yaml` in the working directory, then
//! built-in defaults.
//!
//! ```yaml
//! registry_path: .abandono/registry
//! runs_path: .abandono/runs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file name probed in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "abandono.yaml";

fn default_registry_path() -> PathBuf {
    PathBuf::from(".abandono/registry")
}

fn default_runs_path() -> PathBuf {
    PathBuf::from(".abandono/runs")
}

/// Errors from configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Store locations for the registry workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbandonoConfig {
    /// Directory holding registered-model JSON records
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// Directory holding evaluation-run JSON records
    #[serde(default = "default_runs_path")]
    pub runs_path: PathBuf,
}

impl Default for AbandonoConfig {
    fn default() -> Self {
        Self { registry_path: default_registry_path(), runs_path: default_runs_path() }
    }
}

impl AbandonoConfig {
    /// Load configuration
    ///
    /// An explicit path must exist and parse; otherwise
    /// [`DEFAULT_CONFIG_FILE`] is used when present, and defaults apply
    /// when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_yaml::from_str(&text)
            .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
    }
}
