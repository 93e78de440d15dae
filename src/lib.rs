//! # abandono
//!
//! Churn-model registry with champion/challenger promotion.
//!
//! The crate wraps the model-management slice of a churn-prediction MLOps
//! pipeline: registering model versions produced by training runs, managing
//! the aliases serving resolves models through, and gating promotion of a
//! candidate to the global `"champion"` alias on strict metric improvement
//! over the incumbent.
//!
//! - [`tracking`]: evaluation runs and the metric lookup that resolves the
//!   authoritative metric for a training run
//! - [`registry`]: registered models, versions, aliases, stage transitions,
//!   and the promotion protocol ([`registry::promotion`])
//! - [`config`]: YAML store configuration
//! - [`cli`]: command-line surface (`register`, `set-alias`, `promote`,
//!   `list`, `info`, `record-eval`)
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use abandono::registry::promotion::{PromoteOptions, Promoter};
//! use abandono::registry::storage::InMemoryRegistry;
//! use abandono::registry::ModelRegistry;
//! use abandono::tracking::storage::InMemoryRunStore;
//! use abandono::tracking::EvalRecorder;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ModelRegistry::new(InMemoryRegistry::new());
//! registry.register_version("runs:/train-1/model", "churn_rf", None, None, None)?;
//!
//! let mut recorder = EvalRecorder::new(InMemoryRunStore::new());
//! recorder.record_finished("train-1", HashMap::from([("f1_score".to_string(), 0.85)]))?;
//! let runs = recorder.into_store();
//!
//! let promoted =
//!     Promoter::new(&mut registry, &runs).promote("churn_rf", None, &PromoteOptions::default())?;
//! assert!(promoted);
//! assert!(registry.get_by_alias("churn_rf", "champion")?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod registry;
pub mod tracking;
