//! Champion/challenger promotion protocol
//!
//! Promotes a candidate model version to a target alias (by default the
//! global `"champion"`) only when it beats the incumbent on a configured
//! metric. The champion alias is a *cross-model* convention: every
//! registered model competes for one shared champion slot, so the incumbent
//! search spans all versions of all models, not just the model being
//! promoted.
//!
//! The procedure is a single linear decision: resolve candidate, fetch its
//! metric, find the incumbent, gate on strict improvement, then swap
//! aliases. Only the final step mutates; every earlier failure leaves all
//! aliases untouched and reports `false`.
//!
//! # Single-writer assumption
//!
//! The registry backend has no lock primitive. The incumbent's alias is
//! cleared before the candidate's is set, so there is a transient window
//! with zero holders of the target alias, and two interleaved promotions
//! can both pass their gates before either mutates. This is accepted for a
//! human-triggered offline workflow; a concurrent deployment needs an
//! external mutual-exclusion lock around the whole `promote` call.

use tracing::{error, info, warn};

use crate::tracking::storage::RunStore;
use crate::tracking::{MetricLookup, TrackingError};

use super::storage::RegistryBackend;
use super::{ModelRegistry, ModelVersion, RegistryError};

/// Cap on the global incumbent scan
const SEARCH_ALL_LIMIT: usize = 10_000;

/// Knobs for a promotion attempt
#[derive(Debug, Clone)]
pub struct PromoteOptions {
    /// Alias the candidate is expected to graduate from
    pub from_alias: String,
    /// Alias being contended for
    pub to_alias: String,
    /// Metric the gate compares on
    pub metric_name: String,
    /// Require the candidate to strictly exceed the incumbent's metric
    pub require_improvement: bool,
}

impl Default for PromoteOptions {
    fn default() -> Self {
        Self {
            from_alias: "staging".to_string(),
            to_alias: "champion".to_string(),
            metric_name: "f1_score".to_string(),
            require_improvement: true,
        }
    }
}

/// Errors from promotion operations
///
/// Gating rejections are not errors; they come back as `Ok(false)`. Only
/// backend failures surface here, and they propagate with no retry.
#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),
}

/// Result alias for promotion operations
pub type Result<T> = std::result::Result<T, PromotionError>;

/// Outcome of a candidate-metric fetch with the two negative shapes kept
/// apart: "no finished evaluation exists" versus "evaluation found but the
/// metric key is absent".
enum MetricOutcome {
    Value(f64),
    KeyAbsent,
    NoEvaluation,
}

/// Champion/challenger promoter
///
/// Borrows the registry it mutates and the run store it reads metrics from.
#[derive(Debug)]
pub struct Promoter<'a, B: RegistryBackend, S: RunStore> {
    registry: &'a mut ModelRegistry<B>,
    runs: &'a S,
}

impl<'a, B: RegistryBackend, S: RunStore> Promoter<'a, B, S> {
    /// Create a promoter over the given registry and run store
    pub fn new(registry: &'a mut ModelRegistry<B>, runs: &'a S) -> Self {
        Self { registry, runs }
    }

    /// Attempt to promote a version of `model_name` to `opts.to_alias`
    ///
    /// With `version: None`, the numerically highest version of the model
    /// is the candidate. Returns `Ok(true)` when the candidate now holds
    /// the target alias, `Ok(false)` when promotion was blocked (no
    /// versions, missing candidate metric, or failed improvement gate) with
    /// no aliases mutated, and `Err` only for backend failures.
    pub fn promote(
        &mut self,
        model_name: &str,
        version: Option<&str>,
        opts: &PromoteOptions,
    ) -> Result<bool> {
        info!(model = model_name, to_alias = %opts.to_alias, "promotion requested");

        // Step 1: resolve the candidate version.
        let version = match version {
            Some(v) => v.to_string(),
            None => {
                let versions = self.registry.latest_versions(model_name, None)?;
                let Some(latest) = versions.iter().max_by_key(|v| v.version_number()) else {
                    error!(model = model_name, "no versions found, cannot promote");
                    return Ok(false);
                };
                info!(model = model_name, version = %latest.version, "using latest version");
                latest.version.clone()
            }
        };
        let candidate = self.registry.get_version(model_name, &version)?;

        // Step 2: a candidate without a measured metric can never be
        // promoted, regardless of require_improvement.
        let candidate_metric = match self.fetch_metric(&candidate, &opts.metric_name)? {
            MetricOutcome::Value(v) => v,
            MetricOutcome::KeyAbsent => {
                error!(
                    model = model_name,
                    version = %version,
                    metric = %opts.metric_name,
                    "candidate evaluation lacks the metric, aborting"
                );
                return Ok(false);
            }
            MetricOutcome::NoEvaluation => {
                error!(
                    model = model_name,
                    version = %version,
                    metric = %opts.metric_name,
                    "no finished evaluation for candidate, aborting"
                );
                return Ok(false);
            }
        };
        info!(
            model = model_name,
            version = %version,
            metric = %opts.metric_name,
            value = candidate_metric,
            "candidate metric resolved"
        );

        // Step 3: scan every version of every model for the incumbent.
        // First holder wins; store iteration order is the tie-break.
        let incumbent = self
            .registry
            .search_versions(None, SEARCH_ALL_LIMIT)?
            .into_iter()
            .find(|mv| mv.aliases.contains(&opts.to_alias));

        // Step 4: gate.
        if let Some(champion) = &incumbent {
            info!(
                champion_model = %champion.name,
                champion_version = %champion.version,
                "current incumbent found"
            );
            match self.fetch_metric(champion, &opts.metric_name)? {
                MetricOutcome::Value(champion_metric) => {
                    info!(
                        metric = %opts.metric_name,
                        value = champion_metric,
                        "incumbent metric resolved"
                    );
                    if opts.require_improvement && candidate_metric <= champion_metric {
                        error!(
                            metric = %opts.metric_name,
                            candidate = candidate_metric,
                            champion = champion_metric,
                            "promotion blocked: candidate does not improve on incumbent"
                        );
                        return Ok(false);
                    }
                    info!(
                        metric = %opts.metric_name,
                        improvement = candidate_metric - champion_metric,
                        "candidate improves on incumbent"
                    );
                }
                MetricOutcome::KeyAbsent | MetricOutcome::NoEvaluation => {
                    warn!(
                        champion_model = %champion.name,
                        metric = %opts.metric_name,
                        "incumbent metric unavailable, promoting without comparison"
                    );
                }
            }
        } else {
            info!(to_alias = %opts.to_alias, "no existing incumbent found");
        }

        // Step 5: alias swap, the only mutation point. Clearing the
        // incumbent first leaves a transient window with no alias holder.
        if let Some(champion) = &incumbent {
            self.registry.delete_alias(&champion.name, &opts.to_alias)?;
        }
        self.registry.delete_alias(model_name, &opts.from_alias)?;
        self.registry.set_alias(model_name, &version, &opts.to_alias)?;

        info!(
            model = model_name,
            version = %version,
            to_alias = %opts.to_alias,
            "promotion complete"
        );
        Ok(true)
    }

    /// Fetch a version's metric, folding the version's own missing `run_id`
    /// into the no-evaluation outcome
    fn fetch_metric(&self, mv: &ModelVersion, metric_name: &str) -> Result<MetricOutcome> {
        let Some(run_id) = mv.run_id.as_deref() else {
            return Ok(MetricOutcome::NoEvaluation);
        };
        match MetricLookup::new(self.runs).metric_for_run(run_id, metric_name) {
            Ok(Some(v)) => Ok(MetricOutcome::Value(v)),
            Ok(None) => Ok(MetricOutcome::KeyAbsent),
            Err(TrackingError::NoFinishedEvaluation(_)) => Ok(MetricOutcome::NoEvaluation),
            Err(e) => Err(e.into()),
        }
    }
}

/// Convenience wrapper: promote with all defaults
///
/// Mirrors the CLI surface, which exposes no metric-name override.
pub fn promote_default<B: RegistryBackend, S: RunStore>(
    registry: &mut ModelRegistry<B>,
    runs: &S,
    model_name: &str,
    version: Option<&str>,
) -> Result<bool> {
    Promoter::new(registry, runs).promote(model_name, version, &PromoteOptions::default())
}
