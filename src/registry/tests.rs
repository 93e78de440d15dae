//! Tests for the model registry and promotion protocol

use std::collections::HashMap;

use super::promotion::{promote_default, PromoteOptions, Promoter};
use super::storage::{
    InMemoryRegistry, JsonFileRegistry, ModelRecord, RegistryBackend, RegistryStorageError,
};
use super::{run_id_from_uri, ModelRegistry, RegistryError, Stage, VersionStatus};
use crate::tracking::storage::{InMemoryRunStore, RunStore};
use crate::tracking::EvalRun;

fn eval(id: &str, source: &str, end_ms: u64, f1: f64) -> EvalRun {
    let mut run = EvalRun::finished(id, source, HashMap::from([("f1_score".to_string(), f1)]));
    run.end_time_ms = Some(end_ms);
    run
}

fn registry() -> ModelRegistry<InMemoryRegistry> {
    ModelRegistry::new(InMemoryRegistry::new())
}

// ---------------------------------------------------------------------------
// Stage tests
// ---------------------------------------------------------------------------

#[test]
fn test_stage_display() {
    assert_eq!(Stage::None.to_string(), "None");
    assert_eq!(Stage::Staging.to_string(), "Staging");
    assert_eq!(Stage::Production.to_string(), "Production");
    assert_eq!(Stage::Archived.to_string(), "Archived");
}

#[test]
fn test_stage_serde_roundtrip() {
    for stage in [Stage::None, Stage::Staging, Stage::Production, Stage::Archived] {
        let json = serde_json::to_string(&stage).expect("JSON serialization should succeed");
        let back: Stage = serde_json::from_str(&json).expect("JSON deserialization should succeed");
        assert_eq!(stage, back);
    }
}

// ---------------------------------------------------------------------------
// URI parsing tests
// ---------------------------------------------------------------------------

#[test]
fn test_run_id_from_runs_uri() {
    assert_eq!(run_id_from_uri("runs:/abc123/model"), Some("abc123".to_string()));
    assert_eq!(run_id_from_uri("runs:/abc123"), Some("abc123".to_string()));
}

#[test]
fn test_run_id_from_other_uri() {
    assert_eq!(run_id_from_uri("s3://bucket/model"), None);
    assert_eq!(run_id_from_uri("runs:/"), None);
}

// ---------------------------------------------------------------------------
// Model creation tests
// ---------------------------------------------------------------------------

#[test]
fn test_get_or_create_creates_once() {
    let mut registry = registry();
    let created = registry
        .get_or_create_model("churn_rf", Some("random forest"))
        .expect("create should succeed");
    assert_eq!(created.name, "churn_rf");
    assert_eq!(created.description.as_deref(), Some("random forest"));

    // Second call returns the existing record, description untouched
    let existing = registry
        .get_or_create_model("churn_rf", Some("other description"))
        .expect("get should succeed");
    assert_eq!(existing.description.as_deref(), Some("random forest"));
    assert_eq!(existing.creation_timestamp_ms, created.creation_timestamp_ms);
}

/// Backend that reports NotFound on load but AlreadyExists on create,
/// simulating a lost creation race.
#[derive(Debug)]
struct RacyBackend {
    inner: InMemoryRegistry,
}

impl RegistryBackend for RacyBackend {
    fn create_model(&mut self, record: &ModelRecord) -> super::storage::Result<()> {
        // Another writer got here first
        self.inner.save_model(record)?;
        Err(RegistryStorageError::AlreadyExists(record.model.name.clone()))
    }

    fn save_model(&mut self, record: &ModelRecord) -> super::storage::Result<()> {
        self.inner.save_model(record)
    }

    fn load_model(&self, name: &str) -> super::storage::Result<ModelRecord> {
        self.inner.load_model(name)
    }

    fn list_models(&self) -> super::storage::Result<Vec<ModelRecord>> {
        self.inner.list_models()
    }
}

#[test]
fn test_get_or_create_lost_race_is_not_fatal() {
    let mut registry = ModelRegistry::new(RacyBackend { inner: InMemoryRegistry::new() });
    let model = registry
        .get_or_create_model("churn_rf", None)
        .expect("lost creation race should resolve to the existing model");
    assert_eq!(model.name, "churn_rf");
}

// ---------------------------------------------------------------------------
// Version registration tests
// ---------------------------------------------------------------------------

#[test]
fn test_register_version_assigns_sequential_numbers() {
    let mut registry = registry();
    let v1 = registry
        .register_version("runs:/t1/model", "churn_rf", None, None, None)
        .expect("register should succeed");
    let v2 = registry
        .register_version("runs:/t2/model", "churn_rf", None, None, None)
        .expect("register should succeed");
    assert_eq!(v1.version, "1");
    assert_eq!(v2.version, "2");
    assert_eq!(v1.status, VersionStatus::Ready);
    assert_eq!(v1.stage, Stage::None);
}

#[test]
fn test_register_version_derives_run_id_from_uri() {
    let mut registry = registry();
    let v = registry
        .register_version("runs:/train-42/model", "churn_rf", None, None, None)
        .expect("register should succeed");
    assert_eq!(v.run_id.as_deref(), Some("train-42"));
}

#[test]
fn test_register_version_explicit_run_id_wins() {
    let mut registry = registry();
    let v = registry
        .register_version("runs:/train-42/model", "churn_rf", Some("other-run"), None, None)
        .expect("register should succeed");
    assert_eq!(v.run_id.as_deref(), Some("other-run"));
}

#[test]
fn test_register_version_without_derivable_run_id() {
    let mut registry = registry();
    let v = registry
        .register_version("s3://bucket/model", "churn_rf", None, None, None)
        .expect("register should succeed");
    assert!(v.run_id.is_none());
}

#[test]
fn test_register_version_attaches_tags() {
    let mut registry = registry();
    let tags = HashMap::from([("source_run".to_string(), "t1".to_string())]);
    let v = registry
        .register_version("runs:/t1/model", "churn_rf", None, None, Some(&tags))
        .expect("register should succeed");
    assert_eq!(v.tags.get("source_run").map(String::as_str), Some("t1"));
}

// ---------------------------------------------------------------------------
// Alias tests
// ---------------------------------------------------------------------------

#[test]
fn test_set_alias_and_get_by_alias() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.set_alias("m", "1", "staging").expect("set alias should succeed");

    let v = registry.get_by_alias("m", "staging").expect("get should succeed");
    assert_eq!(v.map(|v| v.version), Some("1".to_string()));
}

#[test]
fn test_set_alias_moves_within_model() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.register_version("runs:/t2/model", "m", None, None, None).expect("register");

    registry.set_alias("m", "1", "staging").expect("set alias should succeed");
    registry.set_alias("m", "2", "staging").expect("set alias should succeed");

    // Exactly one holder within the model
    let holders: Vec<_> = registry
        .search_versions(Some("m"), 100)
        .expect("search should succeed")
        .into_iter()
        .filter(|v| v.aliases.contains("staging"))
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].version, "2");
}

#[test]
fn test_set_alias_unknown_version_fails() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    let err = registry.set_alias("m", "9", "staging").unwrap_err();
    assert!(matches!(err, RegistryError::VersionNotFound { .. }));
}

#[test]
fn test_delete_alias_reports_presence() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.set_alias("m", "1", "staging").expect("set alias should succeed");

    assert!(registry.delete_alias("m", "staging").expect("delete should succeed"));
    // Absent alias is informational, not an error
    assert!(!registry.delete_alias("m", "staging").expect("delete should succeed"));
    assert!(registry.get_by_alias("m", "staging").expect("get should succeed").is_none());
}

// ---------------------------------------------------------------------------
// Search / latest tests
// ---------------------------------------------------------------------------

#[test]
fn test_search_versions_all_models_in_name_order() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "zeta", None, None, None).expect("register");
    registry.register_version("runs:/t2/model", "alpha", None, None, None).expect("register");
    registry.register_version("runs:/t3/model", "alpha", None, None, None).expect("register");

    let all = registry.search_versions(None, 100).expect("search should succeed");
    let keys: Vec<(String, String)> =
        all.iter().map(|v| (v.name.clone(), v.version.clone())).collect();
    assert_eq!(
        keys,
        vec![
            ("alpha".to_string(), "1".to_string()),
            ("alpha".to_string(), "2".to_string()),
            ("zeta".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_search_versions_respects_max_results() {
    let mut registry = registry();
    for i in 0..5 {
        registry
            .register_version(&format!("runs:/t{i}/model"), "m", None, None, None)
            .expect("register");
    }
    let limited = registry.search_versions(None, 3).expect("search should succeed");
    assert_eq!(limited.len(), 3);
}

#[test]
fn test_search_versions_unknown_model_filter_fails() {
    let registry = registry();
    let err = registry.search_versions(Some("ghost"), 100).unwrap_err();
    assert!(matches!(err, RegistryError::ModelNotFound { .. }));
}

#[test]
fn test_latest_versions_per_stage() {
    let mut registry = registry();
    for i in 1..=3 {
        registry
            .register_version(&format!("runs:/t{i}/model"), "m", None, None, None)
            .expect("register");
    }
    registry.transition_stage("m", "1", Stage::Production, false).expect("transition");
    registry.transition_stage("m", "2", Stage::Staging, false).expect("transition");

    let latest = registry.latest_versions("m", None).expect("latest should succeed");
    // One per stage: Production(1), Staging(2), None(3)
    assert_eq!(latest.len(), 3);

    let staged = registry
        .latest_versions("m", Some(&[Stage::Staging]))
        .expect("latest should succeed");
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].version, "2");
}

// ---------------------------------------------------------------------------
// Stage transition tests
// ---------------------------------------------------------------------------

#[test]
fn test_transition_stage_archives_existing() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.register_version("runs:/t2/model", "m", None, None, None).expect("register");

    registry.transition_stage("m", "1", Stage::Production, true).expect("transition");
    registry.transition_stage("m", "2", Stage::Production, true).expect("transition");

    let v1 = registry.get_version("m", "1").expect("get should succeed");
    let v2 = registry.get_version("m", "2").expect("get should succeed");
    assert_eq!(v1.stage, Stage::Archived);
    assert_eq!(v2.stage, Stage::Production);
}

#[test]
fn test_transition_stage_without_archiving() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.register_version("runs:/t2/model", "m", None, None, None).expect("register");

    registry.transition_stage("m", "1", Stage::Staging, false).expect("transition");
    registry.transition_stage("m", "2", Stage::Staging, false).expect("transition");

    let v1 = registry.get_version("m", "1").expect("get should succeed");
    assert_eq!(v1.stage, Stage::Staging);
}

// ---------------------------------------------------------------------------
// Deletion / info tests
// ---------------------------------------------------------------------------

#[test]
fn test_delete_version() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "m", None, None, None).expect("register");
    registry.delete_version("m", "1").expect("delete should succeed");

    let err = registry.get_version("m", "1").unwrap_err();
    assert!(matches!(err, RegistryError::VersionNotFound { .. }));
    // Model record itself survives version deletion
    assert!(registry.model_info("m").is_ok());
}

#[test]
fn test_delete_missing_version_fails() {
    let mut registry = registry();
    registry.get_or_create_model("m", None).expect("create");
    let err = registry.delete_version("m", "1").unwrap_err();
    assert!(matches!(err, RegistryError::VersionNotFound { .. }));
}

#[test]
fn test_model_info_summarizes_versions() {
    let mut registry = registry();
    registry
        .register_version("runs:/t1/model", "m", None, Some("first"), None)
        .expect("register");
    registry.register_version("runs:/t2/model", "m", None, None, None).expect("register");

    let info = registry.model_info("m").expect("info should succeed");
    assert_eq!(info.name, "m");
    assert_eq!(info.versions.len(), 2);
    assert_eq!(info.versions[0].version, "1");
    assert_eq!(info.versions[0].run_id.as_deref(), Some("t1"));
}

#[test]
fn test_list_models() {
    let mut registry = registry();
    registry.get_or_create_model("b", None).expect("create");
    registry.get_or_create_model("a", None).expect("create");

    let names = registry.list_models(100).expect("list should succeed");
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(registry.list_models(1).expect("list should succeed").len(), 1);
}

// ---------------------------------------------------------------------------
// JSON backend tests
// ---------------------------------------------------------------------------

#[test]
fn test_json_registry_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut registry = ModelRegistry::new(JsonFileRegistry::new(dir.path()));

    registry
        .register_version("runs:/t1/model", "churn_rf", None, None, None)
        .expect("register");
    registry.set_alias("churn_rf", "1", "staging").expect("set alias should succeed");

    // Reopen from disk
    let reopened = ModelRegistry::new(JsonFileRegistry::new(dir.path()));
    let v = reopened
        .get_by_alias("churn_rf", "staging")
        .expect("get should succeed")
        .expect("alias should be held");
    assert_eq!(v.version, "1");
}

#[test]
fn test_json_registry_create_conflict() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut backend = JsonFileRegistry::new(dir.path());
    let record = ModelRecord::new(super::RegisteredModel::new("m", None));
    backend.create_model(&record).expect("create should succeed");
    let err = backend.create_model(&record).unwrap_err();
    assert!(matches!(err, RegistryStorageError::AlreadyExists(_)));
}

// ---------------------------------------------------------------------------
// Promotion tests
// ---------------------------------------------------------------------------

fn promotable(f1: f64) -> (ModelRegistry<InMemoryRegistry>, InMemoryRunStore) {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "churn_rf", None, None, None).expect("register");
    let mut runs = InMemoryRunStore::new();
    runs.save_run(&eval("eval-1", "t1", 100, f1)).expect("save should succeed");
    (registry, runs)
}

#[test]
fn test_promote_with_no_incumbent_succeeds() {
    let (mut registry, runs) = promotable(0.80);
    let promoted = Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("1"), &PromoteOptions::default())
        .expect("promotion should not error");
    assert!(promoted);

    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "1");
}

#[test]
fn test_promote_resolves_latest_version_when_unspecified() {
    let (mut registry, mut runs) = promotable(0.80);
    registry.register_version("runs:/t2/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.90)).expect("save should succeed");

    let promoted = promote_default(&mut registry, &runs, "churn_rf", None)
        .expect("promotion should not error");
    assert!(promoted);
    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "2");
}

#[test]
fn test_promote_model_with_no_versions_returns_false() {
    let mut registry = registry();
    registry.get_or_create_model("empty", None).expect("create");
    let runs = InMemoryRunStore::new();

    let promoted = promote_default(&mut registry, &runs, "empty", None)
        .expect("promotion should not error");
    assert!(!promoted);
}

#[test]
fn test_promote_unknown_version_is_an_error() {
    let (mut registry, runs) = promotable(0.80);
    let result = promote_default(&mut registry, &runs, "churn_rf", Some("9"));
    assert!(result.is_err());
}

#[test]
fn test_promote_without_candidate_metric_aborts_untouched() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "churn_rf", None, None, None).expect("register");
    registry.set_alias("churn_rf", "1", "staging").expect("set alias should succeed");
    let runs = InMemoryRunStore::new();

    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");
    assert!(!promoted);

    // No alias was mutated: staging still held, champion never set
    let v = registry.get_version("churn_rf", "1").expect("get should succeed");
    assert!(v.aliases.contains("staging"));
    assert!(!v.aliases.contains("champion"));
}

#[test]
fn test_promote_with_metric_key_absent_aborts() {
    let mut registry = registry();
    registry.register_version("runs:/t1/model", "churn_rf", None, None, None).expect("register");
    let mut runs = InMemoryRunStore::new();
    // Finished evaluation exists but carries a different metric
    let mut run = EvalRun::finished("eval-1", "t1", HashMap::new());
    run.metrics.insert("accuracy".to_string(), 0.9);
    runs.save_run(&run).expect("save should succeed");

    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");
    assert!(!promoted);
}

#[test]
fn test_strict_improvement_gate() {
    // Better candidate promotes
    let (mut registry, mut runs) = promotable(0.80);
    Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("1"), &PromoteOptions::default())
        .expect("promotion should not error");

    registry.register_version("runs:/t2/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.85)).expect("save should succeed");

    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("2"))
        .expect("promotion should not error");
    assert!(promoted);
    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "2");
}

#[test]
fn test_equal_metric_blocks_promotion() {
    let (mut registry, mut runs) = promotable(0.80);
    Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("1"), &PromoteOptions::default())
        .expect("promotion should not error");

    registry.register_version("runs:/t2/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.80)).expect("save should succeed");

    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("2"))
        .expect("promotion should not error");
    assert!(!promoted);

    // Incumbent unchanged
    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "1");
}

#[test]
fn test_require_improvement_false_allows_regression() {
    let (mut registry, mut runs) = promotable(0.80);
    let opts = PromoteOptions::default();
    Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("1"), &opts)
        .expect("promotion should not error");

    registry.register_version("runs:/t2/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.70)).expect("save should succeed");

    let opts = PromoteOptions { require_improvement: false, ..PromoteOptions::default() };
    let promoted = Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("2"), &opts)
        .expect("promotion should not error");
    assert!(promoted);
}

#[test]
fn test_incumbent_without_metric_promotes_with_warning() {
    let (mut registry, mut runs) = promotable(0.80);
    Promoter::new(&mut registry, &runs)
        .promote("churn_rf", Some("1"), &PromoteOptions::default())
        .expect("promotion should not error");

    // Incumbent's evaluation disappears (e.g. store pruned)
    runs.delete_run("eval-1").expect("delete should succeed");

    registry.register_version("runs:/t2/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.50)).expect("save should succeed");

    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("2"))
        .expect("promotion should not error");
    assert!(promoted);
    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "2");
}

#[test]
fn test_champion_alias_is_global_across_models() {
    let mut registry = registry();
    let mut runs = InMemoryRunStore::new();

    registry.register_version("runs:/t1/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-1", "t1", 100, 0.80)).expect("save should succeed");
    promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");

    // A different model contends for the same global slot
    registry.register_version("runs:/t2/model", "churn_xgb", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.85)).expect("save should succeed");
    let promoted = promote_default(&mut registry, &runs, "churn_xgb", Some("1"))
        .expect("promotion should not error");
    assert!(promoted);

    // The old champion lost the alias even though it belongs to another model
    assert!(registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .is_none());
    let holders: Vec<_> = registry
        .search_versions(None, 100)
        .expect("search should succeed")
        .into_iter()
        .filter(|v| v.aliases.contains("champion"))
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].name, "churn_xgb");
}

#[test]
fn test_weaker_challenger_from_other_model_is_blocked() {
    let mut registry = registry();
    let mut runs = InMemoryRunStore::new();

    registry.register_version("runs:/t1/model", "churn_rf", None, None, None).expect("register");
    runs.save_run(&eval("eval-1", "t1", 100, 0.90)).expect("save should succeed");
    promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");

    registry.register_version("runs:/t2/model", "churn_xgb", None, None, None).expect("register");
    runs.save_run(&eval("eval-2", "t2", 200, 0.85)).expect("save should succeed");
    let promoted = promote_default(&mut registry, &runs, "churn_xgb", Some("1"))
        .expect("promotion should not error");
    assert!(!promoted);

    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.name, "churn_rf");
}

#[test]
fn test_promotion_clears_from_alias_on_candidate() {
    let (mut registry, runs) = promotable(0.80);
    registry.set_alias("churn_rf", "1", "staging").expect("set alias should succeed");

    promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");

    let v = registry.get_version("churn_rf", "1").expect("get should succeed");
    assert!(v.aliases.contains("champion"));
    assert!(!v.aliases.contains("staging"));
}

#[test]
fn test_re_promoting_the_champion_is_blocked_by_strict_gate() {
    let (mut registry, runs) = promotable(0.80);
    promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");

    // Same version, same metric: equality fails the strict gate
    let promoted = promote_default(&mut registry, &runs, "churn_rf", Some("1"))
        .expect("promotion should not error");
    assert!(!promoted);

    let champion = registry
        .get_by_alias("churn_rf", "champion")
        .expect("get should succeed")
        .expect("champion should be held");
    assert_eq!(champion.version, "1");
}
