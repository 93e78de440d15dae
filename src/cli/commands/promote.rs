//! Promote a model version to the global champion alias

use crate::cli::PromoteArgs;
use crate::config::AbandonoConfig;
use crate::registry::promotion::{PromoteOptions, Promoter};
use crate::registry::storage::JsonFileRegistry;
use crate::registry::ModelRegistry;
use crate::tracking::storage::JsonFileRunStore;

pub fn run_promote(args: PromoteArgs, config: &AbandonoConfig) -> Result<(), String> {
    let mut registry = ModelRegistry::new(JsonFileRegistry::new(&config.registry_path));
    let runs = JsonFileRunStore::new(&config.runs_path);

    // The CLI surface exposes no metric override; the gate runs with the
    // workflow defaults (staging -> champion on f1_score).
    let opts = PromoteOptions::default();
    let promoted = Promoter::new(&mut registry, &runs)
        .promote(&args.model_name, args.version.as_deref(), &opts)
        .map_err(|e| format!("Promotion failed: {e}"))?;

    if promoted {
        let champion = registry
            .get_by_alias(&args.model_name, &opts.to_alias)
            .map_err(|e| format!("Failed to read back champion: {e}"))?;
        match champion {
            Some(v) => println!("Global {} is now {} v{}", opts.to_alias, v.name, v.version),
            None => println!("Promotion reported success but no {} found", opts.to_alias),
        }
        Ok(())
    } else {
        Err(format!("Promotion of {} was blocked", args.model_name))
    }
}
