//! List registered models

use crate::cli::ListArgs;
use crate::config::AbandonoConfig;
use crate::registry::storage::JsonFileRegistry;
use crate::registry::ModelRegistry;

pub fn run_list(args: ListArgs, config: &AbandonoConfig) -> Result<(), String> {
    let registry = ModelRegistry::new(JsonFileRegistry::new(&config.registry_path));

    let models = registry
        .list_models(args.max_results)
        .map_err(|e| format!("Failed to list models: {e}"))?;

    if models.is_empty() {
        println!("No registered models found");
        return Ok(());
    }

    println!("Found {} registered model(s):", models.len());
    for name in &models {
        println!("  - {name}");
    }
    Ok(())
}
