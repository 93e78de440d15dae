//! Set an alias on a model version

use crate::cli::SetAliasArgs;
use crate::config::AbandonoConfig;
use crate::registry::storage::JsonFileRegistry;
use crate::registry::ModelRegistry;

pub fn run_set_alias(args: SetAliasArgs, config: &AbandonoConfig) -> Result<(), String> {
    let mut registry = ModelRegistry::new(JsonFileRegistry::new(&config.registry_path));

    let alias = args.alias.as_str();
    registry
        .set_alias(&args.model_name, &args.version, alias)
        .map_err(|e| format!("Failed to set alias: {e}"))?;

    println!("Alias set: {}@{alias} -> v{}", args.model_name, args.version);
    println!("Model can be loaded with: models:/{}@{alias}", args.model_name);
    Ok(())
}
