//! Register a model version from a training run

use std::collections::HashMap;

use crate::cli::RegisterArgs;
use crate::config::AbandonoConfig;
use crate::registry::storage::JsonFileRegistry;
use crate::registry::ModelRegistry;

pub fn run_register(args: RegisterArgs, config: &AbandonoConfig) -> Result<(), String> {
    let mut registry = ModelRegistry::new(JsonFileRegistry::new(&config.registry_path));

    let model_uri = format!("runs:/{}/model", args.run_id);
    let tags = HashMap::from([("source_run".to_string(), args.run_id.clone())]);

    let version = registry
        .register_version(
            &model_uri,
            &args.model_name,
            None,
            args.description.as_deref(),
            Some(&tags),
        )
        .map_err(|e| format!("Failed to register model: {e}"))?;

    println!("Registered {} v{}", args.model_name, version.version);
    println!(
        "Next: abandono set-alias --model-name {} --version {} --alias staging",
        args.model_name, version.version
    );
    Ok(())
}
