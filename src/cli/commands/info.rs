//! Show a model's versions and metadata

use chrono::DateTime;

use crate::cli::{InfoArgs, OutputFormat};
use crate::config::AbandonoConfig;
use crate::registry::storage::JsonFileRegistry;
use crate::registry::ModelRegistry;

pub fn run_info(args: InfoArgs, config: &AbandonoConfig) -> Result<(), String> {
    let registry = ModelRegistry::new(JsonFileRegistry::new(&config.registry_path));

    let info = registry
        .model_info(&args.model_name)
        .map_err(|e| format!("Failed to get model info: {e}"))?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("Model: {}", info.name);
            if let Some(desc) = &info.description {
                println!("  Desc:    {desc}");
            }
            println!("  Created: {}", format_ts(info.creation_timestamp_ms));
            println!("  Updated: {}", format_ts(info.last_updated_timestamp_ms));

            if info.versions.is_empty() {
                println!("\n  No versions");
            } else {
                println!("\n  Versions ({}):", info.versions.len());
                println!("    {:<8} {:<12} {:<10} {:<20} {:<20}", "VERSION", "STAGE", "STATUS", "RUN", "CREATED");
                for v in &info.versions {
                    println!(
                        "    {:<8} {:<12} {:<10} {:<20} {:<20}",
                        v.version,
                        v.stage.to_string(),
                        format!("{:?}", v.status),
                        v.run_id.as_deref().unwrap_or("-"),
                        format_ts(v.creation_timestamp_ms),
                    );
                }
            }
        }
    }
    Ok(())
}

/// Render an epoch-ms timestamp for humans
fn format_ts(ms: u64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
