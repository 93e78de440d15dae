//! Record a finished evaluation run

use std::collections::HashMap;

use crate::cli::RecordEvalArgs;
use crate::config::AbandonoConfig;
use crate::tracking::storage::JsonFileRunStore;
use crate::tracking::EvalRecorder;

pub fn run_record_eval(args: RecordEvalArgs, config: &AbandonoConfig) -> Result<(), String> {
    let mut metrics = HashMap::new();
    for pair in &args.metrics {
        let (name, value) = parse_metric(pair)?;
        metrics.insert(name, value);
    }

    let mut recorder = EvalRecorder::new(JsonFileRunStore::new(&config.runs_path));
    let run = recorder
        .record_finished(&args.source_run_id, metrics)
        .map_err(|e| format!("Failed to record evaluation: {e}"))?;

    println!("Recorded evaluation {} for run {}", run.run_id, args.source_run_id);
    for (name, value) in &run.metrics {
        println!("  {name} = {value}");
    }
    Ok(())
}

/// Parse a `name=value` metric argument
fn parse_metric(pair: &str) -> Result<(String, f64), String> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("Invalid metric '{pair}', expected NAME=VALUE"))?;
    if name.is_empty() {
        return Err(format!("Invalid metric '{pair}', empty name"));
    }
    let value: f64 =
        value.parse().map_err(|_| format!("Invalid metric value in '{pair}'"))?;
    Ok((name.to_string(), value))
}
