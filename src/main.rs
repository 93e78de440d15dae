//! Abandono CLI
//!
//! Registry workflow entry point for the churn pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Record an evaluation of a training run
//! abandono record-eval --source-run-id train-42 --metric f1_score=0.85
//!
//! # Register the trained model
//! abandono register --run-id train-42 --model-name churn_rf
//!
//! # Stage it, then contend for the global champion slot
//! abandono set-alias --model-name churn_rf --version 1 --alias staging
//! abandono promote --model-name churn_rf
//!
//! # Inspect the registry
//! abandono list
//! abandono info --model-name churn_rf
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use abandono::cli::{run_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
