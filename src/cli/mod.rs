//! CLI module for abandono
//!
//! Argument types and command handlers for the registry workflow:
//!
//! ```bash
//! abandono record-eval --source-run-id train-42 --metric f1_score=0.85
//! abandono register --run-id train-42 --model-name churn_rf
//! abandono set-alias --model-name churn_rf --version 1 --alias staging
//! abandono promote --model-name churn_rf
//! abandono list
//! abandono info --model-name churn_rf
//! ```

mod args;
mod commands;

pub use args::{
    parse_args, AliasArg, Cli, Command, InfoArgs, ListArgs, OutputFormat, PromoteArgs,
    RecordEvalArgs, RegisterArgs, SetAliasArgs,
};
pub use commands::run_command;
