//! CLI argument types

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Abandono: churn-model registry and promotion CLI
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "abandono")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Churn-model registry with champion/challenger promotion")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to the YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a model version from a training run
    Register(RegisterArgs),

    /// Set an alias on a model version
    SetAlias(SetAliasArgs),

    /// Promote a model version to the global champion alias
    Promote(PromoteArgs),

    /// List registered models
    List(ListArgs),

    /// Show a model's versions and metadata
    Info(InfoArgs),

    /// Record a finished evaluation run for a training run
    RecordEval(RecordEvalArgs),
}

/// Arguments for the register command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RegisterArgs {
    /// Training run ID the model artifact came from
    #[arg(long)]
    pub run_id: String,

    /// Name to register the model under
    #[arg(long)]
    pub model_name: String,

    /// Description for the model version
    #[arg(long)]
    pub description: Option<String>,
}

/// Arguments for the set-alias command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SetAliasArgs {
    /// Model name
    #[arg(long)]
    pub model_name: String,

    /// Version to alias
    #[arg(long)]
    pub version: String,

    /// Alias to set
    #[arg(long, value_enum)]
    pub alias: AliasArg,
}

/// Arguments for the promote command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PromoteArgs {
    /// Model name
    #[arg(long)]
    pub model_name: String,

    /// Version to promote (latest when omitted)
    #[arg(long)]
    pub version: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ListArgs {
    /// Maximum number of models to list
    #[arg(long, default_value_t = 100)]
    pub max_results: usize,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Model name
    #[arg(long)]
    pub model_name: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the record-eval command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RecordEvalArgs {
    /// Training run the evaluation scored
    #[arg(long)]
    pub source_run_id: String,

    /// Metrics as name=value pairs (e.g. --metric f1_score=0.85)
    #[arg(long = "metric", value_name = "NAME=VALUE", required = true)]
    pub metrics: Vec<String>,
}

/// Aliases the workflow recognizes
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasArg {
    Staging,
    Champion,
    Production,
}

impl AliasArg {
    /// Alias string as stored in the registry
    pub fn as_str(self) -> &'static str {
        match self {
            AliasArg::Staging => "staging",
            AliasArg::Champion => "champion",
            AliasArg::Production => "production",
        }
    }
}

/// Output format for info-style commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parse CLI arguments from an iterator (testable entry point)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
