//! CLI command implementations

mod info;
mod list;
mod promote;
mod record_eval;
mod register;
mod set_alias;


use crate::cli::{Cli, Command};
use crate::config::AbandonoConfig;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let config = AbandonoConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    match cli.command {
        Command::Register(args) => register::run_register(args, &config),
        Command::SetAlias(args) => set_alias::run_set_alias(args, &config),
        Command::Promote(args) => promote::run_promote(args, &config),
        Command::List(args) => list::run_list(args, &config),
        Command::Info(args) => info::run_info(args, &config),
        Command::RecordEval(args) => record_eval::run_record_eval(args, &config),
    }
}
