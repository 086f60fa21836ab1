//! CLI command implementations

mod export;
mod inspect;
mod merge;


use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::cli::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);
    init_tracing(log_level);

    match cli.command {
        Command::Export(args) => export::run_export(args, log_level),
        Command::Merge(args) => merge::run_merge(args, log_level),
        Command::Inspect(args) => inspect::run_inspect(args, log_level),
    }
}
