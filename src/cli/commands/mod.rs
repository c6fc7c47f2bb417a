//! CLI command implementations

mod build;
mod config;
mod validate;

#[cfg(test)]
mod tests;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Build(args) => build::run_build(args, log_level),
        Command::Config(args) => config::run_config(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
    }
}
