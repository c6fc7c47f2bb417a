//! tanda CLI
//!
//! Batch-versioned configuration and dataset builds.
//!
//! # Usage
//!
//! ```bash
//! # Build a dataset from the `dataset` section of a project config
//! tanda build project.yaml --section dataset
//!
//! # Rebuild, overwriting existing splits, and write summary statistics
//! tanda build project.yaml --overwrite --stats --set filetype=jsonl
//!
//! # Validate a build config
//! tanda validate project.yaml --detailed
//!
//! # Compose a batch config from a group and save a numbered snapshot
//! tanda config save --group task=nsmc --batch-name exp1
//!
//! # Show a saved snapshot
//! tanda config show --batch-name exp1 --batch-num 0 --format json
//! ```

use clap::Parser;
use std::process::ExitCode;
use tanda::cli::{init_logging, run_command, Cli, LogLevel};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
