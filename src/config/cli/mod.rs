//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! tanda build conf/dataset/nsmc.yaml --stats
//! tanda build project.yaml --section dataset --set fetch.overwrite=true
//! tanda validate conf/dataset/nsmc.yaml
//! tanda config show --group task=nsmc --batch-num 2
//! tanda config save --config exp1.yaml --root /workspace
//! ```

mod core;
mod types;

pub use core::{parse_args, BuildArgs, Cli, Command, ConfigArgs, EntityArgs, ValidateArgs};
pub use types::{ConfigAction, OutputFormat};

#[cfg(test)]
mod tests;
