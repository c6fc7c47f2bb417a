//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::{ConfigAction, OutputFormat};

/// Tanda: batch-versioned configuration and dataset builds
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "tanda")]
#[command(version)]
#[command(about = "Batch-versioned configuration snapshots and dataset build pipelines")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

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
    /// Build a dataset from a YAML build configuration
    Build(BuildArgs),

    /// Show or save the configuration snapshot of a batch
    Config(ConfigArgs),

    /// Validate a build configuration without building
    Validate(ValidateArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct BuildArgs {
    /// Path to YAML build configuration
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Dotted key of the build section inside CONFIG
    #[arg(short, long)]
    pub section: Option<String>,

    /// Rebuild splits whose output already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Compute split statistics into the corpus info
    #[arg(long)]
    pub stats: bool,

    /// Override a config value (`key.path=value`), repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ConfigArgs {
    /// show or save
    #[arg(value_name = "ACTION")]
    pub action: ConfigAction,

    #[command(flatten)]
    pub entity: EntityArgs,

    /// Output format of `show` (text, json, yaml)
    #[arg(short, long, default_value = "yaml")]
    pub format: OutputFormat,

    /// Only save these top-level keys
    #[arg(long, conflicts_with = "exclude")]
    pub include: Vec<String>,

    /// Leave these top-level keys out of the saved snapshot
    #[arg(long)]
    pub exclude: Vec<String>,
}

/// Where an entity's configuration comes from
#[derive(Parser, Debug, Clone, PartialEq, Default)]
pub struct EntityArgs {
    /// YAML file with the entity configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Config group to compose (`group=name` or `name`)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Directory holding config groups
    #[arg(long, default_value = "conf")]
    pub conf_dir: PathBuf,

    /// Project root (`path.root`)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Batch name, replacing the configured one
    #[arg(long)]
    pub batch_name: Option<String>,

    /// Batch number to load
    #[arg(long)]
    pub batch_num: Option<u32>,

    /// Override a config value (`key.path=value`), repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML build configuration
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Dotted key of the build section inside CONFIG
    #[arg(short, long)]
    pub section: Option<String>,

    /// Show the parsed configuration after validation
    #[arg(short, long)]
    pub detailed: bool,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
