//! Configuration trees, snapshots and their persisted versions
//!
//! - [`tree`]: merge, dotted lookup and flattening helpers
//! - [`ConfigSnapshot`]: live tree + immutable baseline
//! - [`ConfigStore`]: save/load of versioned snapshots
//! - [`ConfigComposer`]: named group resolution
//! - [`validate`]: build and batch config checks
//! - [`Cli`]: command-line surface of the `tanda` binary

mod cli;
mod compose;
mod snapshot;
mod store;
pub mod tree;
pub mod validate;


pub use cli::{
    parse_args, BuildArgs, Cli, Command, ConfigAction, ConfigArgs, EntityArgs, OutputFormat,
    ValidateArgs,
};
pub use compose::{ConfigComposer, YamlGroupComposer};
pub use snapshot::ConfigSnapshot;
pub use store::{read_yaml, write_yaml, ConfigStore, KeySelection, LoadOutcome, DEFAULT_EXCLUDE};
pub use tree::{flatten_settings, merge, parse_overrides};
pub use validate::{validate_batch_settings, validate_build_spec, ValidationError};
