//! CLI module for tanda
//!
//! This module contains the command handlers and logging setup of the
//! `tanda` binary.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{init_logging, LogLevel};

// Re-export Cli from config for convenience
pub use crate::config::Cli;
