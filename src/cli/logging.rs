//! Logging utilities for CLI output
//!
//! Command results go to stdout through [`log`]. Library diagnostics go
//! through `tracing` to stderr; [`init_logging`] picks their filter from the
//! CLI level unless `RUST_LOG` is set.

use tracing_subscriber::EnvFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// From the global `--quiet` / `--verbose` flags; quiet wins
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Default `tracing` filter directive for this level
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "tanda=error",
            Self::Normal => "tanda=info",
            Self::Verbose => "tanda=debug",
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Install the global `tracing` subscriber. Later calls are no-ops.
pub fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbose() {
        assert_eq!(LogLevel::from_flags(true, true), LogLevel::Quiet);
        assert_eq!(LogLevel::from_flags(false, true), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
    }

    #[test]
    fn test_directive_per_level() {
        assert_eq!(LogLevel::Quiet.directive(), "tanda=error");
        assert_eq!(LogLevel::Verbose.directive(), "tanda=debug");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(LogLevel::Quiet);
        init_logging(LogLevel::Verbose);
    }
}
