//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Dataset name cannot be empty")]
    EmptyName,

    #[error("Dataset data_dir cannot be empty")]
    EmptyDataDir,

    #[error("No data sources declared under fetch.data_sources")]
    NoDataSources,

    #[error("Invalid data sources: {0}")]
    InvalidSources(String),

    #[error("Unsupported filetype: {0} (must be one of: csv, tsv, jsonl, json)")]
    UnsupportedFiletype(String),

    #[error("calculate_stats requires an 'info' section")]
    StatsWithoutInfo,

    #[error("calculate_stats requires a 'column_info' section")]
    StatsWithoutColumnInfo,

    #[error("Unknown pipeline step: {0}")]
    UnknownStep(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Batch name cannot be empty")]
    EmptyBatchName,

    #[error("Invalid num_workers: {0} (must be > 0)")]
    InvalidNumWorkers(usize),

    #[error("Invalid config file suffix: {0} (must end in .yaml or .yml)")]
    InvalidConfigSuffix(String),

    #[error("config_yaml and config_json share the suffix {0}")]
    ConfigSuffixCollision(String),
}
