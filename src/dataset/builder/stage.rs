//! Per-split build progress

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where a split is in the build.
///
/// Stages only move forward: `Pending -> Fetched -> Transformed -> Persisted
/// -> StatsComputed`. A split whose output already existed is `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Pending,
    Skipped,
    Fetched,
    Transformed,
    Persisted,
    StatsComputed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Skipped => "skipped",
            Self::Fetched => "fetched",
            Self::Transformed => "transformed",
            Self::Persisted => "persisted",
            Self::StatsComputed => "stats_computed",
        };
        f.write_str(name)
    }
}

/// Outcome of building one split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub split: String,
    pub output_file: PathBuf,
    pub stage: BuildStage,
    /// Rows in the final table, when one was materialized
    pub num_rows: Option<usize>,
    #[serde(skip)]
    fetched: bool,
}

impl SplitReport {
    #[must_use]
    pub fn new(split: &str, output_file: PathBuf) -> Self {
        Self { split: split.to_string(), output_file, stage: BuildStage::Pending, num_rows: None, fetched: false }
    }

    /// Move to `stage`; moving backwards is ignored
    pub fn advance(&mut self, stage: BuildStage) {
        if stage == BuildStage::Fetched {
            self.fetched = true;
        }
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Whether the loader ran for this split
    #[must_use]
    pub fn was_fetched(&self) -> bool {
        self.fetched
    }
}
