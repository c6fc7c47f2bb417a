//! Batch identity: name, incrementing number and seed
//!
//! A batch number is not stored anywhere on its own. It is derived by counting
//! the snapshots already saved for the batch name:
//!
//! ```text
//! outputs/exp1/configs/exp1(0)_config.yaml
//! outputs/exp1/configs/exp1(1)_config.yaml   -> next run is exp1(2)
//! ```
//!
//! Counting is not atomic. Two processes starting the same batch in the same
//! output directory can derive the same number.

use super::paths::ensure_dir;
use crate::config::validate_batch_settings;
use crate::error::{Error, Result};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_true() -> bool {
    true
}

fn default_num_workers() -> usize {
    1
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_config_yaml() -> String {
    "config.yaml".to_string()
}

fn default_config_json() -> String {
    "config.json".to_string()
}

fn default_config_dirname() -> String {
    "configs".to_string()
}

/// `batch` section of an entity configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Batch name; falls back to the entity name when empty
    #[serde(default)]
    pub batch_name: String,

    /// Explicit batch number; derived from saved snapshots when absent
    #[serde(default)]
    pub batch_num: Option<u32>,

    /// Directory holding one sub-directory per batch name
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Suffix for batch output files (`{prefix}_{suffix}.{ext}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_suffix: Option<String>,

    /// Extension for batch output files, leading dots are stripped
    #[serde(default, alias = "output_extention", skip_serializing_if = "Option::is_none")]
    pub output_extension: Option<String>,

    /// Always draw a fresh seed, ignoring `seed`
    #[serde(default = "default_true")]
    pub random_seed: bool,

    /// Explicit seed; negative values request a random one
    #[serde(default)]
    pub seed: Option<i64>,

    /// Resume the run instead of starting over
    #[serde(default)]
    pub resume_run: bool,

    /// Reuse the latest batch number instead of allocating a new one
    #[serde(default)]
    pub resume_latest: bool,

    /// Worker processes for collaborators that parallelize
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Device collaborators should run on
    #[serde(default = "default_device")]
    pub device: String,

    /// Number of devices, when more than one is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_devices: Option<usize>,

    /// Suffix of structured snapshot files
    #[serde(default = "default_config_yaml")]
    pub config_yaml: String,

    /// Suffix of flattened settings files
    #[serde(default = "default_config_json")]
    pub config_json: String,

    /// Name of the snapshot directory inside the batch directory
    #[serde(default = "default_config_dirname")]
    pub config_dirname: String,

    /// Log identity decisions
    #[serde(default)]
    pub verbose: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::named("")
    }
}

impl BatchSettings {
    /// Default settings for `batch_name`
    pub fn named(batch_name: impl Into<String>) -> Self {
        Self {
            batch_name: batch_name.into(),
            batch_num: None,
            output_dir: default_output_dir(),
            output_suffix: None,
            output_extension: None,
            random_seed: true,
            seed: None,
            resume_run: false,
            resume_latest: false,
            num_workers: default_num_workers(),
            device: default_device(),
            num_devices: None,
            config_yaml: default_config_yaml(),
            config_json: default_config_json(),
            config_dirname: default_config_dirname(),
            verbose: false,
        }
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Use a fixed seed
    #[must_use]
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.random_seed = false;
        self.seed = Some(seed);
        self
    }

    /// Pin the batch number
    #[must_use]
    pub fn with_batch_num(mut self, batch_num: u32) -> Self {
        self.batch_num = Some(batch_num);
        self
    }

    /// Reuse the latest batch number
    #[must_use]
    pub fn resume_latest(mut self, enabled: bool) -> Self {
        self.resume_latest = enabled;
        self
    }
}

/// Resolve the seed once: random when requested, missing or negative,
/// otherwise the explicit value.
pub fn resolve_seed<R: Rng>(random_seed: bool, seed: Option<i64>, rng: &mut R) -> u64 {
    match seed {
        Some(seed) if !random_seed && seed >= 0 => seed as u64,
        _ => u64::from(rng.random_range(0..u32::MAX)),
    }
}

/// Strip leading/trailing dots from an output extension
#[must_use]
pub fn normalize_extension(extension: Option<&str>) -> String {
    extension.map(|e| e.trim_matches('.').to_string()).unwrap_or_default()
}

/// Resolved identity of one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchVersion {
    settings: BatchSettings,
    batch_num: u32,
    seed: u64,
    extension: String,
}

impl BatchVersion {
    /// Resolve a batch from its settings.
    ///
    /// Rejects invalid settings, draws the seed, normalizes the output
    /// extension and, when no number is pinned, counts saved snapshots to pick
    /// the batch number. Creates the
    /// batch and config directories as a side effect.
    pub fn new(settings: BatchSettings) -> Result<Self> {
        if settings.batch_name.trim().is_empty() {
            return Err(Error::missing("batch.batch_name"));
        }
        validate_batch_settings(&settings)?;
        let seed = resolve_seed(settings.random_seed, settings.seed, &mut rand::rng());
        if settings.verbose {
            info!("Setting seed to {seed}");
        }
        let extension = normalize_extension(settings.output_extension.as_deref());
        let mut version = Self { batch_num: settings.batch_num.unwrap_or(0), settings, seed, extension };
        version.init_batch_num()?;
        Ok(version)
    }

    /// Pick the batch number when the settings do not pin one
    fn init_batch_num(&mut self) -> Result<()> {
        if self.settings.batch_num.is_none() {
            let count = self.count_saved_configs()?;
            self.batch_num = if !self.settings.resume_latest {
                count
            } else if count == 0 {
                warn!(
                    "No saved config for batch '{}' to resume, starting at 0",
                    self.settings.batch_name
                );
                0
            } else {
                count - 1
            };
            self.settings.batch_num = Some(self.batch_num);
        }
        if self.settings.verbose {
            info!(
                "Init batch number - Batch name: {}, Batch num: {}",
                self.settings.batch_name, self.batch_num
            );
        }
        Ok(())
    }

    /// Number of snapshot files matching [`Self::config_filepattern`]
    pub fn count_saved_configs(&self) -> Result<u32> {
        let dir = self.config_dir()?;
        let pattern = self.config_regex()?;
        let mut count = 0u32;
        for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            if pattern.is_match(&entry.file_name().to_string_lossy()) {
                count += 1;
            }
        }
        Ok(count)
    }

    fn config_regex(&self) -> Result<Regex> {
        let pattern = format!(
            r"^{}\(.*\)_{}$",
            regex::escape(&self.settings.batch_name),
            regex::escape(&self.settings.config_yaml)
        );
        Ok(Regex::new(&pattern)?)
    }

    /// Settings with the resolved batch number filled in
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    #[must_use]
    pub fn batch_name(&self) -> &str {
        &self.settings.batch_name
    }

    #[must_use]
    pub fn batch_num(&self) -> u32 {
        self.batch_num
    }

    /// Point this version at another number (no directory scan)
    pub fn set_batch_num(&mut self, batch_num: u32) {
        self.batch_num = batch_num;
        self.settings.batch_num = Some(batch_num);
    }

    /// Seed fixed at construction
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.settings.output_dir = dir.into();
    }

    /// Output extension without dots
    #[must_use]
    pub fn output_extension(&self) -> &str {
        &self.extension
    }

    #[must_use]
    pub fn resume_run(&self) -> bool {
        self.settings.resume_run
    }

    #[must_use]
    pub fn resume_latest(&self) -> bool {
        self.settings.resume_latest
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.settings.device
    }

    #[must_use]
    pub fn num_devices(&self) -> Option<usize> {
        self.settings.num_devices
    }

    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.settings.num_workers
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.settings.verbose
    }

    /// `output_dir/batch_name`, created if absent
    pub fn batch_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.settings.output_dir.join(&self.settings.batch_name))
    }

    /// `batch_dir/config_dirname`, created if absent
    pub fn config_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.batch_dir()?.join(&self.settings.config_dirname))
    }

    /// `"{batch_name}({batch_num})"`
    #[must_use]
    pub fn file_prefix(&self) -> String {
        format!("{}({})", self.settings.batch_name, self.batch_num)
    }

    /// `"{file_prefix}[_suffix].{extension}"`, without the dot when no
    /// extension is set
    #[must_use]
    pub fn output_file(&self) -> String {
        let stem = match self.settings.output_suffix.as_deref().filter(|s| !s.is_empty()) {
            Some(suffix) => format!("{}_{}", self.file_prefix(), suffix),
            None => self.file_prefix(),
        };
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    /// `"{file_prefix}_config.yaml"`
    #[must_use]
    pub fn config_filename(&self) -> String {
        format!("{}_{}", self.file_prefix(), self.settings.config_yaml)
    }

    /// `"{file_prefix}_config.json"`
    #[must_use]
    pub fn config_jsonfile(&self) -> String {
        format!("{}_{}", self.file_prefix(), self.settings.config_json)
    }

    /// Glob form of the snapshot name: `"{batch_name}(*)_config.yaml"`
    #[must_use]
    pub fn config_filepattern(&self) -> String {
        format!("{}(*)_{}", self.settings.batch_name, self.settings.config_yaml)
    }

    /// Full path of this version's structured snapshot
    pub fn config_filepath(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(self.config_filename()))
    }

    /// Full path of this version's settings document
    pub fn config_jsonpath(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(self.config_jsonfile()))
    }
}
