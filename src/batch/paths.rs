//! Project directory layout derived from a root and a batch name

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_task_name() -> String {
    "default-task".to_string()
}

/// `path` section of an entity configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Task the project belongs to
    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Project root; every derived directory lives under it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Log resolved paths
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self { task_name: default_task_name(), root: None, verbose: false }
    }
}

/// Resolved directory layout.
///
/// Only `root` and `batch_name` are stored; every directory is computed on
/// request so the layout cannot drift from its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    root: PathBuf,
    batch_name: String,
    task_name: String,
    verbose: bool,
}

impl PathSet {
    /// Layout for `batch_name` under `root`
    pub fn new(root: impl Into<PathBuf>, batch_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            batch_name: batch_name.into(),
            task_name: default_task_name(),
            verbose: false,
        }
    }

    /// Build from a `path` section; `root_override` wins over `settings.root`.
    pub fn from_settings(
        settings: &PathSettings,
        root_override: Option<&Path>,
        batch_name: &str,
    ) -> Result<Self> {
        let root = root_override
            .map(Path::to_path_buf)
            .or_else(|| settings.root.clone())
            .ok_or_else(|| Error::missing("path.root"))?;
        Ok(Self {
            root,
            batch_name: batch_name.to_string(),
            task_name: settings.task_name.clone(),
            verbose: settings.verbose,
        })
    }

    /// Same batch under a different root
    #[must_use]
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..self.clone() }
    }

    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn batch_name(&self) -> &str {
        &self.batch_name
    }

    #[must_use]
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// `root/outputs`
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// `root/outputs/<batch_name>`, created if absent
    pub fn batch_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.output_dir().join(&self.batch_name))
    }

    /// `root/libs`
    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.root.join("libs")
    }

    /// `root/data`
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// `root/models`
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    /// `root/cache`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// `root/tmp`
    #[must_use]
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}

/// Create `dir` and its parents if needed, returning it
pub(crate) fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    Ok(dir)
}
