//! Versioned persistence of configuration snapshots
//!
//! A saved batch produces two files in the batch's config directory:
//!
//! - `{batch_name}({batch_num})_config.yaml`: the live tree, restricted by a
//!   [`KeySelection`]. This is the document `load` reads back.
//! - `{batch_name}({batch_num})_config.json`: a flattened settings document
//!   for quick inspection. It is write-only from this crate's point of view.

use super::snapshot::ConfigSnapshot;
use super::tree;
use crate::batch::BatchVersion;
use crate::error::{Error, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level keys left out of persisted snapshots by default.
///
/// These hold resolved paths, secrets and auto-instantiated handles that are
/// re-derived on construction and must not round-trip.
pub const DEFAULT_EXCLUDE: &[&str] = &["path", "module", "secret", "auto", "project"];

/// Which top-level keys of the live tree end up in a saved snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    /// Keep only these keys
    Include(Vec<String>),
    /// Keep everything except these keys
    Exclude(Vec<String>),
}

impl Default for KeySelection {
    fn default() -> Self {
        Self::exclude(DEFAULT_EXCLUDE.iter().copied())
    }
}

impl KeySelection {
    /// Keep only the given top-level keys
    pub fn include<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(keys.into_iter().map(Into::into).collect())
    }

    /// Drop the given top-level keys
    pub fn exclude<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(keys.into_iter().map(Into::into).collect())
    }

    /// Apply the selection to the top level of `tree`
    #[must_use]
    pub fn apply(&self, tree: &Value) -> Value {
        let Some(map) = tree.as_mapping() else {
            return tree.clone();
        };
        let mut out = serde_yaml::Mapping::new();
        match self {
            Self::Include(keys) => {
                for key in keys {
                    if let Some(value) = map.get(key.as_str()) {
                        out.insert(Value::String(key.clone()), value.clone());
                    }
                }
            }
            Self::Exclude(keys) => {
                for (key, value) in map {
                    let excluded = key.as_str().is_some_and(|k| keys.iter().any(|e| e == k));
                    if !excluded {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Value::Mapping(out)
    }
}

/// Where the tree produced by [`ConfigStore::load`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Baseline merged with the historical snapshot at this path
    Restored(PathBuf),
    /// No snapshot at this path; baseline merged with overrides only
    NotFound(PathBuf),
    /// Live tree merged with overrides
    Live,
}

impl LoadOutcome {
    /// True when a historical snapshot was merged in
    #[must_use]
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored(_))
    }
}

/// Owner of an entity's configuration snapshot and its persisted versions
#[derive(Debug, Clone)]
pub struct ConfigStore {
    snapshot: ConfigSnapshot,
    exclude: Vec<String>,
}

impl ConfigStore {
    /// Wrap `tree`, capturing it as the baseline
    #[must_use]
    pub fn new(tree: Value) -> Self {
        Self {
            snapshot: ConfigSnapshot::new(tree),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Replace the default exclude set
    #[must_use]
    pub fn with_exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys dropped when no explicit selection is given
    #[must_use]
    pub fn default_exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Snapshot (live + baseline)
    #[must_use]
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Live tree
    #[must_use]
    pub fn live(&self) -> &Value {
        self.snapshot.live()
    }

    /// Mutable live tree
    pub fn live_mut(&mut self) -> &mut Value {
        self.snapshot.live_mut()
    }

    /// Baseline tree
    #[must_use]
    pub fn baseline(&self) -> &Value {
        self.snapshot.baseline()
    }

    /// Persist the live tree as `version`'s structured snapshot, then write
    /// the flattened settings document next to it.
    ///
    /// Returns the snapshot file name.
    pub fn save(&self, version: &BatchVersion, selection: Option<&KeySelection>) -> Result<String> {
        let selection = selection
            .cloned()
            .unwrap_or_else(|| KeySelection::Exclude(self.exclude.clone()));
        let path = version.config_filepath()?;
        info!("Saving config to {}", path.display());

        write_yaml(&path, &selection.apply(self.live()))?;

        let exclude = match &selection {
            KeySelection::Exclude(keys) => keys.clone(),
            KeySelection::Include(_) => self.exclude.clone(),
        };
        self.save_settings(version, &exclude)?;
        Ok(version.config_filename())
    }

    /// Write the flattened settings document for `version`.
    ///
    /// The resolved batch identity (name, number, seed) is folded in so the
    /// document reflects what actually ran, not only what was configured.
    pub fn save_settings(&self, version: &BatchVersion, exclude: &[String]) -> Result<PathBuf> {
        let mut identity = tree::empty();
        tree::set_path(&mut identity, "batch.batch_name", version.batch_name().into());
        tree::set_path(&mut identity, "batch.batch_num", version.batch_num().into());
        tree::set_path(&mut identity, "batch.seed", version.seed().into());

        let resolved = tree::merge(self.live(), &identity);
        let selected = KeySelection::Exclude(exclude.to_vec()).apply(&resolved);
        let settings = tree::flatten_settings(&selected);

        let path = version.config_jsonpath()?;
        debug!("Saving settings to {}", path.display());
        let json = serde_json::to_string_pretty(&settings)?;
        fs::write(&path, json).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Rebuild the live tree.
    ///
    /// With `historical`, start from a copy of the baseline and merge the
    /// snapshot at that path (if it exists), then `overrides`. Without it,
    /// merge `overrides` onto the current live tree. The baseline is never
    /// modified.
    pub fn load(&mut self, historical: Option<&Path>, overrides: &Value) -> Result<LoadOutcome> {
        let (base, outcome) = match historical {
            Some(path) if path.is_file() => {
                info!("Loading config from {}", path.display());
                let saved = read_yaml(path)?;
                (self.snapshot.baseline_with(&saved), LoadOutcome::Restored(path.to_path_buf()))
            }
            Some(path) => {
                info!("No config file found at {}", path.display());
                (self.baseline().clone(), LoadOutcome::NotFound(path.to_path_buf()))
            }
            None => (self.live().clone(), LoadOutcome::Live),
        };

        debug!("Merging config with overrides: {:?}", overrides);
        self.snapshot.replace_live(tree::merge(&base, overrides));
        Ok(outcome)
    }
}

/// Write a tree as a YAML document
pub fn write_yaml(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml).map_err(|e| Error::io(path, e))
}

/// Read a YAML document into a tree
pub fn read_yaml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(match value {
        Value::Null => tree::empty(),
        other => other,
    })
}
