//! Batch entity: the addressable unit of a run
//!
//! An entity owns its directory layout ([`PathSet`]), its identity
//! ([`BatchVersion`]) and its configuration ([`ConfigStore`]). The live tree
//! mirrors the resolved identity under `batch.*` so a saved snapshot always
//! describes the run that produced it.
//!
//! Identity changes go through explicit methods that update both views at
//! once:
//!
//! - [`BatchEntity::update_batch_identity`] renames the batch and re-derives
//!   paths and batch number
//! - [`BatchEntity::set_batch_num`], [`BatchEntity::set_output_dir`] and
//!   [`BatchEntity::set_root_dir`] patch one field in both places

use super::device::{DeviceMemory, NoDevice};
use super::paths::{PathSet, PathSettings};
use super::version::{BatchSettings, BatchVersion};
use crate::config::tree::{self, get_path, get_str, remove_path, set_path};
use crate::config::{ConfigComposer, ConfigStore, KeySelection, LoadOutcome};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Process-level inputs an entity would otherwise read from the environment
#[derive(Debug)]
pub struct EntityContext {
    root_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    device: Box<dyn DeviceMemory>,
}

impl Default for EntityContext {
    fn default() -> Self {
        Self { root_dir: None, env: BTreeMap::new(), device: Box::new(NoDevice) }
    }
}

impl EntityContext {
    /// Empty context: no root override, no secrets, no accelerator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `path.root`
    #[must_use]
    pub fn with_root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root.into());
        self
    }

    /// Add an environment value or secret
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Plug in an accelerator
    #[must_use]
    pub fn with_device(mut self, device: Box<dyn DeviceMemory>) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// Look up an environment value or secret
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn device(&self) -> &dyn DeviceMemory {
        self.device.as_ref()
    }
}

/// Named, numbered run with its own directory and configuration snapshot
#[derive(Debug)]
pub struct BatchEntity {
    name: String,
    config_name: Option<String>,
    config_group: Option<String>,
    version: String,
    paths: PathSet,
    batch: BatchVersion,
    store: ConfigStore,
    context: EntityContext,
}

impl BatchEntity {
    /// Build an entity from inline arguments
    pub fn new(args: Value, context: EntityContext) -> Result<Self> {
        Self::from_tree(args, None, context)
    }

    /// Build an entity from a named configuration group with `args` merged on
    /// top
    pub fn from_group(
        composer: &dyn ConfigComposer,
        config_group: &str,
        args: &Value,
        context: EntityContext,
    ) -> Result<Self> {
        let tree = composer.compose_with(config_group, args)?;
        Self::from_tree(tree, Some(config_group.to_string()), context)
    }

    fn from_tree(tree: Value, config_group: Option<String>, context: EntityContext) -> Result<Self> {
        if !tree.is_mapping() {
            return Err(Error::ConfigError("entity configuration must be a mapping".into()));
        }
        let name = get_str(&tree, "name")
            .or_else(|| get_str(&tree, "batch.batch_name"))
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::missing("name"))?
            .to_string();
        let config_name = get_str(&tree, "config_name").map(String::from);
        let version = get_str(&tree, "version").unwrap_or("0.0.0").to_string();

        let mut store = ConfigStore::new(tree);
        let (paths, batch) = resolve_identity(store.live_mut(), &name, &context)?;

        Ok(Self { name, config_name, config_group, version, paths, batch, store, context })
    }

    /// Entity (and batch) name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    #[must_use]
    pub fn config_group(&self) -> Option<&str> {
        self.config_group.as_deref()
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Live configuration tree
    #[must_use]
    pub fn config(&self) -> &Value {
        self.store.live()
    }

    /// Mutable live tree, for domain sub-configs.
    ///
    /// Identity keys (`name`, `batch.batch_name`, `batch.batch_num`,
    /// `batch.output_dir`) should be changed through the setters instead.
    pub fn config_mut(&mut self) -> &mut Value {
        self.store.live_mut()
    }

    /// Configuration as it was at construction
    #[must_use]
    pub fn initial_config(&self) -> &Value {
        self.store.baseline()
    }

    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Deserialize a domain sub-config (`model`, `trainer`, `dataset`, ...)
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match get_path(self.config(), key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::ConfigError(format!("invalid '{key}' section: {e}"))),
        }
    }

    #[must_use]
    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    #[must_use]
    pub fn batch(&self) -> &BatchVersion {
        &self.batch
    }

    #[must_use]
    pub fn context(&self) -> &EntityContext {
        &self.context
    }

    /// Secret or environment value from the context
    #[must_use]
    pub fn secret(&self, key: &str) -> Option<&str> {
        self.context.env(key)
    }

    #[must_use]
    pub fn batch_name(&self) -> &str {
        self.batch.batch_name()
    }

    #[must_use]
    pub fn batch_num(&self) -> u32 {
        self.batch.batch_num()
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.batch.seed()
    }

    #[must_use]
    pub fn root_dir(&self) -> &Path {
        self.paths.root_dir()
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.batch.output_dir()
    }

    pub fn batch_dir(&self) -> Result<PathBuf> {
        self.batch.batch_dir()
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir()
    }

    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        self.paths.model_dir()
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.paths.cache_dir()
    }

    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.paths.library_dir()
    }

    #[must_use]
    pub fn tmp_dir(&self) -> PathBuf {
        self.paths.tmp_dir()
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.batch.verbose()
    }

    #[must_use]
    pub fn device(&self) -> &str {
        self.batch.device()
    }

    #[must_use]
    pub fn num_devices(&self) -> Option<usize> {
        self.batch.num_devices()
    }

    /// `batch_dir/{batch output file}`
    pub fn output_path(&self) -> Result<PathBuf> {
        Ok(self.batch_dir()?.join(self.batch.output_file()))
    }

    /// `batch_dir/{file_prefix}_{file}`
    pub fn batch_file(&self, file: &str) -> Result<PathBuf> {
        Ok(self.batch_dir()?.join(format!("{}_{}", self.batch.file_prefix(), file)))
    }

    /// Rename the batch and re-derive paths and batch number under the new
    /// name.
    pub fn update_batch_identity(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::ConfigError("batch name cannot be empty".into()));
        }
        self.rename(name);
        remove_path(self.store.live_mut(), "batch.batch_num");
        self.reinitialize()
    }

    /// Point the entity at another batch number
    pub fn set_batch_num(&mut self, batch_num: u32) {
        self.batch.set_batch_num(batch_num);
        set_path(self.store.live_mut(), "batch.batch_num", batch_num.into());
    }

    /// Move batch outputs to another directory
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        set_path(self.store.live_mut(), "batch.output_dir", path_value(&dir));
        self.batch.set_output_dir(dir);
    }

    /// Move the project root; outputs follow to `root/outputs`
    pub fn set_root_dir(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        set_path(self.store.live_mut(), "path.root", path_value(&root));
        self.context.root_dir = Some(root.clone());
        self.paths = self.paths.with_root(root);
        let output_dir = self.paths.output_dir();
        self.set_output_dir(output_dir);
    }

    /// Persist the live tree for the current batch. Returns the snapshot file
    /// name.
    pub fn save_config(&self, selection: Option<&KeySelection>) -> Result<String> {
        self.store.save(&self.batch, selection)
    }

    /// Persist only the flattened settings document
    pub fn save_settings(&self) -> Result<PathBuf> {
        self.store.save_settings(&self.batch, self.store.default_exclude())
    }

    /// Reload configuration.
    ///
    /// With `batch_num`, restart from the baseline and merge the snapshot
    /// saved for `(batch_name, batch_num)`, then `overrides`. When no such
    /// snapshot exists the number is dropped and a fresh one is derived.
    /// Without `batch_num`, merge `overrides` onto the live tree; the number
    /// only changes if `batch_name` names another batch.
    pub fn load_config(
        &mut self,
        batch_name: Option<&str>,
        batch_num: Option<u32>,
        overrides: &Value,
    ) -> Result<&Value> {
        info!("> Loading config for batch_name: {:?} batch_num: {:?}", batch_name, batch_num);
        let batch_name = batch_name.unwrap_or(self.batch.batch_name()).to_string();

        let outcome = match batch_num {
            Some(num) => {
                let mut settings = self.batch.settings().clone();
                settings.batch_name = batch_name.clone();
                settings.batch_num = Some(num);
                let path = BatchVersion::new(settings)?.config_filepath()?;
                self.store.load(Some(&path), overrides)?
            }
            None => self.store.load(None, overrides)?,
        };

        let keep_num = match (&outcome, batch_num) {
            (LoadOutcome::NotFound(_), _) => None,
            (_, Some(num)) => Some(num),
            (_, None) if batch_name == self.batch.batch_name() => Some(self.batch.batch_num()),
            (_, None) => None,
        };

        self.rename(&batch_name);
        match keep_num {
            Some(num) => set_path(self.store.live_mut(), "batch.batch_num", num.into()),
            None => {
                remove_path(self.store.live_mut(), "batch.batch_num");
            }
        }
        self.reinitialize()?;
        Ok(self.config())
    }

    /// Load a configuration and render it as YAML
    pub fn show_config(&mut self, batch_name: Option<&str>, batch_num: Option<u32>) -> Result<String> {
        let config = self.load_config(batch_name, batch_num, &tree::empty())?;
        Ok(serde_yaml::to_string(config)?)
    }

    /// Drop caller-held objects and release accelerator memory (best effort)
    pub fn reset(&mut self, objects: Vec<Box<dyn Any>>) {
        drop(objects);
        if self.context.device().release_memory() {
            info!("Released memory on {}", self.context.device().name());
        }
    }

    fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        let live = self.store.live_mut();
        set_path(live, "name", name.into());
        set_path(live, "batch.batch_name", name.into());
    }

    fn reinitialize(&mut self) -> Result<()> {
        let (paths, batch) = resolve_identity(self.store.live_mut(), &self.name, &self.context)?;
        self.paths = paths;
        self.batch = batch;
        Ok(())
    }
}

/// Resolve paths, then batch identity, from the live tree, mirroring every
/// derived value back into it.
fn resolve_identity(
    live: &mut Value,
    name: &str,
    context: &EntityContext,
) -> Result<(PathSet, BatchVersion)> {
    let batch_name = get_str(live, "batch.batch_name")
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(name)
        .to_string();
    set_path(live, "batch.batch_name", batch_name.as_str().into());

    let path_settings: PathSettings = match get_path(live, "path") {
        None | Some(Value::Null) => PathSettings::default(),
        Some(section) => serde_yaml::from_value(section.clone())
            .map_err(|e| Error::ConfigError(format!("invalid 'path' section: {e}")))?,
    };
    let paths = PathSet::from_settings(&path_settings, context.root_dir(), &batch_name)?;
    if let Some(root) = context.root_dir() {
        set_path(live, "path.root", path_value(root));
    }
    if paths.verbose() {
        info!("Resolved paths under {}", paths.root_dir().display());
    }
    set_path(live, "batch.output_dir", path_value(&paths.output_dir()));

    let settings: BatchSettings = match get_path(live, "batch") {
        Some(section) => serde_yaml::from_value(section.clone())
            .map_err(|e| Error::ConfigError(format!("invalid 'batch' section: {e}")))?,
        None => BatchSettings::named(batch_name.as_str()),
    };
    let batch = BatchVersion::new(settings)?;
    set_path(live, "batch.batch_num", batch.batch_num().into());

    info!(
        "Initialized batch: {}({}) in {}",
        batch.batch_name(),
        batch.batch_num(),
        paths.root_dir().display()
    );
    Ok((paths, batch))
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}
