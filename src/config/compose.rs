//! Named configuration groups
//!
//! Composition proper (defaults lists, interpolation) belongs to whatever
//! produces the group documents. This layer only needs "give me the tree for
//! this group", which [`ConfigComposer`] captures.

use super::store::read_yaml;
use super::tree;
use crate::error::{Error, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of named configuration trees
pub trait ConfigComposer {
    /// Resolve `group` (e.g. `"task=simple.classification"`) into a tree
    fn compose(&self, group: &str) -> Result<Value>;

    /// Resolve `group` and merge `overrides` on top
    fn compose_with(&self, group: &str, overrides: &Value) -> Result<Value> {
        Ok(tree::merge(&self.compose(group)?, overrides))
    }
}

/// Composer backed by a directory of YAML files.
///
/// `"group=name"` resolves to `<conf_dir>/group/name.yaml`, a bare `"name"`
/// to `<conf_dir>/name.yaml`.
#[derive(Debug, Clone)]
pub struct YamlGroupComposer {
    conf_dir: PathBuf,
}

impl YamlGroupComposer {
    /// Create a composer rooted at `conf_dir`
    pub fn new(conf_dir: impl Into<PathBuf>) -> Self {
        Self { conf_dir: conf_dir.into() }
    }

    /// Directory the groups are read from
    #[must_use]
    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    /// File a group spec resolves to
    #[must_use]
    pub fn group_path(&self, group: &str) -> PathBuf {
        let file = match group.split_once('=') {
            Some((dir, name)) => self.conf_dir.join(dir.trim()).join(name.trim()),
            None => self.conf_dir.join(group.trim()),
        };
        let mut file = file.into_os_string();
        file.push(".yaml");
        PathBuf::from(file)
    }
}

impl ConfigComposer for YamlGroupComposer {
    fn compose(&self, group: &str) -> Result<Value> {
        let path = self.group_path(group);
        if !path.is_file() {
            return Err(Error::GroupNotFound { group: group.to_string(), path });
        }
        debug!("Composing group '{}' from {}", group, path.display());
        read_yaml(&path)
    }
}
