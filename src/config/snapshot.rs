//! Live configuration tree with an immutable baseline

use super::tree;
use serde_yaml::Value;

/// Live configuration tree plus the tree as it was at construction.
///
/// The baseline is never handed out mutably; reloads start from a clone of it
/// so ad-hoc edits to the live tree cannot leak into a reloaded batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    live: Value,
    baseline: Value,
}

impl ConfigSnapshot {
    /// Capture `tree` as both the live value and the baseline
    #[must_use]
    pub fn new(tree: Value) -> Self {
        Self { baseline: tree.clone(), live: tree }
    }

    /// Current live tree
    #[must_use]
    pub fn live(&self) -> &Value {
        &self.live
    }

    /// Mutable access to the live tree
    pub fn live_mut(&mut self) -> &mut Value {
        &mut self.live
    }

    /// Tree as it was at construction
    #[must_use]
    pub fn baseline(&self) -> &Value {
        &self.baseline
    }

    /// Replace the live tree
    pub fn replace_live(&mut self, tree: Value) {
        self.live = tree;
    }

    /// Fresh copy of the baseline with `overrides` merged on top
    #[must_use]
    pub fn baseline_with(&self, overrides: &Value) -> Value {
        tree::merge(&self.baseline, overrides)
    }
}
