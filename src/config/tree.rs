//! Helpers over configuration trees
//!
//! A configuration tree is a `serde_yaml::Value` whose interior nodes are
//! mappings. These functions never mutate their inputs unless the name says so
//! (`set_path`, `remove_path`).

use crate::error::{Error, Result};
use serde_json::Map as JsonMap;
use serde_yaml::{Mapping, Value};

/// Empty mapping node
#[must_use]
pub fn empty() -> Value {
    Value::Mapping(Mapping::new())
}

/// Structurally merge `overlay` onto `base`.
///
/// Nested mappings are merged key by key; for any other pair of values the
/// overlay wins. Key order of `base` is kept, new keys are appended.
#[must_use]
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            let mut merged = b.clone();
            for (key, value) in o {
                let next = match merged.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Mapping(merged)
        }
        (_, Value::Mapping(o)) if o.is_empty() => base.clone(),
        _ => overlay.clone(),
    }
}

/// Look up a dotted key path (`"batch.batch_name"`)
#[must_use]
pub fn get_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(tree, |node, key| node.as_mapping()?.get(key))
}

/// Look up a dotted key path and return it as a string slice
#[must_use]
pub fn get_str<'a>(tree: &'a Value, path: &str) -> Option<&'a str> {
    get_path(tree, path).and_then(Value::as_str)
}

/// Set a dotted key path, creating intermediate mappings as needed.
///
/// Non-mapping nodes on the way are replaced by mappings.
pub fn set_path(tree: &mut Value, path: &str, value: Value) {
    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };
    let mut node = tree;
    for key in parents.into_iter().flat_map(|p| p.split('.')) {
        let Some(map) = as_mapping_or_reset(node) else {
            return;
        };
        node = map.entry(Value::String(key.to_string())).or_insert_with(empty);
    }
    if let Some(map) = as_mapping_or_reset(node) {
        map.insert(Value::String(last.to_string()), value);
    }
}

fn as_mapping_or_reset(node: &mut Value) -> Option<&mut Mapping> {
    if !node.is_mapping() {
        *node = empty();
    }
    node.as_mapping_mut()
}

/// Remove a dotted key path, returning the removed value
pub fn remove_path(tree: &mut Value, path: &str) -> Option<Value> {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => (get_path_mut(tree, parent)?, last),
        None => (tree, path),
    };
    parent.as_mapping_mut()?.remove(last)
}

fn get_path_mut<'a>(tree: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(tree, |node, key| node.as_mapping_mut()?.get_mut(key))
}

/// Top-level keys of a mapping node, in order
#[must_use]
pub fn top_level_keys(tree: &Value) -> Vec<String> {
    tree.as_mapping()
        .map(|m| m.keys().filter_map(|k| k.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

/// Parse `key.path=value` overrides into a tree.
///
/// Right-hand sides are read as YAML scalars, so `3` is an integer,
/// `true` a bool and `[a, b]` a sequence. An empty right-hand side is null.
pub fn parse_overrides<S: AsRef<str>>(overrides: &[S]) -> Result<Value> {
    let mut tree = empty();
    for raw in overrides {
        let raw = raw.as_ref();
        let (key, rhs) = raw
            .split_once('=')
            .ok_or_else(|| Error::ConfigError(format!("override must be key=value: '{raw}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::ConfigError(format!("override has an empty key: '{raw}'")));
        }
        let value = if rhs.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(rhs)
                .unwrap_or_else(|_| Value::String(rhs.to_string()))
        };
        set_path(&mut tree, key, value);
    }
    Ok(tree)
}

/// Flatten a tree into a settings document.
///
/// Nested mappings become dotted keys, nulls are dropped, booleans, numbers
/// and strings are kept as they are and everything else is stringified.
#[must_use]
pub fn flatten_settings(tree: &Value) -> JsonMap<String, serde_json::Value> {
    let mut out = JsonMap::new();
    flatten_into(tree, String::new(), &mut out);
    out
}

fn flatten_into(node: &Value, prefix: String, out: &mut JsonMap<String, serde_json::Value>) {
    match node {
        Value::Mapping(map) => {
            for (key, value) in map {
                let key = scalar_to_string(key);
                let path = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
                flatten_into(value, path, out);
            }
        }
        Value::Null => {}
        _ if prefix.is_empty() => {}
        Value::Bool(b) => {
            out.insert(prefix, serde_json::Value::Bool(*b));
        }
        Value::Number(n) => {
            let json = serde_json::to_value(n).unwrap_or_else(|_| n.to_string().into());
            out.insert(prefix, json);
        }
        Value::String(s) => {
            out.insert(prefix, serde_json::Value::String(s.clone()));
        }
        other => {
            out.insert(prefix, serde_json::Value::String(stringify(other)));
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => stringify(other),
    }
}

/// String form of a non-primitive node (JSON text when representable)
fn stringify(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}
