//! Column roles of a dataset
//!
//! ```yaml
//! column_info:
//!   keys:
//!     id: [doc_id, sent_id]   # or a single name
//!     text: text
//!   data:
//!     doc_id: int
//!     sent_id: int
//!     text: str
//!   meta:
//!     source: str
//! ```

use super::io::DtypeHints;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// One column name or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

fn default_id() -> OneOrMany {
    OneOrMany::One("id".to_string())
}

/// Key columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnKeys {
    /// Row identifier(s)
    #[serde(default = "default_id")]
    pub id: OneOrMany,

    /// Text column(s) used for statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<OneOrMany>,
}

impl Default for ColumnKeys {
    fn default() -> Self {
        Self { id: default_id(), text: None }
    }
}

/// `column_info` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(default)]
    pub keys: ColumnKeys,

    /// Data columns in declared order, mapped to dtype names
    #[serde(default)]
    pub data: Mapping,

    /// Metadata columns split off by `save_metadata`
    #[serde(default)]
    pub meta: Mapping,
}

impl ColumnInfo {
    /// Identifier columns
    #[must_use]
    pub fn id_keys(&self) -> Vec<String> {
        self.keys.id.to_vec()
    }

    /// Data columns, in declared order
    #[must_use]
    pub fn data_columns(&self) -> Vec<String> {
        mapping_keys(&self.data)
    }

    /// Metadata columns, in declared order
    #[must_use]
    pub fn meta_columns(&self) -> Vec<String> {
        mapping_keys(&self.meta)
    }

    /// Columns that must be present in a loaded split: ids, then data
    #[must_use]
    pub fn required_columns(&self) -> Vec<String> {
        let mut required = self.id_keys();
        for column in self.data_columns() {
            if !required.contains(&column) {
                required.push(column);
            }
        }
        required
    }

    /// Text columns: `keys.text`, or every data column typed as a string
    #[must_use]
    pub fn text_columns(&self) -> Vec<String> {
        if let Some(text) = &self.keys.text {
            return text.to_vec();
        }
        self.data
            .iter()
            .filter(|(_, dtype)| dtype.as_str().is_some_and(|d| d.starts_with("str")))
            .filter_map(|(k, _)| k.as_str().map(String::from))
            .collect()
    }

    /// Dtype hints for data and meta columns
    #[must_use]
    pub fn dtype_hints(&self) -> DtypeHints {
        let pairs = self
            .data
            .iter()
            .chain(self.meta.iter())
            .filter_map(|(k, v)| Some((k.as_str()?, v.as_str()?)));
        DtypeHints::from_names(pairs)
    }

    /// As a YAML tree, for passing to pipeline steps
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_yaml::to_value(self).unwrap_or(Value::Null)
    }
}

fn mapping_keys(mapping: &Mapping) -> Vec<String> {
    mapping.keys().filter_map(|k| k.as_str().map(String::from)).collect()
}
