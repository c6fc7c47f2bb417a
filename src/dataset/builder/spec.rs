//! Build configuration
//!
//! ```yaml
//! name: nsmc
//! data_dir: /data/datasets/nsmc
//! filetype: csv
//! column_info:
//!   keys: {id: id, text: text}
//!   data: {id: int, text: str, labels: int}
//! fetch:
//!   data_dir: /data/raw/nsmc
//!   data_sources:
//!     train: ratings_train.csv
//!     test: [ratings_test.csv]
//!   overwrite: false
//!   calculate_stats: true
//! info:
//!   description: Naver movie reviews
//! pipeline:
//!   _preprocess_: [normalize_whitespace, remove_empty]
//! ```

use crate::dataset::column::{ColumnInfo, OneOrMany};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

fn default_filetype() -> String {
    "csv".to_string()
}

/// Sources per split, in any of the accepted shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSources {
    /// Single file, used for `train`
    One(String),
    /// Several files, concatenated into `train`
    Many(Vec<String>),
    /// Explicit `split -> file(s)`; a null value skips the split
    Splits(Mapping),
}

impl DataSources {
    /// Normalize into `(split, files)` pairs in declared order
    pub fn splits(&self) -> Result<Vec<(String, Vec<String>)>> {
        match self {
            Self::One(file) => Ok(vec![("train".to_string(), vec![file.clone()])]),
            Self::Many(files) => Ok(vec![("train".to_string(), files.clone())]),
            Self::Splits(map) => map
                .iter()
                .map(|(split, files)| {
                    let split = split
                        .as_str()
                        .ok_or_else(|| Error::ConfigError(format!("split name must be a string: {split:?}")))?
                        .to_string();
                    let files = match files {
                        Value::Null => Vec::new(),
                        other => serde_yaml::from_value::<OneOrMany>(other.clone())
                            .map_err(|e| {
                                Error::ConfigError(format!("invalid sources for split '{split}': {e}"))
                            })?
                            .to_vec(),
                    };
                    Ok((split, files))
                })
                .collect(),
        }
    }
}

/// `fetch` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchSpec {
    /// Directory the source files are read from
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub data_sources: Option<DataSources>,

    /// Rebuild splits whose output already exists
    #[serde(default)]
    pub overwrite: bool,

    /// Compute per-split statistics into the corpus info
    #[serde(default)]
    pub calculate_stats: bool,

    /// Run the preprocess pipeline over existing outputs too
    #[serde(default)]
    pub preprocess_text: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<usize>,
}

/// Dataset build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Dataset name, used in every output file name
    pub name: String,

    /// Output directory of the built splits
    pub data_dir: PathBuf,

    /// Output file type (`csv`, `tsv`, `jsonl`, `json`)
    #[serde(default = "default_filetype")]
    pub filetype: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_info: Option<ColumnInfo>,

    #[serde(default)]
    pub fetch: FetchSpec,

    /// Corpus info fields; enables the `info-{name}.yaml` summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Mapping>,

    /// `_transform_` and `_preprocess_` step lists plus per-step arguments
    #[serde(default)]
    pub pipeline: Mapping,

    #[serde(default)]
    pub verbose: bool,
}

impl BuildSpec {
    /// Parse from a YAML tree
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_yaml::from_value(value.clone())
            .map_err(|e| Error::ConfigError(format!("invalid build config: {e}")))
    }

    /// Output extension without dots
    #[must_use]
    pub fn extension(&self) -> &str {
        self.filetype.trim_start_matches('.')
    }

    /// Steps run on freshly fetched tables
    pub fn transform_steps(&self) -> Result<Vec<String>> {
        self.step_list("_transform_")
    }

    /// Steps run after transforms, before persisting
    pub fn process_steps(&self) -> Result<Vec<String>> {
        self.step_list("_preprocess_")
    }

    /// Per-step argument bags (everything in `pipeline` that is not a list)
    #[must_use]
    pub fn step_args(&self) -> Mapping {
        self.pipeline
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), Some("_transform_" | "_preprocess_")))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn step_list(&self, key: &str) -> Result<Vec<String>> {
        match self.pipeline.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_yaml::from_value::<OneOrMany>(value.clone())
                .map(|steps| steps.to_vec())
                .map_err(|e| Error::ConfigError(format!("invalid pipeline.{key}: {e}"))),
        }
    }

    /// Declared splits with their sources
    pub fn splits(&self) -> Result<Vec<(String, Vec<String>)>> {
        match &self.fetch.data_sources {
            Some(sources) => sources.splits(),
            None => Ok(Vec::new()),
        }
    }
}
