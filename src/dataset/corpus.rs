//! Built datasets as seen by their consumers
//!
//! A [`Dataset`] points at the splits a [`crate::dataset::builder::DatasetBuilder`]
//! wrote. When `info-{name}.yaml` sits in the dataset directory its fields are
//! merged over the arguments, so a consumer usually only needs:
//!
//! ```yaml
//! name: nsmc
//! data_dir: /data/datasets
//! ```
//!
//! which reads `/data/datasets/nsmc/nsmc-{train,dev,test}.csv`.

use super::column::{ColumnInfo, OneOrMany};
use super::io::{FileTableIo, TableIo};
use super::pipeline::{apply_pipeline, StepContext, StepRegistry};
use super::split::DatasetSplit;
use super::stats::info_path;
use super::table::Table;
use crate::config::{merge, read_yaml};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_SPLITS: [&str; 3] = ["train", "dev", "test"];

fn default_true() -> bool {
    true
}

fn default_filetype() -> String {
    "csv".to_string()
}

/// Location fields, read before the info file is merged in
#[derive(Debug, Deserialize)]
struct Location {
    name: OneOrMany,
    data_dir: PathBuf,
    #[serde(default = "default_true")]
    use_name_as_subdir: bool,
}

#[derive(Debug, Deserialize)]
struct DatasetArgs {
    #[serde(default = "default_filetype")]
    filetype: String,
    #[serde(default)]
    data_files: Option<Mapping>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    column_info: Option<ColumnInfo>,
    #[serde(default)]
    pipeline: Mapping,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    autoload: bool,
}

/// Named set of splits with declared column roles
pub struct Dataset {
    name: String,
    data_dir: PathBuf,
    filetype: String,
    description: Option<String>,
    license: Option<String>,
    column_info: ColumnInfo,
    pipeline: Vec<String>,
    step_args: Mapping,
    splits: Vec<DatasetSplit>,
    args: Value,
    verbose: bool,
    io: Box<dyn TableIo>,
    registry: StepRegistry,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("name", &self.name)
            .field("data_dir", &self.data_dir)
            .field("splits", &self.splits)
            .finish_non_exhaustive()
    }
}

impl Dataset {
    /// Parse `args`, merging `info-{name}.yaml` on top when present.
    ///
    /// Only `_pipeline_` runs on load; build-time step lists are ignored.
    ///
    /// Loads every split right away when `autoload` is set.
    pub fn new(args: &Value) -> Result<Self> {
        let location: Location = serde_yaml::from_value(args.clone())
            .map_err(|e| Error::ConfigError(format!("invalid dataset config: {e}")))?;
        let name = location
            .name
            .to_vec()
            .into_iter()
            .next()
            .ok_or_else(|| Error::missing("name"))?;
        let data_dir = if location.use_name_as_subdir {
            location.data_dir.join(&name)
        } else {
            location.data_dir
        };

        let info_file = info_path(&data_dir, &name);
        let args = if info_file.is_file() {
            debug!("Merging dataset info from {}", info_file.display());
            merge(args, &read_yaml(&info_file)?)
        } else {
            args.clone()
        };

        let parsed: DatasetArgs = serde_yaml::from_value(args.clone())
            .map_err(|e| Error::ConfigError(format!("invalid dataset config: {e}")))?;
        let column_info = parsed.column_info.ok_or_else(|| Error::missing("column_info"))?;
        let (pipeline, step_args) = split_pipeline(&parsed.pipeline)?;
        let extension = parsed.filetype.trim_start_matches('.').to_string();

        let splits = match &parsed.data_files {
            Some(files) => files
                .iter()
                .filter(|(_, file)| !file.is_null())
                .map(|(split, file)| {
                    let split = split
                        .as_str()
                        .ok_or_else(|| Error::ConfigError(format!("split name must be a string: {split:?}")))?;
                    let file = file
                        .as_str()
                        .ok_or_else(|| Error::ConfigError(format!("data file of '{split}' must be a string")))?;
                    Ok(DatasetSplit::new(split, data_dir.join(file)))
                })
                .collect::<Result<Vec<_>>>()?,
            None => DEFAULT_SPLITS
                .iter()
                .map(|split| DatasetSplit::new(*split, data_dir.join(format!("{name}-{split}.{extension}"))))
                .collect(),
        };

        let mut dataset = Self {
            name,
            data_dir,
            filetype: extension,
            description: parsed.description,
            license: parsed.license,
            column_info,
            pipeline,
            step_args,
            splits,
            args,
            verbose: parsed.verbose,
            io: Box::new(FileTableIo),
            registry: StepRegistry::with_builtins(),
        };
        if parsed.autoload {
            dataset.load()?;
        }
        Ok(dataset)
    }

    /// Replace the table reader
    #[must_use]
    pub fn with_io(mut self, io: Box<dyn TableIo>) -> Self {
        self.io = io;
        self
    }

    /// Replace the steps available to `_pipeline_`
    #[must_use]
    pub fn with_registry(mut self, registry: StepRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Read every split file once, checking columns and applying `_pipeline_`.
    ///
    /// Split files that do not exist are logged and left empty. Calling this
    /// again does not touch the files.
    pub fn load(&mut self) -> Result<()> {
        let io = self.io.as_ref();
        for split in &mut self.splits {
            if split.is_loaded() {
                continue;
            }
            if !split.path().is_file() {
                warn!("Split '{}' not found at {}, leaving it empty", split.name(), split.path().display());
                continue;
            }
            let name = split.name().to_string();
            let ctx = StepContext::new(io).with_split(&name);
            let table = split.load_with(io, &self.column_info, |table| {
                if self.pipeline.is_empty() {
                    Ok(table)
                } else {
                    apply_pipeline(table, &self.pipeline, &self.step_args, &self.registry, &ctx)
                }
            })?;
            info!("Loaded split '{}' of dataset [{}]: {} rows", name, self.name, table.num_rows());
            if self.verbose {
                debug!("Columns of '{}': {:?}", name, table.columns());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the split files
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn filetype(&self) -> &str {
        &self.filetype
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    #[must_use]
    pub fn column_info(&self) -> &ColumnInfo {
        &self.column_info
    }

    #[must_use]
    pub fn id_keys(&self) -> Vec<String> {
        self.column_info.id_keys()
    }

    #[must_use]
    pub fn data_columns(&self) -> Vec<String> {
        self.column_info.data_columns()
    }

    /// Steps applied to each split on load
    #[must_use]
    pub fn pipeline(&self) -> &[String] {
        &self.pipeline
    }

    #[must_use]
    pub fn splits(&self) -> &[DatasetSplit] {
        &self.splits
    }

    #[must_use]
    pub fn split(&self, name: &str) -> Option<&DatasetSplit> {
        self.splits.iter().find(|s| s.name() == name)
    }

    /// Loaded table of split `name`
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.split(name).and_then(DatasetSplit::table)
    }

    /// Arguments after merging the info file
    #[must_use]
    pub fn info(&self) -> &Value {
        &self.args
    }
}

/// Separate the `_pipeline_` step list from per-step argument bags
fn split_pipeline(pipeline: &Mapping) -> Result<(Vec<String>, Mapping)> {
    let mut steps = Vec::new();
    let mut args = Mapping::new();
    for (key, value) in pipeline {
        match key.as_str() {
            Some("_transform_" | "_preprocess_") => {
                debug!("Ignoring build-time step list '{}' on load", key.as_str().unwrap_or_default());
            }
            Some("_pipeline_") => {
                if value.is_null() {
                    continue;
                }
                let list: OneOrMany = serde_yaml::from_value(value.clone())
                    .map_err(|e| Error::ConfigError(format!("invalid pipeline list: {e}")))?;
                steps.extend(list.to_vec());
            }
            _ => {
                args.insert(key.clone(), value.clone());
            }
        }
    }
    Ok((steps, args))
}
