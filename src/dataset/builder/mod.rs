//! Dataset building
//!
//! [`DatasetBuilder::build`] walks the declared splits. For each split with
//! sources it either reuses an existing output file or fetches through a
//! [`SplitLoader`], then runs the transform and process pipelines, persists
//! the result and folds statistics into the corpus summary:
//!
//! ```text
//! Pending -> Fetched -> Transformed -> Persisted -> StatsComputed
//!    \
//!     `-> Skipped (output exists, overwrite off)
//! ```
//!
//! Output files live in `data_dir`:
//!
//! - `{name}-{split}.{filetype}`: the split
//! - `meta-{name}-{split}.{filetype}`: metadata columns (`save_metadata`)
//! - `sample-{name}-{split}-{n}.csv`: first rows (`save_samples`)
//! - `info-{name}.yaml`: corpus summary

mod loader;
mod spec;
mod stage;

pub use loader::{FileSourceLoader, SplitLoader};
pub use spec::{BuildSpec, DataSources, FetchSpec};
pub use stage::{BuildStage, SplitReport};

use crate::config::tree;
use crate::config::validate::validate_build_spec;
use crate::dataset::io::{DtypeHints, FileTableIo, TableIo};
use crate::dataset::pipeline::{apply_pipeline, StepContext, StepRegistry};
use crate::dataset::stats::{SplitStats, SummaryInfo};
use crate::dataset::table::{cell_text, Table};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

const SAVE_METADATA: &str = "save_metadata";
const SAVE_SAMPLES: &str = "save_samples";
const SAVE_DATAFRAME: &str = "save_dataframe";

/// Builds the splits of one dataset from its [`BuildSpec`]
pub struct DatasetBuilder {
    spec: BuildSpec,
    transform: Vec<String>,
    process: Vec<String>,
    step_args: Mapping,
    registry: StepRegistry,
    loader: Box<dyn SplitLoader>,
    io: Box<dyn TableIo>,
}

impl std::fmt::Debug for DatasetBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetBuilder")
            .field("name", &self.spec.name)
            .field("transform", &self.transform)
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

impl DatasetBuilder {
    /// Validate `spec` against the builtin steps
    pub fn new(spec: BuildSpec) -> Result<Self> {
        Self::with_registry(spec, StepRegistry::with_builtins())
    }

    /// Validate `spec` against `registry`.
    ///
    /// Sources are read from `fetch.data_dir` (falling back to `data_dir`)
    /// with the dtypes declared in `column_info`.
    pub fn with_registry(spec: BuildSpec, registry: StepRegistry) -> Result<Self> {
        validate_build_spec(&spec, &registry)?;
        let transform = spec.transform_steps()?;
        let process = spec.process_steps()?;
        let step_args = spec.step_args();

        let fetch_dir = spec.fetch.data_dir.clone().unwrap_or_else(|| spec.data_dir.clone());
        let loader = FileSourceLoader::new(fetch_dir).with_dtype_hints(dtype_hints(&spec));

        Ok(Self {
            spec,
            transform,
            process,
            step_args,
            registry,
            loader: Box::new(loader),
            io: Box::new(FileTableIo),
        })
    }

    /// Replace the split loader
    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn SplitLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the table reader/writer used for outputs
    #[must_use]
    pub fn with_io(mut self, io: Box<dyn TableIo>) -> Self {
        self.io = io;
        self
    }

    #[must_use]
    pub fn spec(&self) -> &BuildSpec {
        &self.spec
    }

    /// `data_dir/{name}-{split}.{filetype}`
    #[must_use]
    pub fn output_file(&self, split: &str) -> PathBuf {
        self.spec.data_dir.join(format!("{}-{}.{}", self.spec.name, split, self.spec.extension()))
    }

    /// `data_dir/meta-{name}-{split}.{filetype}`
    #[must_use]
    pub fn meta_file(&self, split: &str) -> PathBuf {
        self.spec
            .data_dir
            .join(format!("meta-{}-{}.{}", self.spec.name, split, self.spec.extension()))
    }

    /// `data_dir/sample-{name}-{split}-`
    #[must_use]
    pub fn sample_prefix(&self, split: &str) -> String {
        format!("{}/sample-{}-{}-", self.spec.data_dir.display(), self.spec.name, split)
    }

    /// Build every split with sources, then write the corpus summary once
    pub fn build(&self) -> Result<Vec<SplitReport>> {
        let data_dir = &self.spec.data_dir;
        fs::create_dir_all(data_dir).map_err(|e| Error::io(data_dir, e))?;

        let mut summary = self.summary()?;
        let mut reports = Vec::new();
        for (split, sources) in self.spec.splits()? {
            if sources.is_empty() {
                debug!("Split '{}' has no sources, skipping", split);
                continue;
            }
            reports.push(self.build_split(&split, &sources, summary.as_mut())?);
        }

        if let Some(summary) = &summary {
            summary.save()?;
        }
        info!(
            "Dataset [{}] is built to [{}] from [{}]",
            self.spec.name,
            data_dir.display(),
            self.loader_dir().display()
        );
        Ok(reports)
    }

    fn loader_dir(&self) -> &Path {
        self.spec.fetch.data_dir.as_deref().unwrap_or(self.spec.data_dir.as_path())
    }

    fn summary(&self) -> Result<Option<SummaryInfo>> {
        let Some(fields) = &self.spec.info else {
            return Ok(None);
        };
        let mut fields = fields.clone();
        let mut summary = SummaryInfo::new(&self.spec.name, &self.spec.data_dir);
        if let Some(columns) = &self.spec.column_info {
            fields.insert("column_info".into(), columns.to_value());
            summary = summary.with_text_columns(columns.text_columns());
        }
        let mut summary = summary.with_fields(fields);
        summary.load_existing()?;
        Ok(Some(summary))
    }

    fn build_split(
        &self,
        split: &str,
        sources: &[String],
        mut summary: Option<&mut SummaryInfo>,
    ) -> Result<SplitReport> {
        let fetch = &self.spec.fetch;
        let output_file = self.output_file(split);
        let fetching = fetch.overwrite || !output_file.exists();
        let (transform, process, step_args) = self.split_pipeline(split, fetching);
        let ctx = StepContext::new(self.io.as_ref()).with_split(split);
        let mut report = SplitReport::new(split, output_file.clone());

        let table = if fetching {
            let started = Instant::now();
            let table = self
                .loader
                .load(split, sources)?
                .ok_or_else(|| Error::EmptySplit { split: split.to_string() })?;
            info!(" >> elapsed time to load and parse data: {:.2?}", started.elapsed());
            report.advance(BuildStage::Fetched);
            if self.spec.verbose {
                info!(
                    "Fetched {} rows x {} columns\n{}",
                    table.num_rows(),
                    table.columns().len(),
                    preview(&table, 5)
                );
            }

            let table = if transform.is_empty() {
                table
            } else {
                info!("Transforming split '{}' with pipeline: {:?}", split, transform);
                apply_pipeline(table, &transform, &step_args, &self.registry, &ctx)?
            };
            report.advance(BuildStage::Transformed);

            if fetch.calculate_stats {
                if let Some(summary) = summary.as_deref_mut() {
                    summary.init_stats(self.base_stats(split));
                }
            }
            Some(table)
        } else {
            info!("{} already exists", output_file.display());
            report.advance(BuildStage::Skipped);
            if fetch.calculate_stats || fetch.preprocess_text {
                Some(self.io.load(&output_file, &dtype_hints(&self.spec))?)
            } else {
                None
            }
        };

        let Some(table) = table else {
            return Ok(report);
        };

        let table = if process.is_empty() {
            table
        } else {
            info!("Processing split '{}' with pipeline: {:?}", split, process);
            apply_pipeline(table, &process, &step_args, &self.registry, &ctx)?
        };
        if report.was_fetched() {
            report.advance(BuildStage::Persisted);
        }

        if fetch.calculate_stats {
            if let Some(summary) = summary.as_deref_mut() {
                if summary.split(split).is_none() {
                    summary.init_stats(self.base_stats(split));
                }
                summary.calculate_stats(split, &table);
                report.advance(BuildStage::StatsComputed);
            }
        }
        report.num_rows = Some(table.num_rows());
        Ok(report)
    }

    /// Step lists and arguments for one split, with the split's file paths
    /// injected into the file-writing steps.
    fn split_pipeline(&self, split: &str, fetching: bool) -> (Vec<String>, Vec<String>, Mapping) {
        let mut transform = self.transform.clone();
        let mut process = self.process.clone();
        let mut args = self.step_args.clone();
        let column_info = self.spec.column_info.clone().unwrap_or_default();

        if args.contains_key(SAVE_METADATA) {
            push_unique(&mut transform, SAVE_METADATA);
            let mut overlay = Mapping::new();
            overlay.insert("filepath".into(), path_value(&self.meta_file(split)));
            overlay.insert("column_info".into(), column_info.to_value());
            overlay.insert("split_name".into(), split.into());
            set_step_args(&mut args, SAVE_METADATA, overlay);
        }
        if args.contains_key(SAVE_SAMPLES) {
            push_unique(&mut process, SAVE_SAMPLES);
            let mut overlay = Mapping::new();
            overlay.insert("sample_file_prefix".into(), self.sample_prefix(split).into());
            set_step_args(&mut args, SAVE_SAMPLES, overlay);
        }
        if fetching || args.contains_key(SAVE_DATAFRAME) {
            push_unique(&mut process, SAVE_DATAFRAME);
            let mut overlay = Mapping::new();
            overlay.insert("filepath".into(), path_value(&self.output_file(split)));
            let keep = column_info.data_columns();
            if !keep.is_empty() {
                overlay.insert(
                    "columns_to_keep".into(),
                    Value::Sequence(keep.into_iter().map(Value::String).collect()),
                );
            }
            set_step_args(&mut args, SAVE_DATAFRAME, overlay);
        }
        (transform, process, args)
    }

    fn base_stats(&self, split: &str) -> SplitStats {
        let stats = SplitStats::new(split, &self.spec.name, &file_name(&self.output_file(split)));
        let meta_file = self.meta_file(split);
        if meta_file.is_file() {
            stats.with_meta_file(file_name(&meta_file))
        } else {
            stats
        }
    }
}

/// Load a table with the dtypes declared in `spec.column_info`
fn dtype_hints(spec: &BuildSpec) -> DtypeHints {
    spec.column_info.as_ref().map(|c| c.dtype_hints()).unwrap_or_default()
}

fn push_unique(steps: &mut Vec<String>, step: &str) {
    if !steps.iter().any(|s| s == step) {
        steps.push(step.to_string());
    }
}

fn set_step_args(args: &mut Mapping, step: &str, overlay: Mapping) {
    let base = match args.get(step) {
        Some(current) if current.is_mapping() => current.clone(),
        _ => Value::Mapping(Mapping::new()),
    };
    args.insert(step.into(), tree::merge(&base, &Value::Mapping(overlay)));
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// First rows of `table`, tab-separated
fn preview(table: &Table, rows: usize) -> String {
    let mut lines = vec![table.columns().join("\t")];
    for record in table.head(rows).rows() {
        lines.push(record.iter().map(cell_text).collect::<Vec<_>>().join("\t"));
    }
    lines.join("\n")
}
