//! Step trait, registry and the pipeline runner

use super::steps;
use crate::dataset::io::TableIo;
use crate::dataset::table::Table;
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// What a step may touch besides its input table
pub struct StepContext<'a> {
    /// Reader/writer for steps that persist tables
    pub io: &'a dyn TableIo,
    /// Split being processed, when known
    pub split: Option<&'a str>,
}

impl<'a> StepContext<'a> {
    #[must_use]
    pub fn new(io: &'a dyn TableIo) -> Self {
        Self { io, split: None }
    }

    #[must_use]
    pub fn with_split(mut self, split: &'a str) -> Self {
        self.split = Some(split);
        self
    }
}

/// Named table transform.
///
/// Steps receive the table by value and return the (possibly new) table.
/// Identical input and arguments must give identical output.
pub trait PipelineStep {
    /// Name the step is referenced by in pipeline lists
    fn name(&self) -> &str;

    /// Transform `table` using the step's argument bag
    fn apply(&self, table: Table, args: &Value, ctx: &StepContext<'_>) -> Result<Table>;
}

/// Steps available to pipelines, by name
pub struct StepRegistry {
    steps: BTreeMap<String, Box<dyn PipelineStep>>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry").field("steps", &self.names()).finish()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StepRegistry {
    /// Registry without any step
    #[must_use]
    pub fn empty() -> Self {
        Self { steps: BTreeMap::new() }
    }

    /// Registry with every builtin step
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(steps::SaveMetadata);
        registry.register(steps::SaveSamples);
        registry.register(steps::SaveDataframe);
        registry.register(steps::FilterColumns);
        registry.register(steps::RenameColumns);
        registry.register(steps::DropDuplicates);
        registry.register(steps::RemoveEmpty);
        registry.register(steps::NormalizeWhitespace);
        registry
    }

    /// Add a step, replacing any step with the same name
    pub fn register<S: PipelineStep + 'static>(&mut self, step: S) {
        self.steps.insert(step.name().to_string(), Box::new(step));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn PipelineStep> {
        self.steps.get(name).map(|step| step.as_ref())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.keys().map(String::as_str).collect()
    }
}

/// Run `steps` over `table` in order.
///
/// Each step gets `step_args[name]` as its argument bag (an empty mapping when
/// absent). Unknown names fail before anything runs.
pub fn apply_pipeline(
    table: Table,
    steps: &[String],
    step_args: &Mapping,
    registry: &StepRegistry,
    ctx: &StepContext<'_>,
) -> Result<Table> {
    let resolved = steps
        .iter()
        .map(|name| registry.get(name).ok_or_else(|| Error::UnknownStep(name.clone())))
        .collect::<Result<Vec<_>>>()?;

    let empty = Value::Mapping(Mapping::new());
    let mut table = table;
    for step in resolved {
        let args = step_args.get(step.name()).filter(|v| !v.is_null()).unwrap_or(&empty);
        info!("Applying pipeline step '{}' to {} rows", step.name(), table.num_rows());
        table = step.apply(table, args, ctx)?;
    }
    Ok(table)
}
