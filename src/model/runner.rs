//! Task runner: a batch entity wired to a model service

use super::service::{ModelService, ModelSource, Predictions};
use crate::batch::BatchEntity;
use crate::config::tree::get_str;
use crate::dataset::{FileTableIo, Table, TableIo};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Cell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const DEFAULT_PRED_FILE: &str = "preds.csv";

fn default_input() -> String {
    "text".to_string()
}

fn default_predicted() -> String {
    "pred_labels".to_string()
}

fn default_model_outputs() -> String {
    "raw_preds".to_string()
}

/// Column names of prediction inputs and outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictColumns {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_predicted")]
    pub predicted: String,
    #[serde(default = "default_model_outputs")]
    pub model_outputs: String,
    /// Probability column; probabilities are dropped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_probs: Option<String>,
}

impl Default for PredictColumns {
    fn default() -> Self {
        Self {
            input: default_input(),
            predicted: default_predicted(),
            model_outputs: default_model_outputs(),
            pred_probs: None,
        }
    }
}

/// `columns` section
///
/// ```yaml
/// columns:
///   train:
///     text: document    # service name: data name
///     labels: label
///   predict:
///     input: document
///     predicted: pred_labels
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub train: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub predict: PredictColumns,
}

/// `model` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Name of the model directory under `model_dir`
    pub model_name: String,
    /// Remote identifier used when no local model exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name_or_path: Option<String>,
    /// Defaults to the entity's model directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    #[serde(default)]
    pub ignore_model_path: bool,
}

/// Runs training, prediction and evaluation for one batch
pub struct TaskRunner<S> {
    entity: BatchEntity,
    service: S,
    model: ModelSettings,
    columns: ColumnMapping,
    io: Box<dyn TableIo>,
    pred_data: Option<Table>,
}

impl<S: ModelService> TaskRunner<S> {
    /// Read the `model` and `columns` sections of `entity`
    pub fn new(entity: BatchEntity, service: S) -> Result<Self> {
        let model = entity.section::<ModelSettings>("model")?.ok_or_else(|| Error::missing("model"))?;
        let columns = entity.section::<ColumnMapping>("columns")?.unwrap_or_default();
        Ok(Self { entity, service, model, columns, io: Box::new(FileTableIo), pred_data: None })
    }

    /// Replace the writer used for prediction files
    #[must_use]
    pub fn with_io(mut self, io: Box<dyn TableIo>) -> Self {
        self.io = io;
        self
    }

    #[must_use]
    pub fn entity(&self) -> &BatchEntity {
        &self.entity
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    #[must_use]
    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    /// Replace the prediction column names
    pub fn set_predict_columns(&mut self, columns: PredictColumns) {
        self.columns.predict = columns;
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model.model_name
    }

    /// `model_dir/model_name`
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        let dir = self.model.model_dir.clone().unwrap_or_else(|| self.entity.model_dir());
        dir.join(&self.model.model_name)
    }

    /// `batch_dir/{file_prefix}_{pred_file}`; `pred_file` defaults to
    /// `batch.pred_file`
    pub fn pred_path(&self, pred_file: Option<&str>) -> Result<PathBuf> {
        let file = pred_file
            .or_else(|| get_str(self.entity.config(), "batch.pred_file"))
            .unwrap_or(DEFAULT_PRED_FILE);
        self.entity.batch_file(file)
    }

    /// Predictions written by the last [`Self::eval`]
    #[must_use]
    pub fn pred_data(&self) -> Option<&Table> {
        self.pred_data.as_ref()
    }

    /// Rename data columns to service names (`columns` maps service name to
    /// data name). Unset, identical or absent names are left alone. A rename
    /// onto a column that is kept is an error.
    pub fn rename_columns(
        &self,
        mut table: Table,
        columns: &BTreeMap<String, Option<String>>,
    ) -> Result<Table> {
        let renames: BTreeMap<String, String> = columns
            .iter()
            .filter_map(|(key, name)| {
                let name = name.as_deref()?;
                (name != key && table.has_column(name)).then(|| (name.to_string(), key.clone()))
            })
            .collect();
        if renames.is_empty() {
            debug!("No columns to rename");
            return Ok(table);
        }
        info!("Renaming columns: {:?}", renames);
        table.rename(&renames)?;
        Ok(table)
    }

    /// Apply the training renames to each split
    pub fn convert_to_train(
        &self,
        train: Table,
        dev: Option<Table>,
        test: Option<Table>,
    ) -> Result<(Table, Option<Table>, Option<Table>)> {
        let columns = &self.columns.train;
        Ok((
            self.rename_columns(train, columns)?,
            dev.map(|t| self.rename_columns(t, columns)).transpose()?,
            test.map(|t| self.rename_columns(t, columns)).transpose()?,
        ))
    }

    /// Input texts of `table`
    pub fn convert_to_predict(&self, table: &Table) -> Result<Vec<String>> {
        let input = &self.columns.predict.input;
        let cells = table.column(input).ok_or_else(|| {
            Error::ConfigError(format!("prediction input column '{input}' not in data"))
        })?;
        let inputs: Vec<String> = cells.map(crate::dataset::cell_text).collect();
        if self.entity.verbose() {
            debug!("First inputs: {:?}", inputs.iter().take(5).collect::<Vec<_>>());
        }
        Ok(inputs)
    }

    /// Add prediction columns to `table`
    pub fn append_predictions(&self, mut table: Table, preds: Predictions) -> Result<Table> {
        let columns = &self.columns.predict;
        table.set_column(&columns.predicted, preds.predicted)?;
        table.set_column(&columns.model_outputs, preds.model_outputs)?;
        if let (Some(column), Some(probs)) = (&columns.pred_probs, preds.pred_probs) {
            table.set_column(column, probs.into_iter().map(Cell::from).collect())?;
        }
        Ok(table)
    }

    /// Train the service on renamed splits
    pub fn train(&mut self, train: Table, dev: Option<Table>) -> Result<()> {
        let (train, dev, _) = self.convert_to_train(train, dev, None)?;
        info!("Training {} on {} rows", self.model.model_name, train.num_rows());
        self.service.train(&train, dev.as_ref())
    }

    /// Predict over `table` and return it with prediction columns
    pub fn predict(&self, table: Table) -> Result<Table> {
        let inputs = self.convert_to_predict(&table)?;
        let preds = self.service.predict(&inputs)?;
        self.append_predictions(table, preds)
    }

    /// Service metrics over a labelled table, after training renames
    pub fn evaluate(&self, table: Table) -> Result<BTreeMap<String, f64>> {
        let table = self.rename_columns(table, &self.columns.train)?;
        self.service.evaluate(&table)
    }

    /// Predict over the test split and write the predictions to
    /// [`Self::pred_path`]. Without test data nothing is written.
    pub fn eval(&mut self, test: Option<Table>) -> Result<Option<PathBuf>> {
        let Some(test) = test else {
            warn!("No test data found");
            return Ok(None);
        };
        let pred_data = self.predict(test)?;
        let path = self.pred_path(None)?;
        self.io.save(&pred_data, &path)?;
        info!("Saved {} predictions to {}", pred_data.num_rows(), path.display());
        self.pred_data = Some(pred_data);
        Ok(Some(path))
    }

    /// Load the model, preferring the local model directory.
    ///
    /// Passing `model_name` switches to that model and re-enables the local
    /// lookup. A local directory that turns out to hold no model falls back to
    /// `model_name_or_path` (or `model_name`).
    pub fn load_model(&mut self, model_name: Option<&str>) -> Result<ModelSource> {
        if let Some(name) = model_name {
            self.model.model_name = name.to_string();
            self.model.ignore_model_path = false;
        }

        let local = self.model_path();
        if local.is_dir() && !self.model.ignore_model_path {
            let source = ModelSource::Local(local);
            match self.service.load(&source) {
                Ok(()) => {
                    info!("Loaded model from {}", source);
                    return Ok(source);
                }
                Err(Error::ModelNotFound { location }) => {
                    warn!("Model {} not found. Trying model_name_or_path instead.", location);
                }
                Err(e) => return Err(e),
            }
        }

        let remote = self
            .model
            .model_name_or_path
            .clone()
            .unwrap_or_else(|| self.model.model_name.clone());
        let source = ModelSource::Remote(remote);
        self.service.load(&source)?;
        info!("Loaded model from {}", source);
        Ok(source)
    }
}
