//! External model service seam

use crate::dataset::Table;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a model is loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelSource {
    /// Directory of a model trained or saved by a previous run
    Local(PathBuf),
    /// Identifier resolved by the service (hub name, URL, ...)
    Remote(String),
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(name) => f.write_str(name),
        }
    }
}

/// Output of one prediction call, one entry per input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub predicted: Vec<Cell>,
    pub model_outputs: Vec<Cell>,
    pub pred_probs: Option<Vec<f64>>,
}

impl Predictions {
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// Trains, loads and runs a model.
///
/// Implementations wrap an external framework; tables arrive with columns
/// already renamed to the names the service expects.
pub trait ModelService {
    /// Load weights from `source`.
    ///
    /// Return [`crate::Error::ModelNotFound`] when `source` holds no model so
    /// callers can fall back to another source.
    fn load(&mut self, source: &ModelSource) -> Result<()>;

    /// Train on `train`, evaluating on `dev` when given
    fn train(&mut self, train: &Table, dev: Option<&Table>) -> Result<()>;

    /// Predict one result per input text
    fn predict(&self, inputs: &[String]) -> Result<Predictions>;

    /// Named metrics over a labelled table
    fn evaluate(&self, data: &Table) -> Result<BTreeMap<String, f64>>;
}
