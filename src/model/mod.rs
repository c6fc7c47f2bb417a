//! Model training and prediction wiring
//!
//! Models themselves live behind [`ModelService`]. [`TaskRunner`] owns a
//! [`crate::batch::BatchEntity`] and handles the column plumbing around the
//! service: renaming for training, extracting prediction inputs, appending
//! predictions and writing them into the batch directory.

mod runner;
mod service;

#[cfg(test)]
mod tests;

pub use runner::{ColumnMapping, ModelSettings, PredictColumns, TaskRunner};
pub use service::{ModelService, ModelSource, Predictions};
