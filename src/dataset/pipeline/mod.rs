//! Table pipelines
//!
//! A pipeline is a list of step names plus one argument bag per step:
//!
//! ```yaml
//! pipeline:
//!   _transform_: [save_metadata]
//!   _preprocess_: [normalize_whitespace, remove_empty, save_dataframe]
//!   remove_empty:
//!     columns: [text]
//! ```
//!
//! Steps run strictly in list order through [`apply_pipeline`].

mod step;
mod steps;

#[cfg(test)]
mod tests;

pub use step::{apply_pipeline, PipelineStep, StepContext, StepRegistry};
pub use steps::{
    DropDuplicates, FilterColumns, NormalizeWhitespace, RemoveEmpty, RenameColumns, SaveDataframe,
    SaveMetadata, SaveSamples,
};
