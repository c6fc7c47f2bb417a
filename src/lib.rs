//! Batch-versioned configuration and dataset builds for model training runs.
//!
//! - [`batch`]: batch naming, numbering, seeds and the directory layout
//! - [`config`]: configuration trees, snapshots and their saved versions
//! - [`dataset`]: tabular splits, preprocessing pipelines and the builder
//!   that fetches raw sources into a dataset directory
//! - [`model`]: task runner that feeds splits to a model service
//! - [`cli`]: the `tanda` command-line surface
//!
//! # Example
//!
//! ```no_run
//! use tanda::batch::{BatchEntity, EntityContext};
//!
//! let args = serde_yaml::from_str("name: exp1\nbatch:\n  random_seed: true\n")?;
//! let entity = BatchEntity::new(args, EntityContext::new().with_root_dir("/workspace"))?;
//! let saved = entity.save_config(None)?;
//! println!("{} -> {}", entity.batch().file_prefix(), saved);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;

pub use batch::{BatchEntity, EntityContext};
pub use dataset::builder::DatasetBuilder;
pub use dataset::{Dataset, Table};
pub use error::{Error, Result};
pub use model::{ModelService, TaskRunner};
