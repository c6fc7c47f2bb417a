//! Batch identity, directory layout and the entity that ties them together
//!
//! A batch is a named, numbered run. Its number is derived from the
//! configuration snapshots already saved under its name, so reruns of the
//! same batch land in `exp1(0)`, `exp1(1)`, ... without any registry.

mod device;
mod entity;
mod paths;
mod version;


pub use device::{DeviceMemory, NoDevice};
pub use entity::{BatchEntity, EntityContext};
pub use paths::{PathSet, PathSettings};
pub use version::{normalize_extension, resolve_seed, BatchSettings, BatchVersion};
