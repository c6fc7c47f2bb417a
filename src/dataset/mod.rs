//! Datasets: tables, splits, build pipeline and corpus summaries
//!
//! - [`Table`]: in-memory rows with named columns
//! - [`TableIo`]: reading and writing table files
//! - [`pipeline`]: named, ordered table transforms
//! - [`builder`]: fetch, transform, persist and count one dataset
//! - [`Dataset`]: the consumer view of a built dataset

pub mod builder;
mod column;
mod corpus;
pub mod io;
pub mod pipeline;
mod split;
mod stats;
mod table;


pub use column::{ColumnInfo, ColumnKeys, OneOrMany};
pub use corpus::Dataset;
pub use io::{Dtype, DtypeHints, FileFormat, FileTableIo, TableIo};
pub use split::DatasetSplit;
pub use stats::{info_path, SplitStats, SummaryInfo, TextStats};
pub use table::{cell_text, Table};
