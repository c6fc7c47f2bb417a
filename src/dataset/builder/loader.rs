//! Split loaders
//!
//! A loader turns the declared sources of one split into a table. The default
//! [`FileSourceLoader`] reads them from a directory and stacks them.

use crate::dataset::io::{DtypeHints, FileTableIo, TableIo};
use crate::dataset::table::Table;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Produces the raw table of one split
pub trait SplitLoader {
    /// Load `split` from `sources`. `Ok(None)` means nothing could be read.
    fn load(&self, split: &str, sources: &[String]) -> Result<Option<Table>>;
}

/// Loader reading source files relative to a directory
pub struct FileSourceLoader {
    data_dir: PathBuf,
    io: Box<dyn TableIo>,
    hints: DtypeHints,
}

impl std::fmt::Debug for FileSourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSourceLoader").field("data_dir", &self.data_dir).finish_non_exhaustive()
    }
}

impl FileSourceLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), io: Box::new(FileTableIo), hints: DtypeHints::new() }
    }

    #[must_use]
    pub fn with_io(mut self, io: Box<dyn TableIo>) -> Self {
        self.io = io;
        self
    }

    #[must_use]
    pub fn with_dtype_hints(mut self, hints: DtypeHints) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl SplitLoader for FileSourceLoader {
    fn load(&self, split: &str, sources: &[String]) -> Result<Option<Table>> {
        let mut tables = Vec::new();
        for source in sources {
            let path = self.data_dir.join(source);
            if !path.is_file() {
                warn!("Source {} for split '{}' not found", path.display(), split);
                continue;
            }
            let table = self.io.load(&path, &self.hints)?;
            info!("Loaded {} rows from {}", table.num_rows(), path.display());
            tables.push(table);
        }
        if tables.is_empty() {
            return Ok(None);
        }
        Ok(Some(Table::concat(tables)))
    }
}
