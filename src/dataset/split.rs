//! One named partition of a dataset

use super::column::ColumnInfo;
use super::io::TableIo;
use super::table::Table;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named split backed by a table file, read at most once
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    name: String,
    path: PathBuf,
    table: Option<Table>,
}

impl DatasetSplit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into(), table: None }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Loaded table, if any
    #[must_use]
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Load the file and check the declared id and data columns
    pub fn load(&mut self, io: &dyn TableIo, columns: &ColumnInfo) -> Result<&Table> {
        self.load_with(io, columns, Ok)
    }

    /// Load the file, check its columns, then pass it through `transform`.
    ///
    /// A second call returns the cached table without touching the file.
    pub fn load_with<F>(&mut self, io: &dyn TableIo, columns: &ColumnInfo, transform: F) -> Result<&Table>
    where
        F: FnOnce(Table) -> Result<Table>,
    {
        let table = match self.table.take() {
            Some(table) => table,
            None => {
                debug!("Loading split '{}' from {}", self.name, self.path.display());
                let table = io.load(&self.path, &columns.dtype_hints())?;
                table.require_columns(&self.path, &columns.required_columns())?;
                transform(table)?
            }
        };
        Ok(self.table.insert(table))
    }

    /// Take the table out, leaving the split unloaded
    pub fn take(&mut self) -> Option<Table> {
        self.table.take()
    }
}
