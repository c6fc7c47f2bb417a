//! In-memory tabular data
//!
//! A [`Table`] is a list of named columns and row-major cells. Cells are
//! `serde_json::Value`s so CSV, JSON and JSON-lines files round-trip without a
//! schema; a missing value is `Null`.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Row-major table with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    /// Table from columns and rows; every row must match the column count
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::ConfigError(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Names from `required` that this table lacks
    #[must_use]
    pub fn missing_columns<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        required.into_iter().filter(|c| !self.has_column(c)).cloned().collect()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at `(row, column)`
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Keep only `columns` that exist, in the given order. Repeated names are
    /// kept once.
    #[must_use]
    pub fn select(&self, columns: &[String]) -> Self {
        let mut picked: Vec<(usize, &String)> = Vec::new();
        for column in columns {
            if let Some(idx) = self.column_index(column) {
                if !picked.iter().any(|(i, _)| *i == idx) {
                    picked.push((idx, column));
                }
            }
        }
        Self {
            columns: picked.iter().map(|(_, c)| (*c).clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(i, _)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Remove `columns`, ignoring names that do not exist
    #[must_use]
    pub fn drop_columns(&self, columns: &[String]) -> Self {
        let keep: Vec<String> =
            self.columns.iter().filter(|c| !columns.contains(c)).cloned().collect();
        self.select(&keep)
    }

    /// Rename columns by `old -> new`.
    ///
    /// Fails without touching the table when two columns would end up with
    /// the same name.
    pub fn rename(&mut self, renames: &BTreeMap<String, String>) -> Result<()> {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| renames.get(c.as_str()).unwrap_or(c).clone())
            .collect();
        if let Some((i, name)) =
            renamed.iter().enumerate().find(|(i, name)| renamed[..*i].contains(*name))
        {
            return Err(Error::ConfigError(format!(
                "renaming column '{}' to '{name}' duplicates an existing column",
                self.columns[i]
            )));
        }
        self.columns = renamed;
        Ok(())
    }

    /// Add a column, or replace its values when it exists
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::ConfigError(format!(
                "column '{name}' has {} values but table has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Keep rows for which `keep` returns true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String], &[Value]) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|row| keep(columns, row));
    }

    /// Apply `f` to every cell of `column`
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Drop rows whose values in `subset` (all columns when empty) repeat an
    /// earlier row. First occurrence wins.
    pub fn drop_duplicates(&mut self, subset: &[String]) {
        let idx: Vec<usize> = if subset.is_empty() {
            (0..self.columns.len()).collect()
        } else {
            subset.iter().filter_map(|c| self.column_index(c)).collect()
        };
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<String> = idx.iter().map(|i| row[*i].to_string()).collect();
            seen.insert(key)
        });
    }

    /// First `n` rows
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        Self { columns: self.columns.clone(), rows: self.rows.iter().take(n).cloned().collect() }
    }

    /// Stack tables vertically. Columns are the union in first-seen order;
    /// cells a table does not have are `Null`.
    #[must_use]
    pub fn concat(tables: Vec<Table>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for row in table.rows {
                rows.push(
                    positions
                        .iter()
                        .map(|p| p.map_or(Value::Null, |i| row[i].clone()))
                        .collect(),
                );
            }
        }
        Self { columns, rows }
    }

    /// Rows as JSON objects keyed by column name
    pub fn records(&self) -> impl Iterator<Item = serde_json::Map<String, Value>> + '_ {
        self.rows.iter().map(|row| {
            self.columns.iter().cloned().zip(row.iter().cloned()).collect()
        })
    }

    /// Build a table from JSON objects. Columns are collected in first-seen
    /// order; absent keys become `Null`.
    pub fn from_records(records: Vec<serde_json::Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .into_iter()
            .map(|mut record| {
                columns.iter().map(|c| record.remove(c).unwrap_or(Value::Null)).collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Error for a table loaded from `path` lacking `required` columns
    pub(crate) fn require_columns(&self, path: impl Into<PathBuf>, required: &[String]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns { path: path.into(), missing })
        }
    }
}

/// Text form of a cell: strings verbatim, `Null` empty, others as JSON
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
