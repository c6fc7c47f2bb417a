//! Corpus-level summary written next to the built splits
//!
//! The summary is saved as `info-{name}.yaml` in the dataset directory, which
//! is also where [`crate::dataset::Dataset`] looks for it on load.

use super::table::{cell_text, Table};
use crate::config::{read_yaml, write_yaml};
use crate::error::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Character and word counts of one text column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub num_chars: u64,
    pub num_words: u64,
}

impl TextStats {
    /// Count over every non-null cell of `column`
    #[must_use]
    pub fn of_column(table: &Table, column: &str) -> Self {
        let mut stats = Self::default();
        if let Some(cells) = table.column(column) {
            for cell in cells {
                let text = cell_text(cell);
                stats.num_chars += text.chars().count() as u64;
                stats.num_words += text.split_whitespace().count() as u64;
            }
        }
        stats
    }
}

/// Statistics of one built split
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub name: String,
    pub dataset_name: String,
    pub data_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_file: Option<String>,
    #[serde(default)]
    pub num_examples: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<String, TextStats>,
}

impl SplitStats {
    #[must_use]
    pub fn new(name: &str, dataset_name: &str, data_file: &str) -> Self {
        Self {
            name: name.to_string(),
            dataset_name: dataset_name.to_string(),
            data_file: data_file.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_meta_file(mut self, meta_file: impl Into<String>) -> Self {
        self.meta_file = Some(meta_file.into());
        self
    }
}

/// `info-{name}.yaml` document
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryInfo {
    name: String,
    path: PathBuf,
    fields: Mapping,
    splits: BTreeMap<String, SplitStats>,
    text_columns: Vec<String>,
}

impl SummaryInfo {
    /// Summary for dataset `name` stored in `data_dir`
    pub fn new(name: &str, data_dir: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: info_path(data_dir, name),
            fields: Mapping::new(),
            splits: BTreeMap::new(),
            text_columns: Vec::new(),
        }
    }

    /// Extra top-level fields (description, license, column_info, ...)
    #[must_use]
    pub fn with_fields(mut self, fields: Mapping) -> Self {
        self.fields = fields;
        self
    }

    /// Columns counted in text statistics
    #[must_use]
    pub fn with_text_columns(mut self, columns: Vec<String>) -> Self {
        self.text_columns = columns;
        self
    }

    /// Pick up split statistics from a previous build so splits skipped this
    /// time keep their numbers.
    pub fn load_existing(&mut self) -> Result<()> {
        if !self.path.is_file() {
            return Ok(());
        }
        let saved = read_yaml(&self.path)?;
        if let Some(splits) = saved.get("splits") {
            let splits: BTreeMap<String, SplitStats> = serde_yaml::from_value(splits.clone())?;
            self.splits.extend(splits);
        }
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn splits(&self) -> &BTreeMap<String, SplitStats> {
        &self.splits
    }

    #[must_use]
    pub fn split(&self, name: &str) -> Option<&SplitStats> {
        self.splits.get(name)
    }

    /// Record the file-level facts of a freshly fetched split
    pub fn init_stats(&mut self, stats: SplitStats) {
        self.splits.insert(stats.name.clone(), stats);
    }

    /// Count examples and text statistics of `table` for `split`
    pub fn calculate_stats(&mut self, split: &str, table: &Table) {
        let entry = self
            .splits
            .entry(split.to_string())
            .or_insert_with(|| SplitStats::new(split, &self.name, ""));
        entry.num_examples = table.num_rows() as u64;
        entry.text = self
            .text_columns
            .iter()
            .filter(|c| table.has_column(c))
            .map(|c| (c.clone(), TextStats::of_column(table, c)))
            .collect();
    }

    /// Total examples over all recorded splits
    #[must_use]
    pub fn num_examples(&self) -> u64 {
        self.splits.values().map(|s| s.num_examples).sum()
    }

    /// Write the document with a fresh timestamp
    pub fn save(&self) -> Result<PathBuf> {
        let mut doc = self.fields.clone();
        doc.insert("name".into(), self.name.as_str().into());
        doc.insert("num_examples".into(), self.num_examples().into());
        doc.insert("splits".into(), serde_yaml::to_value(&self.splits)?);
        doc.insert(
            "info_updated".into(),
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string().into(),
        );
        write_yaml(&self.path, &Value::Mapping(doc))?;
        info!("Saved corpus info to {}", self.path.display());
        Ok(self.path.clone())
    }
}

/// `data_dir/info-{name}.yaml`
#[must_use]
pub fn info_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("info-{name}.yaml"))
}
