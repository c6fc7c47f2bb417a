//! Table file I/O
//!
//! [`TableIo`] is the seam between datasets and storage. [`FileTableIo`]
//! dispatches on the file extension:
//!
//! | extension | format |
//! |-----------|--------|
//! | `csv`     | comma-separated, header row |
//! | `tsv`     | tab-separated, header row |
//! | `jsonl`   | one JSON object per line |
//! | `json`    | array of JSON objects |

use super::table::{cell_text, Table};
use crate::error::{Error, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Column type used to parse text cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    /// Keep text as-is
    Str,
    Int,
    Float,
    Bool,
    /// Infer numbers and booleans, otherwise text
    Auto,
}

impl Dtype {
    /// Parse a dtype name (`str`, `int64`, `float32`, `bool`, ...)
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.starts_with("str") || name == "object" || name == "text" {
            Self::Str
        } else if name.starts_with("int") || name.starts_with("uint") {
            Self::Int
        } else if name.starts_with("float") || name == "double" {
            Self::Float
        } else if name.starts_with("bool") {
            Self::Bool
        } else {
            Self::Auto
        }
    }

    /// Parse one text cell; empty text is `Null` for every dtype but `Str`
    #[must_use]
    pub fn parse(self, raw: &str) -> Value {
        if raw.is_empty() {
            return if self == Self::Str { Value::String(String::new()) } else { Value::Null };
        }
        let text = || Value::String(raw.to_string());
        match self {
            Self::Str => text(),
            Self::Int => raw.trim().parse::<i64>().map(Value::from).unwrap_or_else(|_| text()),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                .unwrap_or_else(text),
            Self::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => text(),
            },
            Self::Auto => {
                if let Ok(i) = raw.parse::<i64>() {
                    Value::from(i)
                } else if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                    Value::Number(n)
                } else {
                    match raw {
                        "true" | "True" => Value::Bool(true),
                        "false" | "False" => Value::Bool(false),
                        _ => text(),
                    }
                }
            }
        }
    }
}

/// Per-column dtypes applied when reading text formats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DtypeHints {
    hints: BTreeMap<String, Dtype>,
}

impl DtypeHints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the dtype of a column
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, dtype: Dtype) -> Self {
        self.hints.insert(column.into(), dtype);
        self
    }

    /// Build from `column -> dtype name` pairs
    pub fn from_names<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            hints: pairs.into_iter().map(|(c, d)| (c.to_string(), Dtype::from_name(d))).collect(),
        }
    }

    /// Dtype for `column`, `Auto` when unhinted
    #[must_use]
    pub fn get(&self, column: &str) -> Dtype {
        self.hints.get(column).copied().unwrap_or(Dtype::Auto)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

/// Reader and writer of tables
pub trait TableIo {
    /// Read the table at `path`
    fn load(&self, path: &Path, hints: &DtypeHints) -> Result<Table>;

    /// Write `table` to `path`, creating parent directories
    fn save(&self, table: &Table, path: &Path) -> Result<()>;
}

/// File formats keyed by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    JsonLines,
    Json,
}

impl FileFormat {
    /// Format for a bare extension (`"csv"`, `".jsonl"`, ...)
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "json" => Ok(Self::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format for a file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext)
    }
}

/// Extension-dispatching filesystem [`TableIo`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableIo;

impl FileTableIo {
    fn read_delimited(path: &Path, delimiter: u8, hints: &DtypeHints) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let dtypes: Vec<Dtype> = headers.iter().map(|h| hints.get(h)).collect();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record?;
            let row = record.iter().zip(&dtypes).map(|(raw, dtype)| dtype.parse(raw)).collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    fn write_delimited(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
        let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(cell_text))?;
        }
        writer.flush().map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    fn read_json_lines(path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(Table::from_records(records))
    }

    fn write_json_lines(table: &Table, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        for record in table.records() {
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        }
        writer.flush().map_err(|e| Error::io(path, e))
    }
}

impl TableIo for FileTableIo {
    fn load(&self, path: &Path, hints: &DtypeHints) -> Result<Table> {
        debug!("Loading table from {}", path.display());
        match FileFormat::from_path(path)? {
            FileFormat::Csv => Self::read_delimited(path, b',', hints),
            FileFormat::Tsv => Self::read_delimited(path, b'\t', hints),
            FileFormat::JsonLines => Self::read_json_lines(path),
            FileFormat::Json => {
                let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                Ok(Table::from_records(serde_json::from_str(&content)?))
            }
        }
    }

    fn save(&self, table: &Table, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        debug!("Saving {} rows to {}", table.num_rows(), path.display());
        match format {
            FileFormat::Csv => Self::write_delimited(table, path, b','),
            FileFormat::Tsv => Self::write_delimited(table, path, b'\t'),
            FileFormat::JsonLines => Self::write_json_lines(table, path),
            FileFormat::Json => {
                let records: Vec<_> = table.records().collect();
                let json = serde_json::to_string_pretty(&records)?;
                fs::write(path, json).map_err(|e| Error::io(path, e))
            }
        }
    }
}
