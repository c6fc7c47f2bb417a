//! Builtin pipeline steps

use super::step::{PipelineStep, StepContext};
use crate::dataset::column::ColumnInfo;
use crate::dataset::table::Table;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Cell;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

fn parse_args<T: DeserializeOwned>(step: &str, args: &Value) -> Result<T> {
    serde_yaml::from_value(args.clone()).map_err(|e| Error::StepFailed {
        step: step.to_string(),
        message: format!("invalid arguments: {e}"),
    })
}

fn default_num_samples() -> usize {
    5
}

fn default_sample_filetype() -> String {
    "csv".to_string()
}

/// Write id and meta columns to a side file and drop the meta columns
#[derive(Debug, Clone, Copy)]
pub struct SaveMetadata;

#[derive(Debug, Deserialize)]
struct SaveMetadataArgs {
    filepath: PathBuf,
    #[serde(default)]
    column_info: ColumnInfo,
    #[serde(default)]
    split_name: Option<String>,
}

impl PipelineStep for SaveMetadata {
    fn name(&self) -> &str {
        "save_metadata"
    }

    fn apply(&self, table: Table, args: &Value, ctx: &StepContext<'_>) -> Result<Table> {
        let args: SaveMetadataArgs = parse_args(self.name(), args)?;
        let meta = args.column_info.meta_columns();
        if meta.is_empty() {
            warn!("No meta columns declared, nothing to save");
            return Ok(table);
        }
        let mut keep = args.column_info.id_keys();
        keep.extend(meta.iter().cloned());
        let split = args.split_name.as_deref().or(ctx.split).unwrap_or("-");
        info!("Saving metadata of split '{}' to {}", split, args.filepath.display());
        ctx.io.save(&table.select(&keep), &args.filepath)?;

        let ids = args.column_info.id_keys();
        let to_drop: Vec<String> = meta.into_iter().filter(|c| !ids.contains(c)).collect();
        Ok(table.drop_columns(&to_drop))
    }
}

/// Export the first rows for a quick look
#[derive(Debug, Clone, Copy)]
pub struct SaveSamples;

#[derive(Debug, Deserialize)]
struct SaveSamplesArgs {
    sample_file_prefix: String,
    #[serde(default = "default_num_samples")]
    num_samples: usize,
    #[serde(default = "default_sample_filetype")]
    filetype: String,
}

impl PipelineStep for SaveSamples {
    fn name(&self) -> &str {
        "save_samples"
    }

    fn apply(&self, table: Table, args: &Value, ctx: &StepContext<'_>) -> Result<Table> {
        let args: SaveSamplesArgs = parse_args(self.name(), args)?;
        let path = PathBuf::from(format!(
            "{}{}.{}",
            args.sample_file_prefix,
            args.num_samples,
            args.filetype.trim_start_matches('.')
        ));
        info!("Saving {} samples to {}", args.num_samples, path.display());
        ctx.io.save(&table.head(args.num_samples), &path)?;
        Ok(table)
    }
}

/// Persist the table, optionally restricted to `columns_to_keep`
#[derive(Debug, Clone, Copy)]
pub struct SaveDataframe;

#[derive(Debug, Deserialize)]
struct SaveDataframeArgs {
    filepath: PathBuf,
    #[serde(default)]
    columns_to_keep: Option<Vec<String>>,
}

impl PipelineStep for SaveDataframe {
    fn name(&self) -> &str {
        "save_dataframe"
    }

    fn apply(&self, table: Table, args: &Value, ctx: &StepContext<'_>) -> Result<Table> {
        let args: SaveDataframeArgs = parse_args(self.name(), args)?;
        let table = match args.columns_to_keep.filter(|c| !c.is_empty()) {
            Some(columns) => table.select(&columns),
            None => table,
        };
        info!("Saving {} rows to {}", table.num_rows(), args.filepath.display());
        ctx.io.save(&table, &args.filepath)?;
        Ok(table)
    }
}

/// Keep only the listed columns
#[derive(Debug, Clone, Copy)]
pub struct FilterColumns;

#[derive(Debug, Deserialize)]
struct FilterColumnsArgs {
    columns: Vec<String>,
}

impl PipelineStep for FilterColumns {
    fn name(&self) -> &str {
        "filter_columns"
    }

    fn apply(&self, table: Table, args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        let args: FilterColumnsArgs = parse_args(self.name(), args)?;
        Ok(table.select(&args.columns))
    }
}

/// Rename columns `old -> new`
#[derive(Debug, Clone, Copy)]
pub struct RenameColumns;

#[derive(Debug, Deserialize)]
struct RenameColumnsArgs {
    new_names: BTreeMap<String, String>,
}

impl PipelineStep for RenameColumns {
    fn name(&self) -> &str {
        "rename_columns"
    }

    fn apply(&self, mut table: Table, args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        let args: RenameColumnsArgs = parse_args(self.name(), args)?;
        table.rename(&args.new_names)?;
        Ok(table)
    }
}

/// Drop rows repeating an earlier row on `subset` (all columns when empty)
#[derive(Debug, Clone, Copy)]
pub struct DropDuplicates;

#[derive(Debug, Default, Deserialize)]
struct SubsetArgs {
    #[serde(default, alias = "columns")]
    subset: Vec<String>,
}

impl PipelineStep for DropDuplicates {
    fn name(&self) -> &str {
        "drop_duplicates"
    }

    fn apply(&self, mut table: Table, args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        let args: SubsetArgs = parse_args(self.name(), args)?;
        let before = table.num_rows();
        table.drop_duplicates(&args.subset);
        info!("Dropped {} duplicate rows", before - table.num_rows());
        Ok(table)
    }
}

/// Drop rows with a null or blank value in `columns` (all columns when empty)
#[derive(Debug, Clone, Copy)]
pub struct RemoveEmpty;

fn is_blank(cell: &Cell) -> bool {
    match cell {
        Cell::Null => true,
        Cell::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl PipelineStep for RemoveEmpty {
    fn name(&self) -> &str {
        "remove_empty"
    }

    fn apply(&self, mut table: Table, args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        let args: SubsetArgs = parse_args(self.name(), args)?;
        let before = table.num_rows();
        table.retain_rows(|columns, row| {
            columns
                .iter()
                .zip(row)
                .filter(|(c, _)| args.subset.is_empty() || args.subset.contains(c))
                .all(|(_, cell)| !is_blank(cell))
        });
        info!("Removed {} rows with empty values", before - table.num_rows());
        Ok(table)
    }
}

/// Collapse whitespace runs and trim text cells in `columns` (all when empty)
#[derive(Debug, Clone, Copy)]
pub struct NormalizeWhitespace;

impl PipelineStep for NormalizeWhitespace {
    fn name(&self) -> &str {
        "normalize_whitespace"
    }

    fn apply(&self, mut table: Table, args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        let args: SubsetArgs = parse_args(self.name(), args)?;
        let columns = if args.subset.is_empty() { table.columns().to_vec() } else { args.subset };
        for column in &columns {
            table.map_column(column, |cell| match cell {
                Cell::String(s) => Cell::String(s.split_whitespace().collect::<Vec<_>>().join(" ")),
                other => other.clone(),
            });
        }
        Ok(table)
    }
}
