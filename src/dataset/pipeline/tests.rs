//! Unit tests for pipeline steps

use super::*;
use crate::dataset::io::{DtypeHints, FileTableIo, TableIo};
use crate::dataset::table::Table;
use crate::error::{Error, Result};
use serde_json::json;
use serde_yaml::{Mapping, Value};
use tempfile::TempDir;

fn sample() -> Table {
    Table::from_rows(
        ["id", "text", "source"],
        vec![
            vec![json!(1), json!("  hello   world "), json!("a")],
            vec![json!(2), json!("hello world"), json!("b")],
            vec![json!(3), json!(""), json!("c")],
            vec![json!(1), json!("  hello   world "), json!("a")],
        ],
    )
    .unwrap()
}

fn args(text: &str) -> Mapping {
    serde_yaml::from_str(text).unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn run(table: Table, steps: &[&str], step_args: &Mapping) -> Result<Table> {
    let io = FileTableIo;
    let ctx = StepContext::new(&io).with_split("train");
    apply_pipeline(table, &names(steps), step_args, &StepRegistry::with_builtins(), &ctx)
}

/// Appends its tag to a marker column so the order of application is visible
struct Tag(&'static str);

impl PipelineStep for Tag {
    fn name(&self) -> &str {
        self.0
    }

    fn apply(&self, mut table: Table, _args: &Value, _ctx: &StepContext<'_>) -> Result<Table> {
        if !table.has_column("trace") {
            let empty = vec![json!(""); table.num_rows()];
            table.set_column("trace", empty)?;
        }
        table.map_column("trace", |cell| json!(format!("{}{}", cell.as_str().unwrap_or(""), self.0)));
        Ok(table)
    }
}

#[test]
fn test_builtins_registered() {
    let registry = StepRegistry::with_builtins();
    for name in [
        "save_metadata",
        "save_samples",
        "save_dataframe",
        "filter_columns",
        "rename_columns",
        "drop_duplicates",
        "remove_empty",
        "normalize_whitespace",
    ] {
        assert!(registry.contains(name), "missing {name}");
    }
    assert!(!StepRegistry::empty().contains("save_dataframe"));
}

#[test]
fn test_steps_run_in_declared_order() {
    let mut registry = StepRegistry::empty();
    registry.register(Tag("a"));
    registry.register(Tag("b"));
    registry.register(Tag("c"));

    let io = FileTableIo;
    let ctx = StepContext::new(&io);
    let out = apply_pipeline(sample(), &names(&["c", "a", "b"]), &Mapping::new(), &registry, &ctx)
        .unwrap();
    assert_eq!(out.get(0, "trace"), Some(&json!("cab")));
}

#[test]
fn test_unknown_step_fails_before_running() {
    let err = run(sample(), &["drop_duplicates", "nope"], &Mapping::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownStep(ref name) if name == "nope"));
}

#[test]
fn test_empty_pipeline_is_identity() {
    assert_eq!(run(sample(), &[], &Mapping::new()).unwrap(), sample());
}

#[test]
fn test_pipeline_is_deterministic() {
    let step_args = args("remove_empty:\n  columns: [text]\n");
    let steps = ["normalize_whitespace", "drop_duplicates", "remove_empty"];
    let first = run(sample(), &steps, &step_args).unwrap();
    let second = run(sample(), &steps, &step_args).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_normalize_then_dedupe() {
    let out = run(
        sample(),
        &["normalize_whitespace", "drop_duplicates"],
        &args("drop_duplicates:\n  subset: [text]\n"),
    )
    .unwrap();
    assert_eq!(out.num_rows(), 2);
    assert_eq!(out.get(0, "text"), Some(&json!("hello world")));
}

#[test]
fn test_remove_empty_on_subset() {
    let out = run(sample(), &["remove_empty"], &args("remove_empty:\n  columns: [text]\n")).unwrap();
    assert_eq!(out.num_rows(), 3);

    let out = run(sample(), &["remove_empty"], &args("remove_empty:\n  columns: [source]\n"))
        .unwrap();
    assert_eq!(out.num_rows(), 4);
}

#[test]
fn test_filter_and_rename() {
    let out = run(
        sample(),
        &["filter_columns", "rename_columns"],
        &args("filter_columns:\n  columns: [text, id]\nrename_columns:\n  new_names:\n    text: sentence\n"),
    )
    .unwrap();
    assert_eq!(out.columns(), ["sentence".to_string(), "id".to_string()]);
}

#[test]
fn test_filter_columns_requires_args() {
    let err = run(sample(), &["filter_columns"], &Mapping::new()).unwrap_err();
    assert!(matches!(err, Error::StepFailed { ref step, .. } if step == "filter_columns"));
}

#[test]
fn test_save_dataframe_keeps_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out/nsmc-train.csv");
    let step_args = args(&format!(
        "save_dataframe:\n  filepath: {}\n  columns_to_keep: [id, text]\n",
        path.display()
    ));
    let out = run(sample(), &["save_dataframe"], &step_args).unwrap();
    assert_eq!(out.columns(), ["id".to_string(), "text".to_string()]);

    let saved = FileTableIo.load(&path, &DtypeHints::new()).unwrap();
    assert_eq!(saved.columns(), out.columns());
    assert_eq!(saved.num_rows(), 4);
}

#[test]
fn test_save_metadata_splits_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("meta-nsmc-train.csv");
    let step_args = args(&format!(
        "save_metadata:\n  filepath: {}\n  column_info:\n    keys:\n      id: id\n    data:\n      text: str\n    meta:\n      source: str\n",
        path.display()
    ));
    let out = run(sample(), &["save_metadata"], &step_args).unwrap();
    assert_eq!(out.columns(), ["id".to_string(), "text".to_string()]);

    let meta = FileTableIo.load(&path, &DtypeHints::new()).unwrap();
    assert_eq!(meta.columns(), ["id".to_string(), "source".to_string()]);
}

#[test]
fn test_save_samples_writes_head() {
    let tmp = TempDir::new().unwrap();
    let prefix = format!("{}/sample-nsmc-train-", tmp.path().display());
    let step_args = args(&format!(
        "save_samples:\n  sample_file_prefix: {prefix}\n  num_samples: 2\n"
    ));
    let out = run(sample(), &["save_samples"], &step_args).unwrap();
    assert_eq!(out.num_rows(), 4);

    let saved = FileTableIo
        .load(&tmp.path().join("sample-nsmc-train-2.csv"), &DtypeHints::new())
        .unwrap();
    assert_eq!(saved.num_rows(), 2);
}
