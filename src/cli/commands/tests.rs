//! CLI command tests

use super::*;
use crate::cli::LogLevel;
use crate::config::{
    parse_args, read_yaml, tree, BuildArgs, ConfigAction, ConfigArgs, EntityArgs, OutputFormat,
    ValidateArgs,
};
use crate::dataset::builder::{BuildStage, SplitReport};
use crate::dataset::{FileTableIo, Table, TableIo};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a raw source file and a build config pointing at it
fn create_build_config(dir: &Path) -> PathBuf {
    let raw = Table::from_rows(
        ["id", "document", "label"],
        vec![
            vec![json!(1), json!("good movie"), json!(1)],
            vec![json!(2), json!("bad movie"), json!(0)],
        ],
    )
    .unwrap();
    FileTableIo.save(&raw, &dir.join("raw/train.csv")).unwrap();

    let config = format!(
        r"
dataset:
  name: nsmc
  data_dir: {out}
  column_info:
    keys:
      id: id
      text: document
    data:
      id: int
      document: str
      label: int
  fetch:
    data_dir: {raw}
    data_sources:
      train: train.csv
",
        out = dir.join("out").display(),
        raw = dir.join("raw").display(),
    );
    let path = dir.join("project.yaml");
    std::fs::write(&path, config).unwrap();
    path
}

fn build_args(config: PathBuf) -> BuildArgs {
    BuildArgs {
        config,
        section: Some("dataset".into()),
        overwrite: false,
        stats: false,
        overrides: Vec::new(),
    }
}

fn entity_args(root: &Path) -> EntityArgs {
    EntityArgs {
        root: Some(root.to_path_buf()),
        batch_name: Some("exp1".into()),
        ..EntityArgs::default()
    }
}

#[test]
fn test_run_build_writes_split() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    build::run_build(build_args(config), LogLevel::Quiet).unwrap();
    assert!(tmp.path().join("out/nsmc-train.csv").is_file());
}

#[test]
fn test_run_build_with_stats_writes_info() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    let args = BuildArgs { stats: true, ..build_args(config) };
    build::run_build(args, LogLevel::Quiet).unwrap();

    let info = read_yaml(&tmp.path().join("out/info-nsmc.yaml")).unwrap();
    assert_eq!(info["num_examples"].as_u64(), Some(2));
}

#[test]
fn test_run_build_applies_overrides() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    let args = BuildArgs { overrides: vec!["filetype=jsonl".into()], ..build_args(config) };
    build::run_build(args, LogLevel::Quiet).unwrap();
    assert!(tmp.path().join("out/nsmc-train.jsonl").is_file());
}

#[test]
fn test_run_build_missing_section() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    let args = BuildArgs { section: Some("nope".into()), ..build_args(config) };
    let err = build::run_build(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("section 'nope' not found"));
}

#[test]
fn test_format_report() {
    let mut report = SplitReport::new("train", PathBuf::from("/out/nsmc-train.csv"));
    report.advance(BuildStage::Persisted);
    report.num_rows = Some(12);
    let line = build::format_report(&report);
    assert!(line.contains("train"));
    assert!(line.contains("persisted"));
    assert!(line.contains("12"));
}

#[test]
fn test_run_validate() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    let args = ValidateArgs { config: config.clone(), section: Some("dataset".into()), detailed: true };
    validate::run_validate(args, LogLevel::Quiet).unwrap();

    let args = ValidateArgs { config, section: None, detailed: false };
    let err = validate::run_validate(args, LogLevel::Quiet).unwrap_err();
    assert!(err.starts_with("Config error"));
}

#[test]
fn test_run_validate_rejects_unknown_step() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.yaml");
    std::fs::write(&path, "name: x\ndata_dir: out\nfetch:\n  data_sources: a.csv\npipeline:\n  _transform_: [tokenize]\n").unwrap();
    let args = ValidateArgs { config: path, section: None, detailed: false };
    let err = validate::run_validate(args, LogLevel::Quiet).unwrap_err();
    assert!(err.starts_with("Validation failed"));
}

#[test]
fn test_sources_info() {
    let spec: crate::dataset::builder::BuildSpec = serde_yaml::from_str(
        "name: x\ndata_dir: out\nfetch:\n  data_sources:\n    train: [a.csv, b.csv]\n    test: null\n",
    )
    .unwrap();
    let info = validate::format_sources_info(&spec).unwrap();
    assert!(info.contains("train: a.csv, b.csv"));
    assert!(info.contains("test: (skipped)"));
}

#[test]
fn test_config_save_then_show() {
    let tmp = TempDir::new().unwrap();
    let args = ConfigArgs {
        action: ConfigAction::Save,
        entity: entity_args(tmp.path()),
        format: OutputFormat::Yaml,
        include: Vec::new(),
        exclude: Vec::new(),
    };
    config::run_config(args.clone(), LogLevel::Quiet).unwrap();

    let config_dir = tmp.path().join("outputs/exp1/configs");
    assert!(config_dir.join("exp1(0)_config.yaml").is_file());
    assert!(config_dir.join("exp1(0)_config.json").is_file());

    let mut show = args;
    show.action = ConfigAction::Show;
    show.entity.batch_num = Some(0);
    config::run_config(show, LogLevel::Quiet).unwrap();
}

#[test]
fn test_entity_from_args_applies_overrides() {
    let tmp = TempDir::new().unwrap();
    let mut args = entity_args(tmp.path());
    args.overrides = vec!["model.model_name=kobert".into()];
    let entity = config::entity_from_args(&args).unwrap();
    assert_eq!(entity.batch_name(), "exp1");
    assert_eq!(tree::get_str(entity.config(), "model.model_name"), Some("kobert"));
}

#[test]
fn test_entity_from_group() {
    let tmp = TempDir::new().unwrap();
    let conf = tmp.path().join("conf");
    std::fs::create_dir_all(conf.join("task")).unwrap();
    std::fs::write(conf.join("task/nsmc.yaml"), "name: nsmc-task\nmodel:\n  model_name: bert\n").unwrap();

    let args = EntityArgs {
        group: Some("task=nsmc".into()),
        conf_dir: conf,
        root: Some(tmp.path().to_path_buf()),
        ..EntityArgs::default()
    };
    let entity = config::entity_from_args(&args).unwrap();
    assert_eq!(entity.name(), "nsmc-task");
    assert_eq!(entity.config_group(), Some("task=nsmc"));
}

#[test]
fn test_entity_requires_name() {
    let tmp = TempDir::new().unwrap();
    let args = EntityArgs { root: Some(tmp.path().to_path_buf()), ..EntityArgs::default() };
    assert!(config::entity_from_args(&args).unwrap_err().starts_with("Config error"));
}

#[test]
fn test_render_formats() {
    let tree: serde_yaml::Value = serde_yaml::from_str("name: exp1\nbatch:\n  seed: 42\n").unwrap();
    assert!(config::render(&tree, OutputFormat::Yaml).unwrap().contains("seed: 42"));
    assert!(config::render(&tree, OutputFormat::Json).unwrap().contains("\"seed\": 42"));
    let text = config::render(&tree, OutputFormat::Text).unwrap();
    assert!(text.contains("name = exp1"));
}

#[test]
fn test_run_command_dispatch() {
    let tmp = TempDir::new().unwrap();
    let config = create_build_config(tmp.path());
    let cli = parse_args([
        "tanda",
        "-q",
        "validate",
        config.to_str().unwrap(),
        "--section",
        "dataset",
    ])
    .unwrap();
    assert!(run_command(cli).is_ok());
}
