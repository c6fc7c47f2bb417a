//! Tests for CLI argument parsing

use super::*;
use proptest::prelude::*;
use std::path::PathBuf;

#[test]
fn test_parse_build_command() {
    let cli = parse_args(["tanda", "build", "nsmc.yaml"]).unwrap();
    match cli.command {
        Command::Build(args) => {
            assert_eq!(args.config, PathBuf::from("nsmc.yaml"));
            assert!(args.section.is_none());
            assert!(!args.overwrite);
            assert!(!args.stats);
            assert!(args.overrides.is_empty());
        }
        _ => panic!("Expected Build command"),
    }
}

#[test]
fn test_parse_build_with_overrides() {
    let cli = parse_args([
        "tanda",
        "build",
        "project.yaml",
        "--section",
        "dataset",
        "--overwrite",
        "--stats",
        "--set",
        "fetch.num_workers=4",
        "--set",
        "filetype=jsonl",
    ])
    .unwrap();

    match cli.command {
        Command::Build(args) => {
            assert_eq!(args.section.as_deref(), Some("dataset"));
            assert!(args.overwrite);
            assert!(args.stats);
            assert_eq!(args.overrides, vec!["fetch.num_workers=4", "filetype=jsonl"]);
        }
        _ => panic!("Expected Build command"),
    }
}

#[test]
fn test_parse_validate_command() {
    let cli = parse_args(["tanda", "validate", "nsmc.yaml", "--detailed"]).unwrap();
    match cli.command {
        Command::Validate(args) => {
            assert_eq!(args.config, PathBuf::from("nsmc.yaml"));
            assert!(args.detailed);
        }
        _ => panic!("Expected Validate command"),
    }
}

#[test]
fn test_parse_config_show() {
    let cli = parse_args([
        "tanda",
        "config",
        "show",
        "--group",
        "task=nsmc",
        "--conf-dir",
        "./conf",
        "--batch-num",
        "2",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Command::Config(args) => {
            assert_eq!(args.action, ConfigAction::Show);
            assert_eq!(args.entity.group.as_deref(), Some("task=nsmc"));
            assert_eq!(args.entity.conf_dir, PathBuf::from("./conf"));
            assert_eq!(args.entity.batch_num, Some(2));
            assert_eq!(args.format, OutputFormat::Json);
        }
        _ => panic!("Expected Config command"),
    }
}

#[test]
fn test_parse_config_save_defaults() {
    let cli = parse_args(["tanda", "config", "save", "-c", "exp1.yaml", "-r", "/workspace"]).unwrap();
    match cli.command {
        Command::Config(args) => {
            assert_eq!(args.action, ConfigAction::Save);
            assert_eq!(args.entity.config, Some(PathBuf::from("exp1.yaml")));
            assert_eq!(args.entity.root, Some(PathBuf::from("/workspace")));
            assert_eq!(args.entity.conf_dir, PathBuf::from("conf"));
            assert_eq!(args.format, OutputFormat::Yaml);
            assert!(args.include.is_empty());
        }
        _ => panic!("Expected Config command"),
    }
}

#[test]
fn test_include_conflicts_with_exclude() {
    let result = parse_args([
        "tanda", "config", "save", "--include", "model", "--exclude", "path",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_config_action() {
    assert!(parse_args(["tanda", "config", "delete"]).is_err());
}

#[test]
fn test_global_flags() {
    let cli = parse_args(["tanda", "-v", "build", "nsmc.yaml"]).unwrap();
    assert!(cli.verbose);
    assert!(!cli.quiet);

    let cli = parse_args(["tanda", "build", "nsmc.yaml", "--quiet"]).unwrap();
    assert!(!cli.verbose);
    assert!(cli.quiet);
}

#[test]
fn test_missing_config_file() {
    assert!(parse_args(["tanda", "build"]).is_err());
    assert!(parse_args(["tanda", "unknown"]).is_err());
}

#[test]
fn test_output_format_from_str() {
    assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    assert!("xml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::default(), OutputFormat::Yaml);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_build_command_parses(config in "[a-zA-Z][a-zA-Z0-9_-]{0,20}\\.(yaml|yml)") {
        let cli = parse_args(["tanda", "build", &config]).unwrap();
        match cli.command {
            Command::Build(args) => prop_assert_eq!(args.config.to_str().unwrap(), &config),
            _ => prop_assert!(false, "Expected Build command"),
        }
    }

    #[test]
    fn prop_batch_num_parses(num in 0u32..10_000) {
        let num_str = num.to_string();
        let cli = parse_args(["tanda", "config", "show", "--batch-num", &num_str]).unwrap();
        match cli.command {
            Command::Config(args) => prop_assert_eq!(args.entity.batch_num, Some(num)),
            _ => prop_assert!(false, "Expected Config command"),
        }
    }

    #[test]
    fn prop_output_format_case_insensitive(
        format in prop::sample::select(vec!["text", "TEXT", "json", "Json", "yaml", "YAML"])
    ) {
        prop_assert!(format.parse::<OutputFormat>().is_ok());
    }
}
