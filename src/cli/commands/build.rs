//! Build command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::tree::get_path;
use crate::config::{merge, parse_overrides, read_yaml, BuildArgs};
use crate::dataset::builder::{BuildSpec, DatasetBuilder, SplitReport};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Read `path`, pick the dotted `section` and apply `key=value` overrides
pub(super) fn load_build_spec(
    path: &Path,
    section: Option<&str>,
    overrides: &[String],
) -> Result<BuildSpec, String> {
    let tree = read_yaml(path).map_err(|e| format!("Config error: {e}"))?;
    let tree = match section {
        Some(key) => get_path(&tree, key)
            .cloned()
            .ok_or_else(|| format!("Config error: section '{key}' not found in {}", path.display()))?,
        None => tree,
    };
    let tree = if overrides.is_empty() {
        tree
    } else {
        let overrides = parse_overrides(overrides).map_err(|e| format!("Config error: {e}"))?;
        merge(&tree, &overrides)
    };
    BuildSpec::from_value(&tree).map_err(|e| format!("Config error: {e}"))
}

/// One line per split report
pub fn format_report(report: &SplitReport) -> String {
    let rows = report.num_rows.map_or_else(|| "-".to_string(), |n| n.to_string());
    format!(
        "  {:<8} {:<15} rows: {:>8}  {}",
        report.split,
        report.stage.to_string(),
        rows,
        report.output_file.display()
    )
}

pub fn run_build(args: BuildArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Building dataset from: {}", args.config.display()));

    let mut spec = load_build_spec(&args.config, args.section.as_deref(), &args.overrides)?;
    if args.overwrite {
        spec.fetch.overwrite = true;
    }
    if args.stats {
        spec.fetch.calculate_stats = true;
        spec.info.get_or_insert_with(Mapping::new);
    }
    if level == LogLevel::Verbose {
        spec.verbose = true;
    }

    let builder = DatasetBuilder::new(spec).map_err(|e| format!("Validation failed: {e}"))?;
    let reports = builder.build().map_err(|e| format!("Build failed: {e}"))?;

    log(level, LogLevel::Normal, &format!("Built {} split(s):", reports.len()));
    for report in &reports {
        log(level, LogLevel::Normal, &format_report(report));
    }
    if let Some(Value::String(description)) =
        builder.spec().info.as_ref().and_then(|info| info.get("description"))
    {
        log(level, LogLevel::Verbose, &format!("Description: {description}"));
    }
    Ok(())
}
