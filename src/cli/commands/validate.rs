//! Validate command implementation

use super::build::load_build_spec;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{validate_build_spec, ValidateArgs};
use crate::dataset::builder::BuildSpec;
use crate::dataset::pipeline::StepRegistry;

/// Format the declared splits and their sources
pub fn format_sources_info(spec: &BuildSpec) -> Result<String, String> {
    let splits = spec.splits().map_err(|e| e.to_string())?;
    if splits.is_empty() {
        return Ok("  Sources: none".to_string());
    }
    let mut lines = vec!["  Sources:".to_string()];
    for (split, files) in splits {
        let files = if files.is_empty() { "(skipped)".to_string() } else { files.join(", ") };
        lines.push(format!("    {split}: {files}"));
    }
    Ok(lines.join("\n"))
}

/// Format the pipeline step lists
pub fn format_pipeline_info(spec: &BuildSpec) -> Result<String, String> {
    let transform = spec.transform_steps().map_err(|e| e.to_string())?;
    let process = spec.process_steps().map_err(|e| e.to_string())?;
    Ok(format!("  Transform steps: {transform:?}\n  Process steps: {process:?}"))
}

/// Print detailed configuration summary
pub fn print_detailed_summary(spec: &BuildSpec) -> Result<(), String> {
    println!();
    println!("Configuration Summary:");
    println!("  Name: {}", spec.name);
    println!("  Output dir: {}", spec.data_dir.display());
    println!("  File type: {}", spec.extension());
    println!("{}", format_sources_info(spec)?);
    println!("{}", format_pipeline_info(spec)?);
    println!(
        "  Overwrite: {}  Statistics: {}",
        spec.fetch.overwrite, spec.fetch.calculate_stats
    );
    Ok(())
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let spec = load_build_spec(&args.config, args.section.as_deref(), &[])?;
    validate_build_spec(&spec, &StepRegistry::with_builtins())
        .map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed {
        print_detailed_summary(&spec)?;
    }
    Ok(())
}
