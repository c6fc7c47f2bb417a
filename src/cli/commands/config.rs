//! Config command implementation

use crate::batch::{BatchEntity, EntityContext};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::tree::{self, set_path};
use crate::config::{
    flatten_settings, merge, parse_overrides, read_yaml, ConfigAction, ConfigArgs, EntityArgs,
    KeySelection, OutputFormat, YamlGroupComposer,
};
use serde_yaml::Value;

/// Compose the entity described by the command line
pub fn entity_from_args(args: &EntityArgs) -> Result<BatchEntity, String> {
    let mut tree = match &args.config {
        Some(path) => read_yaml(path).map_err(|e| format!("Config error: {e}"))?,
        None => tree::empty(),
    };
    if let Some(name) = &args.batch_name {
        set_path(&mut tree, "name", name.as_str().into());
        set_path(&mut tree, "batch.batch_name", name.as_str().into());
    }
    if !args.overrides.is_empty() {
        let overrides = parse_overrides(&args.overrides).map_err(|e| format!("Config error: {e}"))?;
        tree = merge(&tree, &overrides);
    }

    let mut context = EntityContext::new();
    if let Some(root) = &args.root {
        context = context.with_root_dir(root);
    }
    let entity = match &args.group {
        Some(group) => {
            let composer = YamlGroupComposer::new(&args.conf_dir);
            BatchEntity::from_group(&composer, group, &tree, context)
        }
        None => BatchEntity::new(tree, context),
    };
    entity.map_err(|e| format!("Config error: {e}"))
}

/// Render a configuration tree
pub fn render(config: &Value, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        OutputFormat::Text => Ok(flatten_settings(config)
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{key} = {s}"),
                other => format!("{key} = {other}"),
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn run_config(args: ConfigArgs, level: LogLevel) -> Result<(), String> {
    let mut entity = entity_from_args(&args.entity)?;

    match args.action {
        ConfigAction::Show => {
            let config = entity
                .load_config(None, args.entity.batch_num, &tree::empty())
                .map_err(|e| format!("Load failed: {e}"))?;
            let rendered = render(config, args.format)?;
            log(
                level,
                LogLevel::Verbose,
                &format!("# {}({})", entity.batch_name(), entity.batch_num()),
            );
            println!("{rendered}");
        }
        ConfigAction::Save => {
            let selection = if !args.include.is_empty() {
                Some(KeySelection::include(&args.include))
            } else if !args.exclude.is_empty() {
                Some(KeySelection::exclude(&args.exclude))
            } else {
                None
            };
            let filename = entity
                .save_config(selection.as_ref())
                .map_err(|e| format!("Save failed: {e}"))?;
            log(level, LogLevel::Normal, &format!("Saved config: {filename}"));
            if let Ok(settings) = entity.batch().config_jsonpath() {
                log(level, LogLevel::Verbose, &format!("Saved settings: {}", settings.display()));
            }
        }
    }
    Ok(())
}
