//! CLI value enums

/// Output format of `config show`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    /// Flattened `key = value` lines
    Text,
    Json,
    #[default]
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json, yaml")),
        }
    }
}

/// What `config` does with the composed snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the (optionally reloaded) configuration
    Show,
    /// Persist the snapshot and flattened settings into the batch directory
    Save,
}

impl std::str::FromStr for ConfigAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "show" => Ok(ConfigAction::Show),
            "save" => Ok(ConfigAction::Save),
            _ => Err(format!("Unknown config action: {s}. Valid actions: show, save")),
        }
    }
}
