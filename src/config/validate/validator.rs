//! Configuration validation logic

use super::error::ValidationError;
use crate::batch::BatchSettings;
use crate::dataset::builder::BuildSpec;
use crate::dataset::io::FileFormat;
use crate::dataset::pipeline::StepRegistry;

/// Validate a dataset build configuration
///
/// Checks:
/// - Name, output directory and sources are present
/// - The output filetype has a reader/writer
/// - Statistics have the sections they are computed from
/// - Every listed pipeline step is registered
pub fn validate_build_spec(spec: &BuildSpec, registry: &StepRegistry) -> Result<(), ValidationError> {
    if spec.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if spec.data_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDataDir);
    }

    if FileFormat::from_extension(spec.extension()).is_err() {
        return Err(ValidationError::UnsupportedFiletype(spec.filetype.clone()));
    }

    let splits = spec.splits().map_err(|e| ValidationError::InvalidSources(e.to_string()))?;
    if splits.iter().all(|(_, files)| files.is_empty()) {
        return Err(ValidationError::NoDataSources);
    }

    if spec.fetch.calculate_stats {
        if spec.info.is_none() {
            return Err(ValidationError::StatsWithoutInfo);
        }
        if spec.column_info.is_none() {
            return Err(ValidationError::StatsWithoutColumnInfo);
        }
    }

    let transform =
        spec.transform_steps().map_err(|e| ValidationError::InvalidPipeline(e.to_string()))?;
    let process =
        spec.process_steps().map_err(|e| ValidationError::InvalidPipeline(e.to_string()))?;
    if let Some(step) = transform.iter().chain(&process).find(|s| !registry.contains(s)) {
        return Err(ValidationError::UnknownStep(step.clone()));
    }

    Ok(())
}

/// Validate a `batch` section
///
/// Snapshot and settings files must not share a suffix: the settings document
/// would overwrite the snapshot it is written next to.
pub fn validate_batch_settings(settings: &BatchSettings) -> Result<(), ValidationError> {
    if settings.batch_name.trim().is_empty() {
        return Err(ValidationError::EmptyBatchName);
    }
    if settings.num_workers == 0 {
        return Err(ValidationError::InvalidNumWorkers(settings.num_workers));
    }
    let suffix = settings.config_yaml.as_str();
    if !(suffix.ends_with(".yaml") || suffix.ends_with(".yml")) {
        return Err(ValidationError::InvalidConfigSuffix(suffix.to_string()));
    }
    if settings.config_json == settings.config_yaml {
        return Err(ValidationError::ConfigSuffixCollision(suffix.to_string()));
    }
    Ok(())
}
