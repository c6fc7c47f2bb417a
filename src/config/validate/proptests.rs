//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_build_spec;
use crate::dataset::builder::{BuildSpec, DataSources, FetchSpec};
use crate::dataset::pipeline::StepRegistry;
use proptest::prelude::*;
use std::path::PathBuf;

fn arb_valid_spec() -> impl Strategy<Value = BuildSpec> {
    (
        "[a-z][a-z0-9_]{0,12}",                                      // name
        prop::sample::select(vec!["csv", "tsv", "jsonl", "json"]),   // filetype
        prop::collection::vec("[a-z]{1,8}\\.csv", 1..4),             // sources
        any::<bool>(),                                               // overwrite
    )
        .prop_map(|(name, filetype, sources, overwrite)| BuildSpec {
            name,
            data_dir: PathBuf::from("/data/out"),
            filetype: filetype.to_string(),
            column_info: None,
            fetch: FetchSpec {
                data_sources: Some(DataSources::Many(sources)),
                overwrite,
                ..Default::default()
            },
            info: None,
            pipeline: Default::default(),
            verbose: false,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_spec_passes(spec in arb_valid_spec()) {
        prop_assert!(validate_build_spec(&spec, &StepRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn prop_unregistered_step_rejected(spec in arb_valid_spec(), step in "zz_[a-z]{1,8}") {
        let mut spec = spec;
        spec.pipeline.insert(
            "_preprocess_".into(),
            serde_yaml::Value::Sequence(vec![step.clone().into()]),
        );
        prop_assert_eq!(
            validate_build_spec(&spec, &StepRegistry::with_builtins()),
            Err(ValidationError::UnknownStep(step))
        );
    }

    #[test]
    fn prop_stats_without_info_rejected(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.fetch.calculate_stats = true;
        prop_assert_eq!(
            validate_build_spec(&spec, &StepRegistry::with_builtins()),
            Err(ValidationError::StatsWithoutInfo)
        );
    }
}
