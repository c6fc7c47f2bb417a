//! Unit tests for the task runner

use super::*;
use crate::batch::{BatchEntity, EntityContext};
use crate::dataset::{DtypeHints, FileTableIo, Table, TableIo};
use crate::error::{Error, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

/// Labels every input by its length and records what it was given
#[derive(Debug, Default)]
struct FakeService {
    loads: Vec<ModelSource>,
    local_missing: bool,
    trained_on: Vec<String>,
    with_probs: bool,
}

impl ModelService for FakeService {
    fn load(&mut self, source: &ModelSource) -> Result<()> {
        self.loads.push(source.clone());
        match source {
            ModelSource::Local(path) if self.local_missing => {
                Err(Error::ModelNotFound { location: path.display().to_string() })
            }
            _ => Ok(()),
        }
    }

    fn train(&mut self, train: &Table, _dev: Option<&Table>) -> Result<()> {
        self.trained_on = train.columns().to_vec();
        Ok(())
    }

    fn predict(&self, inputs: &[String]) -> Result<Predictions> {
        Ok(Predictions {
            predicted: inputs.iter().map(|t| json!(t.len() % 2)).collect(),
            model_outputs: inputs.iter().map(|t| json!([t.len()])).collect(),
            pred_probs: self.with_probs.then(|| vec![0.9; inputs.len()]),
        })
    }

    fn evaluate(&self, data: &Table) -> Result<BTreeMap<String, f64>> {
        Ok(BTreeMap::from([("rows".to_string(), data.num_rows() as f64)]))
    }
}

fn runner(root: &Path, extra: &str) -> TaskRunner<FakeService> {
    let args = serde_yaml::from_str(&format!(
        "name: exp1\nmodel:\n  model_name: kobert-nsmc\n  model_name_or_path: monologg/kobert\ncolumns:\n  train:\n    text: document\n    labels: label\n    id: null\n  predict:\n    input: document\n{extra}"
    ))
    .unwrap();
    let entity = BatchEntity::new(args, EntityContext::new().with_root_dir(root)).unwrap();
    TaskRunner::new(entity, FakeService::default()).unwrap()
}

fn reviews() -> Table {
    Table::from_rows(
        ["id", "document", "label"],
        vec![
            vec![json!(1), json!("good"), json!(1)],
            vec![json!(2), json!("bad"), json!(0)],
        ],
    )
    .unwrap()
}

#[test]
fn test_requires_model_section() {
    let tmp = TempDir::new().unwrap();
    let entity = BatchEntity::new(
        serde_yaml::from_str("name: exp1\n").unwrap(),
        EntityContext::new().with_root_dir(tmp.path()),
    )
    .unwrap();
    let err = TaskRunner::new(entity, FakeService::default()).err().unwrap();
    assert!(matches!(err, Error::MissingKey { ref key } if key == "model"));
}

#[test]
fn test_rename_for_training() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    let (train, dev, test) = runner.convert_to_train(reviews(), Some(reviews()), None).unwrap();
    assert_eq!(train.columns(), ["id", "text", "labels"].map(String::from));
    assert!(dev.unwrap().has_column("text"));
    assert!(test.is_none());

    runner.train(reviews(), None).unwrap();
    assert_eq!(runner.service().trained_on, ["id", "text", "labels"].map(String::from));
}

#[test]
fn test_rename_skips_absent_columns() {
    let tmp = TempDir::new().unwrap();
    let runner = runner(tmp.path(), "");
    let columns = BTreeMap::from([("labels".to_string(), Some("sentiment".to_string()))]);
    assert_eq!(runner.rename_columns(reviews(), &columns).unwrap(), reviews());
}

#[test]
fn test_rename_onto_kept_column_fails() {
    let tmp = TempDir::new().unwrap();
    let runner = runner(tmp.path(), "");
    let columns = BTreeMap::from([("id".to_string(), Some("label".to_string()))]);
    let err = runner.rename_columns(reviews(), &columns).unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("'label' to 'id'"));
}

#[test]
fn test_predict_appends_columns() {
    let tmp = TempDir::new().unwrap();
    let runner = runner(tmp.path(), "");
    assert_eq!(runner.convert_to_predict(&reviews()).unwrap(), vec!["good", "bad"]);

    let out = runner.predict(reviews()).unwrap();
    assert_eq!(out.get(0, "pred_labels"), Some(&json!(0)));
    assert_eq!(out.get(1, "pred_labels"), Some(&json!(1)));
    assert_eq!(out.get(1, "raw_preds"), Some(&json!([3])));
    assert!(!out.has_column("pred_probs"));
}

#[test]
fn test_pred_probs_column_when_configured() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    runner.service_mut().with_probs = true;
    runner.set_predict_columns(PredictColumns {
        input: "document".into(),
        pred_probs: Some("pred_probs".into()),
        ..PredictColumns::default()
    });
    let out = runner.predict(reviews()).unwrap();
    assert_eq!(out.get(0, "pred_probs"), Some(&json!(0.9)));
}

#[test]
fn test_predict_input_column_missing() {
    let tmp = TempDir::new().unwrap();
    let runner = runner(tmp.path(), "");
    let table = reviews().drop_columns(&["document".into()]);
    assert!(runner.predict(table).unwrap_err().is_config_error());
}

#[test]
fn test_eval_writes_predictions() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "batch:\n  pred_file: preds.csv\n");
    let path = runner.eval(Some(reviews())).unwrap().unwrap();

    assert_eq!(path, tmp.path().join("outputs/exp1/exp1(0)_preds.csv"));
    let saved = FileTableIo.load(&path, &DtypeHints::new()).unwrap();
    assert_eq!(saved.num_rows(), 2);
    assert!(saved.has_column("pred_labels"));
    assert_eq!(runner.pred_data().unwrap().num_rows(), 2);
}

#[test]
fn test_eval_without_test_data() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    assert!(runner.eval(None).unwrap().is_none());
    assert!(runner.pred_data().is_none());
}

#[test]
fn test_evaluate_uses_training_names() {
    let tmp = TempDir::new().unwrap();
    let runner = runner(tmp.path(), "");
    let metrics = runner.evaluate(reviews()).unwrap();
    assert_eq!(metrics["rows"], 2.0);
}

#[test]
fn test_load_model_prefers_local() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    std::fs::create_dir_all(runner.model_path()).unwrap();
    assert_eq!(runner.model_path(), tmp.path().join("models/kobert-nsmc"));

    let source = runner.load_model(None).unwrap();
    assert_eq!(source, ModelSource::Local(tmp.path().join("models/kobert-nsmc")));
    assert_eq!(runner.service().loads.len(), 1);
}

#[test]
fn test_load_model_falls_back_to_remote() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    std::fs::create_dir_all(runner.model_path()).unwrap();
    runner.service_mut().local_missing = true;

    let source = runner.load_model(None).unwrap();
    assert_eq!(source, ModelSource::Remote("monologg/kobert".into()));
    assert_eq!(runner.service().loads.len(), 2);
}

#[test]
fn test_load_model_without_local_dir() {
    let tmp = TempDir::new().unwrap();
    let mut runner = runner(tmp.path(), "");
    let source = runner.load_model(Some("other")).unwrap();
    assert_eq!(runner.model_name(), "other");
    assert_eq!(source, ModelSource::Remote("monologg/kobert".into()));
    assert_eq!(runner.service().loads.len(), 1);
}

#[test]
fn test_model_source_display() {
    assert_eq!(ModelSource::Remote("bert".into()).to_string(), "bert");
    assert_eq!(ModelSource::Local("/m/x".into()).to_string(), "/m/x");
}
