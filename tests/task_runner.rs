//! Task Runner Integration Tests
//!
//! A majority-label service trained and evaluated through [`TaskRunner`],
//! with predictions landing in the batch directory.

use serde_json::{json, Value as Cell};
use std::collections::BTreeMap;
use tanda::dataset::{DtypeHints, FileTableIo, TableIo};
use tanda::model::{ModelSource, Predictions};
use tanda::{BatchEntity, EntityContext, ModelService, Result, Table, TaskRunner};
use tempfile::TempDir;

/// Predicts the most frequent training label for every input
#[derive(Debug, Default)]
struct MajorityLabel {
    label: Option<Cell>,
}

impl ModelService for MajorityLabel {
    fn load(&mut self, _source: &ModelSource) -> Result<()> {
        Ok(())
    }

    fn train(&mut self, train: &Table, _dev: Option<&Table>) -> Result<()> {
        let mut counts: BTreeMap<String, (usize, Cell)> = BTreeMap::new();
        for cell in train.column("labels").into_iter().flatten() {
            let entry = counts.entry(cell.to_string()).or_insert((0, cell.clone()));
            entry.0 += 1;
        }
        self.label = counts.into_values().max_by_key(|(n, _)| *n).map(|(_, cell)| cell);
        Ok(())
    }

    fn predict(&self, inputs: &[String]) -> Result<Predictions> {
        let label = self.label.clone().unwrap_or(Cell::Null);
        Ok(Predictions {
            predicted: vec![label.clone(); inputs.len()],
            model_outputs: vec![json!([1.0]); inputs.len()],
            pred_probs: None,
        })
    }

    fn evaluate(&self, data: &Table) -> Result<BTreeMap<String, f64>> {
        let label = self.label.clone().unwrap_or(Cell::Null);
        let hits = data.column("labels").into_iter().flatten().filter(|c| **c == label).count();
        Ok(BTreeMap::from([("accuracy".to_string(), hits as f64 / data.num_rows() as f64)]))
    }
}

fn reviews(labels: &[i64]) -> Table {
    let rows = labels
        .iter()
        .enumerate()
        .map(|(i, label)| vec![json!(i), json!(format!("review {i}")), json!(label)])
        .collect();
    Table::from_rows(["id", "document", "label"], rows).unwrap()
}

#[test]
fn test_train_evaluate_and_write_predictions() {
    let tmp = TempDir::new().unwrap();
    let args = serde_yaml::from_str(
        "name: sentiment\nmodel:\n  model_name: majority\ncolumns:\n  train:\n    text: document\n    labels: label\n  predict:\n    input: document\n",
    )
    .unwrap();
    let entity = BatchEntity::new(args, EntityContext::new().with_root_dir(tmp.path())).unwrap();
    let mut runner = TaskRunner::new(entity, MajorityLabel::default()).unwrap();

    runner.train(reviews(&[1, 1, 0]), None).unwrap();
    let metrics = runner.evaluate(reviews(&[1, 0])).unwrap();
    assert_eq!(metrics["accuracy"], 0.5);

    let path = runner.eval(Some(reviews(&[0, 1, 1, 1]))).unwrap().unwrap();
    assert_eq!(path, tmp.path().join("outputs/sentiment/sentiment(0)_preds.csv"));

    let saved = FileTableIo.load(&path, &DtypeHints::new()).unwrap();
    assert_eq!(saved.columns(), ["id", "document", "label", "pred_labels", "raw_preds"].map(String::from));
    assert_eq!(saved.num_rows(), 4);

    let source = runner.load_model(None).unwrap();
    assert_eq!(source, ModelSource::Remote("majority".into()));
}
