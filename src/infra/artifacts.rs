// ============================================================
// Layer 6 — Run Artifact Store
// ============================================================
// Everything a training run leaves behind, in one directory:
//
//   <dir>/
//     train_config.json       ← the full run configuration
//     evaluation_report.json  ← class → { mse, rmse, mae, mape, sample_count }
//     predictions.csv         ← true_value,predicted_value per test sample
//     metrics.csv             ← written by MetricsLogger
//
// predictions.csv is the surface plotting tools read; its
// header is fixed.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::report::EvaluationReport;

pub const CONFIG_FILE:      &str = "train_config.json";
pub const REPORT_FILE:      &str = "evaluation_report.json";
pub const PREDICTIONS_FILE: &str = "predictions.csv";

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates the directory (and parents) if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_config<T: Serialize>(&self, config: &T) -> Result<PathBuf> {
        self.write_json(CONFIG_FILE, config)
    }

    pub fn save_report(&self, report: &EvaluationReport) -> Result<PathBuf> {
        let path = self.write_json(REPORT_FILE, report)?;
        tracing::info!("Evaluation report written to '{}'", path.display());
        Ok(path)
    }

    pub fn save_predictions(&self, truths: &[f64], predictions: &[f64]) -> Result<PathBuf> {
        if truths.len() != predictions.len() {
            bail!(
                "Cannot export {} true values against {} predictions",
                truths.len(),
                predictions.len()
            );
        }
        let path = self.dir.join(PREDICTIONS_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        writer.write_record(["true_value", "predicted_value"])?;
        for (t, p) in truths.iter().zip(predictions) {
            writer.write_record([t.to_string(), p.to_string()])?;
        }
        writer.flush()?;

        tracing::debug!("Wrote {} predictions to '{}'", truths.len(), path.display());
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ClassMetrics;

    #[test]
    fn test_predictions_csv_has_fixed_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("run")).unwrap();
        let path = store.save_predictions(&[70.0, 250.0], &[71.5, 248.0]).unwrap();

        let mut reader = csv::Reader::from_path(path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["true_value", "predicted_value"]
        );
        let rows: Vec<(f64, f64)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].parse().unwrap(), r[1].parse().unwrap())
            })
            .collect();
        assert_eq!(rows, vec![(70.0, 71.5), (250.0, 248.0)]);
    }

    #[test]
    fn test_prediction_length_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        assert!(store.save_predictions(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_report_json_keeps_class_order_and_null_mape() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let mut report = EvaluationReport::new();
        let metrics = |mape| ClassMetrics { mse: 1.0, rmse: 1.0, mae: 1.0, mape, sample_count: 3 };
        report.insert("90ml", metrics(None));
        report.insert("70ml", metrics(Some(2.0)));

        let path = store.save_report(&report).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.find("90ml").unwrap() < text.find("70ml").unwrap());

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["90ml"]["mape"].is_null());
        assert_eq!(value["70ml"]["sample_count"], 3);
    }
}
