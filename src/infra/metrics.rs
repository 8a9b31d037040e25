// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per training epoch.
//
// Columns:
//   epoch          the epoch number (1, 2, 3, ...)
//   train_loss     mean weighted loss over the training set
//   val_loss       mean weighted loss over validation
//                  (empty cell when there was no validation data)
//   learning_rate  the LR the epoch trained with
//
// Example:
//   epoch,train_loss,val_loss,learning_rate
//   1,0.084512,0.079301,1e-3
//   2,0.041230,0.043877,1e-3
//
// Reading it:
//   - val_loss climbing while train_loss falls → overfitting
//   - a step down in learning_rate marks a plateau reduction

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::regressor::EpochRecord;

pub const METRICS_HEADER: &str = "epoch,train_loss,val_loss,learning_rate";

/// Appends epoch rows to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh log (header only) in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{METRICS_HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, record: &EpochRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        let val_loss = record.val_loss.map(|v| format!("{v:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{},{:e}",
            record.epoch, record.train_loss, val_loss, record.learning_rate,
        )?;
        Ok(())
    }

    pub fn log_all(&self, records: &[EpochRecord]) -> Result<()> {
        for record in records {
            self.log(record)?;
        }
        tracing::debug!("Logged {} epochs to '{}'", records.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
