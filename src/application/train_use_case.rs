// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full pipeline in order:
//
//   Step 1: Resolve the class catalog       (Layer 3 - domain)
//   Step 2: Load signal columns             (Layer 4 - data)
//   Step 3: Window, featurize, partition    (Layer 4 - data)
//   Step 4: Fit normalisation on train      (Layer 4 - data)
//   Step 5: Save config                     (Layer 6 - infra)
//   Step 6: Train + predict the test set    (Layer 5 - ml)
//   Step 7: Tolerance-banded evaluation     (Layer 5 - ml)
//   Step 8: Write metrics, report, predictions (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::catalog_file::load_catalog_spec;
use crate::data::{
    dataset::DatasetBuilder,
    loader::CsvSignalLoader,
    normalizer::NormalizationState,
    splitter::PartitionConfig,
    windower::StridePolicy,
};
use crate::domain::{
    report::EvaluationReport,
    sample::{class_counts, FEATURE_COUNT},
    traits::SignalSource,
    volume_class::{Catalog, CatalogSpec},
};
use crate::infra::{artifacts::ArtifactStore, metrics::MetricsLogger};
use crate::ml::{
    evaluator::evaluate,
    loss::WeightedLoss,
    regressor::TrainingHistory,
    schedule::ScheduleConfig,
    trainer::{BurnRegressor, CpuBackend, RegressorConfig, WeightedTrainer},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything that shapes a run. Saved as train_config.json next to the
// run's outputs, with the catalog resolved inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path:    String,
    pub output_dir:   String,
    /// JSON catalog file; `catalog` is used when absent.
    pub catalog_path: Option<String>,
    pub catalog:      CatalogSpec,
    pub window_size:  usize,
    pub stride:       StridePolicy,
    pub partition:    PartitionConfig,
    pub loss:         WeightedLoss,
    pub schedule:     ScheduleConfig,
    pub regressor:    RegressorConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:    "data/signals.csv".to_string(),
            output_dir:   "runs/latest".to_string(),
            catalog_path: None,
            catalog:      CatalogSpec::default(),
            window_size:  30,
            stride:       StridePolicy::default(),
            partition:    PartitionConfig::default(),
            loss:         WeightedLoss::default(),
            schedule:     ScheduleConfig::default(),
            regressor:    RegressorConfig::default(),
        }
    }
}

impl TrainConfig {
    /// One seed drives partition shuffles, batch order and weight init.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.partition.seed = seed;
        self.regressor.seed = seed;
        self
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub report:      EvaluationReport,
    pub history:     TrainingHistory,
    pub train_count: usize,
    pub val_count:   usize,
    pub test_count:  usize,
    pub output_dir:  PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run against the CSV file named in the config.
    pub fn execute(&self) -> Result<TrainSummary> {
        let loader = CsvSignalLoader::new(&self.config.data_path);
        self.execute_with(&loader)
    }

    pub fn execute_with(&self, source: &dyn SignalSource) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Catalog ───────────────────────────────────────────────────
        let spec    = load_catalog_spec(cfg.catalog_path.as_deref(), &cfg.catalog)?;
        let catalog = Catalog::from_spec(&spec)?;
        tracing::info!("Catalog: {}", catalog.names().collect::<Vec<_>>().join(", "));

        // ── Step 2: Signal columns ────────────────────────────────────────────
        let columns = source.load_columns()?;
        ensure!(!columns.is_empty(), "Signal source provided no columns");

        // ── Step 3: Samples and partitions ────────────────────────────────────
        let builder    = DatasetBuilder::new(cfg.window_size, cfg.stride)?;
        let partitions = builder
            .build(&catalog, &columns, &cfg.partition)
            .context("Cannot build the sample partitions")?;
        log_partition_counts(&catalog, "train", &class_counts(&partitions.train, catalog.len()));
        log_partition_counts(&catalog, "validation", &class_counts(&partitions.validation, catalog.len()));
        log_partition_counts(&catalog, "test", &class_counts(&partitions.test, catalog.len()));

        // ── Step 4: Normalisation (train only) ────────────────────────────────
        let state = NormalizationState::fit(&partitions.train)?;

        // ── Step 5: Save resolved config ──────────────────────────────────────
        let store = ArtifactStore::new(&cfg.output_dir)?;
        store.save_config(&TrainConfig { catalog: spec, ..cfg.clone() })?;

        // ── Step 6: Train and predict ─────────────────────────────────────────
        let mut regressor = BurnRegressor::<CpuBackend>::new(
            FEATURE_COUNT,
            &cfg.regressor,
            Default::default(),
        )?;
        let trainer = WeightedTrainer::new(cfg.loss, cfg.schedule);
        let outcome = trainer
            .train_and_predict(&mut regressor, &partitions, &state)
            .context("Training failed")?;

        // ── Step 7: Evaluate ──────────────────────────────────────────────────
        let report = evaluate(&outcome.truths, &outcome.predictions, &catalog)?;

        // ── Step 8: Artifacts ─────────────────────────────────────────────────
        MetricsLogger::new(store.dir())?.log_all(&outcome.history.epochs)?;
        store.save_report(&report)?;
        store.save_predictions(&outcome.truths, &outcome.predictions)?;

        tracing::info!("Run complete; artifacts in '{}'", store.dir().display());
        Ok(TrainSummary {
            report,
            history:     outcome.history,
            train_count: partitions.train.len(),
            val_count:   partitions.validation.len(),
            test_count:  partitions.test.len(),
            output_dir:  store.dir().to_path_buf(),
        })
    }
}

fn log_partition_counts(catalog: &Catalog, partition: &str, counts: &[usize]) {
    let detail = catalog
        .names()
        .zip(counts)
        .map(|(name, n)| format!("{name}={n}"))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!("{} partition: {} samples ({})", partition, counts.iter().sum::<usize>(), detail);
}
