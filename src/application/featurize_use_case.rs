// ============================================================
// Layer 2 — FeaturizeUseCase
// ============================================================
// Dumps the full featurized corpus to CSV for offline
// inspection, without partitioning or training:
//
//   class,window_start,target,weight,mean,std,...,position
//
// One row per window, classes in catalog order.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::catalog_file::load_catalog;
use crate::data::{dataset::DatasetBuilder, loader::CsvSignalLoader, windower::StridePolicy};
use crate::domain::{
    sample::FEATURE_NAMES,
    traits::SignalSource,
    volume_class::CatalogSpec,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizeConfig {
    pub data_path:    String,
    pub output_path:  String,
    pub catalog_path: Option<String>,
    pub catalog:      CatalogSpec,
    pub window_size:  usize,
    pub stride:       StridePolicy,
}

impl Default for FeaturizeConfig {
    fn default() -> Self {
        Self {
            data_path:    "data/signals.csv".to_string(),
            output_path:  "features.csv".to_string(),
            catalog_path: None,
            catalog:      CatalogSpec::default(),
            window_size:  30,
            stride:       StridePolicy::default(),
        }
    }
}

pub struct FeaturizeUseCase {
    config: FeaturizeConfig,
}

impl FeaturizeUseCase {
    pub fn new(config: FeaturizeConfig) -> Self {
        Self { config }
    }

    /// Returns the number of rows written.
    pub fn execute(&self) -> Result<usize> {
        let loader = CsvSignalLoader::new(&self.config.data_path);
        self.execute_with(&loader)
    }

    pub fn execute_with(&self, source: &dyn SignalSource) -> Result<usize> {
        let cfg     = &self.config;
        let catalog = load_catalog(cfg.catalog_path.as_deref(), &cfg.catalog)?;
        let columns = source.load_columns()?;
        ensure!(!columns.is_empty(), "Signal source provided no columns");
        let corpus  = DatasetBuilder::new(cfg.window_size, cfg.stride)?
            .build_corpus(&catalog, &columns)?;

        let mut writer = csv::Writer::from_path(&cfg.output_path)
            .with_context(|| format!("Cannot create '{}'", cfg.output_path))?;

        let mut header = vec!["class", "window_start", "target", "weight"];
        header.extend(FEATURE_NAMES);
        writer.write_record(&header)?;

        for sample in &corpus {
            let class = catalog
                .classes().get(sample.class_index)
                .map(|c| c.name.as_str())
                .unwrap_or_default();
            let mut row = vec![
                class.to_string(),
                sample.window_start.to_string(),
                sample.target.to_string(),
                sample.weight.to_string(),
            ];
            row.extend(sample.features.as_slice().iter().map(f64::to_string));
            writer.write_record(&row)?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} feature rows to '{}'", corpus.len(), cfg.output_path);
        Ok(corpus.len())
    }
}
