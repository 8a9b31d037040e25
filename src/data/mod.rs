// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw signal columns and tensor batches.
//
//   CSV file (one column per volume class)
//       │
//       ▼
//   CsvSignalLoader   → reads named numeric columns
//       │
//       ▼
//   Windower          → class-specific stride windows
//       │
//       ▼
//   Featurizer        → 25 statistics per window
//       │
//       ▼
//   DatasetBuilder    → tagged Samples for every class
//       │
//       ▼
//   Splitter          → train / validation / test partitions
//       │
//       ▼
//   Normalizer        → min-max scaling fitted on train only
//       │
//       ▼
//   ScaledDataset + VolumeBatcher → DataLoader batches

/// Reads per-class signal columns from CSV
pub mod loader;

/// Window statistics: basic, trend, moments, entropy, segments
pub mod featurizer;

/// Sliding windows with class-dependent stride
pub mod windower;

/// Builds the tagged sample corpus and the burn Dataset view
pub mod dataset;

/// Partition strategies (global stratified, fixed count per class)
pub mod splitter;

/// Min-max scaling of features and targets
pub mod normalizer;

/// Stacks normalised rows into tensor batches
pub mod batcher;
