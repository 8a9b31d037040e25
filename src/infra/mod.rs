// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File output that no business layer owns:
//
//   metrics.rs     per-epoch loss and LR log (metrics.csv)
//
//   artifacts.rs   the run directory holding configuration
//                  JSON, evaluation report JSON and the
//                  prediction CSV for plotting
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Run output directory
pub mod artifacts;

/// Training metrics CSV logger
pub mod metrics;
