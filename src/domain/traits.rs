// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads raw readings through this trait,
// so the pipeline never depends on a particular file format.
//
// Implementations:
//   - CsvSignalLoader   → one CSV column per volume class
//   - SignalColumns     → columns already in memory (tests,
//                         synthetic runs)
//
// The regressor seam lives in the ML layer (ml::regressor),
// since its contract speaks in terms of the training loss.

use anyhow::Result;

use crate::domain::sample::SignalColumns;

// ─── SignalSource ─────────────────────────────────────────────────────────────
/// Anything that can produce named columns of raw float readings.
pub trait SignalSource {
    /// Load every available column. Column names are catalog keys.
    fn load_columns(&self) -> Result<SignalColumns>;
}

/// Columns that are already in memory.
impl SignalSource for SignalColumns {
    fn load_columns(&self) -> Result<SignalColumns> {
        Ok(self.clone())
    }
}
