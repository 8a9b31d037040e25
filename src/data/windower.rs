// ============================================================
// Layer 4 — Sliding Windower
// ============================================================
// Cuts one class's raw signal column into fixed-length
// windows. Small-volume classes are sampled on a finer stride
// so they contribute more windows per reading.
//
// Stride policy (defaults):
//   nominal_volume < 100  → max(1, window_size / 20)
//   otherwise             → max(1, window_size / 10)
//
// Example with window_size=5, stride=2, column of 10 readings:
//   Window 1:  readings 0-4
//   Window 2:  readings 2-6
//   Window 3:  readings 4-8
//   (a window starting at 6 would need reading 10 → not emitted)
//
// Only full windows are produced; the tail of a column that
// does not fill a window is dropped.

use serde::{Deserialize, Serialize};

use crate::data::featurizer::MIN_WINDOW_LEN;
use crate::domain::error::{PipelineError, PipelineResult, Stage};
use crate::domain::sample::RawWindow;
use crate::domain::volume_class::VolumeClass;

// ─── StridePolicy ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StridePolicy {
    /// Classes strictly below this volume use `fine_divisor`
    pub small_volume_cutoff: f64,
    pub fine_divisor:        usize,
    pub coarse_divisor:      usize,
}

impl Default for StridePolicy {
    fn default() -> Self {
        Self {
            small_volume_cutoff: 100.0,
            fine_divisor:        20,
            coarse_divisor:      10,
        }
    }
}

impl StridePolicy {
    pub fn stride_for(&self, class: &VolumeClass, window_size: usize) -> usize {
        let divisor = if class.nominal_volume < self.small_volume_cutoff {
            self.fine_divisor
        } else {
            self.coarse_divisor
        };
        (window_size / divisor.max(1)).max(1)
    }
}

// ─── Windower ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct Windower {
    window_size: usize,
    policy:      StridePolicy,
}

impl Windower {
    /// Fails if the window is too short to featurize.
    pub fn new(window_size: usize, policy: StridePolicy) -> PipelineResult<Self> {
        if window_size < MIN_WINDOW_LEN {
            return Err(PipelineError::invalid_config(
                Stage::Featurization,
                format!("window size {window_size} is below the minimum of {MIN_WINDOW_LEN}"),
            ));
        }
        Ok(Self { window_size, policy })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stride_for(&self, class: &VolumeClass) -> usize {
        self.policy.stride_for(class, self.window_size)
    }

    /// All full windows of `column`, in start order.
    pub fn windows<'a>(
        &self,
        column:      &'a [f64],
        class_index: usize,
        class:       &VolumeClass,
    ) -> Vec<RawWindow<'a>> {
        let stride = self.stride_for(class);
        (0..)
            .map(|i| i * stride)
            .map_while(|start| RawWindow::from_column(column, class_index, start, self.window_size))
            .collect()
    }

    /// How many windows a column of `column_len` readings yields at `stride`.
    pub fn num_windows(&self, column_len: usize, stride: usize) -> usize {
        if column_len < self.window_size {
            return 0;
        }
        (column_len - self.window_size) / stride.max(1) + 1
    }
}
