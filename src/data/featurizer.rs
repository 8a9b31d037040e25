// ============================================================
// Layer 4 — Signal Window Featurizer
// ============================================================
// Turns one fixed-length window of raw readings into the
// 25-value FeatureVector the regressor is trained on.
//
// Output order (fixed):
//   basic        mean, std, median, max, min, range
//   trend        over first differences: mean, std,
//                #positive, #negative, median
//   higher-order variance, skewness, excess kurtosis,
//                Shannon entropy of |window|
//   segments     3 × (mean, std, median)
//   position     window start / column length
//
// All spreads are population statistics (divide by n).
// Skewness and kurtosis are the biased moment estimators.
//
// Degenerate inputs have fixed fallbacks instead of NaN:
//   - all-zero window      → entropy 0.0
//   - constant window      → skewness 0.0, kurtosis 0.0
//
// Segments use `len / 3`; the remainder goes to the last one,
// e.g. a 7-reading window splits as 2 / 2 / 3.

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::sample::{FeatureVector, RawWindow, SIGNAL_FEATURE_COUNT};

/// Shortest window the featurizer accepts (two readings per segment).
pub const MIN_WINDOW_LEN: usize = 6;

const SEGMENTS: usize = 3;

/// Stateless window featurizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Featurizer;

impl Featurizer {
    pub fn new() -> Self {
        Self
    }

    /// Featurize a window, appending its position as the last value.
    pub fn featurize(&self, window: &RawWindow<'_>) -> PipelineResult<FeatureVector> {
        let mut values = Vec::with_capacity(SIGNAL_FEATURE_COUNT + 1);
        values.extend_from_slice(&signal_features(window.values)?);
        values.push(window.position);
        Ok(FeatureVector::new(values))
    }
}

/// The 24 features computed from the readings alone.
pub fn signal_features(window: &[f64]) -> PipelineResult<[f64; SIGNAL_FEATURE_COUNT]> {
    if window.len() < MIN_WINDOW_LEN {
        return Err(PipelineError::WindowTooShort { len: window.len(), min: MIN_WINDOW_LEN });
    }
    if let Some(index) = window.iter().position(|v| !v.is_finite()) {
        return Err(PipelineError::NonFiniteReading { index });
    }

    let mut out = [0.0f64; SIGNAL_FEATURE_COUNT];

    // ── Basic stats ───────────────────────────────────────────────────────────
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    out[0] = mean(window);
    out[1] = std_dev(window);
    out[2] = median(window);
    out[3] = max;
    out[4] = min;
    out[5] = max - min;

    // ── Trend stats ───────────────────────────────────────────────────────────
    let diffs: Vec<f64> = window.windows(2).map(|p| p[1] - p[0]).collect();
    out[6]  = mean(&diffs);
    out[7]  = std_dev(&diffs);
    out[8]  = diffs.iter().filter(|&&d| d > 0.0).count() as f64;
    out[9]  = diffs.iter().filter(|&&d| d < 0.0).count() as f64;
    out[10] = median(&diffs);

    // ── Higher-order stats ────────────────────────────────────────────────────
    let (variance, skewness, kurtosis) = moments(window);
    out[11] = variance;
    out[12] = skewness;
    out[13] = kurtosis;
    out[14] = abs_entropy(window);

    // ── Segment stats ─────────────────────────────────────────────────────────
    for (i, segment) in segments(window).into_iter().enumerate() {
        let base = 15 + i * 3;
        out[base]     = mean(segment);
        out[base + 1] = std_dev(segment);
        out[base + 2] = median(segment);
    }

    Ok(out)
}

/// Split into three contiguous segments of `len / 3`, remainder in the last.
fn segments(window: &[f64]) -> [&[f64]; SEGMENTS] {
    let seg = window.len() / SEGMENTS;
    [&window[..seg], &window[seg..2 * seg], &window[2 * seg..]]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// (variance, skewness, excess kurtosis) from central moments.
fn moments(values: &[f64]) -> (f64, f64, f64) {
    let n  = values.len() as f64;
    let mu = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d  = v - mu;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    // Spread at floating-point noise level counts as constant.
    if m2 <= (f64::EPSILON * mu).powi(2) || m2 == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    (m2, m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

/// Shannon entropy (nats) of |values| normalised to a distribution.
fn abs_entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().map(|v| v.abs()).sum();
    if total == 0.0 {
        return 0.0;
    }
    values
        .iter()
        .map(|v| v.abs() / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::FEATURE_COUNT;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ramp_window_features() {
        let w = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let f = signal_features(&w).unwrap();

        // basic
        assert!(close(f[0], 3.5));
        assert!(close(f[1], (35.0f64 / 12.0).sqrt()));
        assert!(close(f[2], 3.5));
        assert_eq!((f[3], f[4], f[5]), (6.0, 1.0, 5.0));

        // trend: every step is +1
        assert!(close(f[6], 1.0));
        assert!(close(f[7], 0.0));
        assert_eq!((f[8], f[9]), (5.0, 0.0));
        assert!(close(f[10], 1.0));

        // higher-order
        assert!(close(f[11], 35.0 / 12.0));
        assert!(close(f[12], 0.0));
        let m4 = 2.0 * (2.5f64.powi(4) + 1.5f64.powi(4) + 0.5f64.powi(4)) / 6.0;
        assert!(close(f[13], m4 / (35.0f64 / 12.0).powi(2) - 3.0));
        let expected_entropy: f64 = w.iter().map(|v| v / 21.0).map(|p| -p * p.ln()).sum();
        assert!(close(f[14], expected_entropy));

        // segments [1,2] [3,4] [5,6]
        for (i, seg_mean) in [1.5, 3.5, 5.5].iter().enumerate() {
            assert!(close(f[15 + i * 3], *seg_mean));
            assert!(close(f[16 + i * 3], 0.5));
            assert!(close(f[17 + i * 3], *seg_mean));
        }
    }

    #[test]
    fn test_remainder_goes_to_last_segment() {
        // 7 readings → segments of 2, 2, 3
        let w = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 5.0];
        let f = signal_features(&w).unwrap();
        assert!(close(f[15], 0.0));
        assert!(close(f[18], 1.0));
        assert!(close(f[21], 3.0));
        assert!(close(f[23], 2.0));
    }

    #[test]
    fn test_all_zero_window_has_zero_entropy() {
        let f = signal_features(&[0.0; 12]).unwrap();
        assert_eq!(f[14], 0.0);
        assert!(f.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_constant_window_moments_fall_back_to_zero() {
        let f = signal_features(&[4.2; 9]).unwrap();
        assert_eq!(f[11], 0.0);
        assert_eq!(f[12], 0.0);
        assert_eq!(f[13], 0.0);
        assert!(close(f[14], (9.0f64).ln()));
    }

    #[test]
    fn test_trend_counts_both_directions() {
        let f = signal_features(&[1.0, 3.0, 2.0, 2.0, 5.0, 4.0]).unwrap();
        assert_eq!(f[8], 2.0);
        assert_eq!(f[9], 2.0);
    }

    #[test]
    fn test_short_window_rejected() {
        let err = signal_features(&[1.0; 5]).unwrap_err();
        assert_eq!(err, PipelineError::WindowTooShort { len: 5, min: 6 });
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let err = signal_features(&[1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0]).unwrap_err();
        assert_eq!(err, PipelineError::NonFiniteReading { index: 2 });
    }

    #[test]
    fn test_featurize_appends_position() {
        let column: Vec<f64> = (0..40).map(f64::from).collect();
        let window = RawWindow::from_column(&column, 0, 10, 20).unwrap();
        let fv = Featurizer::new().featurize(&window).unwrap();
        assert_eq!(fv.as_slice().len(), FEATURE_COUNT);
        assert!(close(fv.as_slice()[24], 0.25));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn featurize_is_fixed_width_and_deterministic(
                values in prop::collection::vec(-500.0f64..500.0, 6..120),
            ) {
                let window = RawWindow::from_column(&values, 0, 0, values.len()).unwrap();
                let featurizer = Featurizer::new();
                let a = featurizer.featurize(&window).unwrap();
                let b = featurizer.featurize(&window).unwrap();
                prop_assert_eq!(a.as_slice().len(), FEATURE_COUNT);
                prop_assert_eq!(&a, &b);
                prop_assert!(a.as_slice().iter().all(|v| v.is_finite()));
            }
        }
    }
}
