// ============================================================
// Layer 5 — Tolerance-Banded Evaluator
// ============================================================
// For each catalog class, select the (true, predicted) pairs
// whose TRUE value lies inside the class's inclusive tolerance
// band, then aggregate MSE / RMSE / MAE / MAPE over them.
//
// Bands are independent filters: a point can land in several
// overlapping bands or in none. Classes with no in-band points
// are left out of the report.

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::report::{ClassMetrics, EvaluationReport};
use crate::domain::volume_class::Catalog;

pub fn evaluate(
    true_values: &[f64],
    predicted:   &[f64],
    catalog:     &Catalog,
) -> PipelineResult<EvaluationReport> {
    if true_values.len() != predicted.len() {
        return Err(PipelineError::LengthMismatch {
            true_len:      true_values.len(),
            predicted_len: predicted.len(),
        });
    }

    let mut report = EvaluationReport::new();
    for class in catalog.classes() {
        let pairs: Vec<(f64, f64)> = true_values
            .iter()
            .zip(predicted)
            .filter(|(t, _)| class.in_band(**t))
            .map(|(&t, &p)| (t, p))
            .collect();

        let Some(metrics) = band_metrics(&pairs) else {
            tracing::debug!("Class '{}': no true values in band {:?}", class.name, class.band());
            continue;
        };
        if metrics.mape.is_none() {
            tracing::warn!(
                "Class '{}': zero true value in band, MAPE reported as null",
                class.name
            );
        }
        tracing::info!(
            "Class '{}': n={} rmse={:.4} mae={:.4} mape={}",
            class.name,
            metrics.sample_count,
            metrics.rmse,
            metrics.mae,
            metrics.mape.map_or_else(|| "null".to_string(), |m| format!("{m:.2}%")),
        );
        report.insert(class.name.clone(), metrics);
    }
    Ok(report)
}

/// None for an empty selection.
fn band_metrics(pairs: &[(f64, f64)]) -> Option<ClassMetrics> {
    if pairs.is_empty() {
        return None;
    }
    let n   = pairs.len() as f64;
    let mse = pairs.iter().map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n;
    let mae = pairs.iter().map(|(t, p)| (t - p).abs()).sum::<f64>() / n;

    let mape = if pairs.iter().any(|(t, _)| *t == 0.0) {
        None
    } else {
        Some(pairs.iter().map(|(t, p)| ((t - p) / t).abs()).sum::<f64>() / n * 100.0)
    };

    Some(ClassMetrics {
        mse,
        rmse: mse.sqrt(),
        mae,
        mape,
        sample_count: pairs.len(),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Stage;
    use crate::domain::volume_class::{TolerancePolicy, VolumeClass};

    fn catalog(classes: &[(&str, f64)]) -> Catalog {
        let policy = TolerancePolicy::default();
        Catalog::new(
            classes
                .iter()
                .map(|&(name, v)| VolumeClass::new(name, v, 1.0, &policy))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_band_selects_by_true_value() {
        let catalog = catalog(&[("70ml", 70.0)]);
        let report = evaluate(&[68.0, 72.0, 80.0], &[69.0, 70.0, 70.0], &catalog).unwrap();

        let m = report.get("70ml").unwrap();
        assert_eq!(m.sample_count, 2);
        // errors: -1, +2
        assert!((m.mse - 2.5).abs() < 1e-12);
        assert!((m.rmse - 2.5f64.sqrt()).abs() < 1e-12);
        assert!((m.mae - 1.5).abs() < 1e-12);
        let mape = (1.0 / 68.0 + 2.0 / 72.0) / 2.0 * 100.0;
        assert!((m.mape.unwrap() - mape).abs() < 1e-9);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let catalog = catalog(&[("70ml", 70.0)]);
        let report = evaluate(&[65.0, 75.0, 64.9], &[65.0, 75.0, 0.0], &catalog).unwrap();
        assert_eq!(report.get("70ml").map(|m| m.sample_count), Some(2));
    }

    #[test]
    fn test_class_without_points_is_absent() {
        let catalog = catalog(&[("70ml", 70.0), ("450ml", 450.0)]);
        let report = evaluate(&[70.0], &[71.0], &catalog).unwrap();
        assert!(report.get("450ml").is_none());
        assert_eq!(report.iter().count(), 1);
    }

    #[test]
    fn test_overlapping_bands_count_point_twice() {
        let catalog = catalog(&[("a", 70.0), ("b", 78.0)]);
        let report = evaluate(&[74.0], &[74.0], &catalog).unwrap();
        assert_eq!(report.iter().count(), 2);
    }

    #[test]
    fn test_zero_true_value_nulls_mape_only() {
        let catalog = catalog(&[("zero", 2.0)]);
        let report = evaluate(&[0.0, 2.0], &[1.0, 2.0], &catalog).unwrap();
        let m = report.get("zero").unwrap();
        assert_eq!(m.mape, None);
        assert!((m.mse - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_evaluation_error() {
        let err = evaluate(&[1.0, 2.0], &[1.0], &Catalog::default()).unwrap_err();
        assert_eq!(err.stage(), Stage::Evaluation);
    }
}
