// ============================================================
// Layer 3 — Volume Classes and the Catalog
// ============================================================
// A VolumeClass is one known container size. The catalog is
// the fixed, ordered set of classes a run is configured with;
// it is never discovered from the data.
//
// Each class carries:
//   - name            the column key in the signal source
//   - nominal_volume  the regression target for its samples
//   - weight          per-sample weight applied in the loss
//   - tolerance       half-width of its evaluation band
//
// Tolerance is derived from the nominal volume by a
// TolerancePolicy (5 units below 100, else 10, by default).

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult, Stage};

// ─── TolerancePolicy ──────────────────────────────────────────────────────────
/// Maps a nominal volume to the half-width of its evaluation band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TolerancePolicy {
    /// Volumes strictly below this use `small_tolerance`
    pub small_volume_cutoff: f64,
    pub small_tolerance:     f64,
    pub large_tolerance:     f64,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self {
            small_volume_cutoff: 100.0,
            small_tolerance:     5.0,
            large_tolerance:     10.0,
        }
    }
}

impl TolerancePolicy {
    pub fn tolerance_for(&self, nominal_volume: f64) -> f64 {
        if nominal_volume < self.small_volume_cutoff {
            self.small_tolerance
        } else {
            self.large_tolerance
        }
    }
}

// ─── VolumeClass ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeClass {
    pub name:           String,
    pub nominal_volume: f64,
    pub weight:         f64,
    pub tolerance:      f64,
}

impl VolumeClass {
    /// Build a class, deriving its tolerance from `policy`.
    pub fn new(
        name:           impl Into<String>,
        nominal_volume: f64,
        weight:         f64,
        policy:         &TolerancePolicy,
    ) -> Self {
        Self {
            name:      name.into(),
            nominal_volume,
            weight,
            tolerance: policy.tolerance_for(nominal_volume),
        }
    }

    /// Inclusive evaluation band `[nominal - tolerance, nominal + tolerance]`.
    pub fn band(&self) -> (f64, f64) {
        (self.nominal_volume - self.tolerance, self.nominal_volume + self.tolerance)
    }

    pub fn in_band(&self, value: f64) -> bool {
        let (lo, hi) = self.band();
        value >= lo && value <= hi
    }
}

// ─── Catalog configuration ────────────────────────────────────────────────────
/// One entry of a catalog file, before tolerance derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name:           String,
    pub nominal_volume: f64,
    #[serde(default = "default_weight")]
    pub weight:         f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Serialisable description of a catalog (the `--catalog` JSON file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    #[serde(default)]
    pub tolerance: TolerancePolicy,
    pub classes:   Vec<ClassSpec>,
}

impl Default for CatalogSpec {
    /// Five container sizes; the small ones count double in the loss.
    fn default() -> Self {
        let class = |name: &str, nominal_volume: f64, weight: f64| ClassSpec {
            name: name.to_string(),
            nominal_volume,
            weight,
        };
        Self {
            tolerance: TolerancePolicy::default(),
            classes:   vec![
                class("70ml", 70.0, 2.0),
                class("90ml", 90.0, 2.0),
                class("250ml", 250.0, 1.0),
                class("350ml", 350.0, 1.0),
                class("450ml", 450.0, 1.0),
            ],
        }
    }
}

// ─── Catalog ──────────────────────────────────────────────────────────────────
/// The ordered, validated set of classes for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    classes: Vec<VolumeClass>,
}

impl Catalog {
    pub fn from_spec(spec: &CatalogSpec) -> PipelineResult<Self> {
        let classes = spec
            .classes
            .iter()
            .map(|c| VolumeClass::new(&c.name, c.nominal_volume, c.weight, &spec.tolerance))
            .collect();
        Self::new(classes)
    }

    /// Validate and wrap an explicit class list.
    pub fn new(classes: Vec<VolumeClass>) -> PipelineResult<Self> {
        if classes.is_empty() {
            return Err(PipelineError::invalid_config(Stage::Loading, "catalog has no classes"));
        }
        for (i, class) in classes.iter().enumerate() {
            if class.name.trim().is_empty() {
                return Err(PipelineError::invalid_config(
                    Stage::Loading,
                    format!("catalog entry {i} has an empty name"),
                ));
            }
            if !(class.nominal_volume.is_finite() && class.nominal_volume > 0.0) {
                return Err(PipelineError::invalid_config(
                    Stage::Loading,
                    format!("class '{}' needs a positive nominal volume", class.name),
                ));
            }
            if !(class.weight.is_finite() && class.weight > 0.0) {
                return Err(PipelineError::invalid_config(
                    Stage::Loading,
                    format!("class '{}' needs a positive weight", class.name),
                ));
            }
            if classes[..i].iter().any(|other| other.name == class.name) {
                return Err(PipelineError::invalid_config(
                    Stage::Loading,
                    format!("class '{}' appears twice in the catalog", class.name),
                ));
            }
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[VolumeClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let spec = CatalogSpec::default();
        let classes = spec
            .classes
            .iter()
            .map(|c| VolumeClass::new(&c.name, c.nominal_volume, c.weight, &spec.tolerance))
            .collect();
        Self { classes }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_follows_volume() {
        let policy = TolerancePolicy::default();
        assert_eq!(VolumeClass::new("70ml", 70.0, 2.0, &policy).tolerance, 5.0);
        assert_eq!(VolumeClass::new("99ml", 99.9, 1.0, &policy).tolerance, 5.0);
        assert_eq!(VolumeClass::new("100ml", 100.0, 1.0, &policy).tolerance, 10.0);
        assert_eq!(VolumeClass::new("450ml", 450.0, 1.0, &policy).tolerance, 10.0);
    }

    #[test]
    fn test_custom_tolerance_policy() {
        let policy = TolerancePolicy {
            small_volume_cutoff: 200.0,
            small_tolerance:     3.0,
            large_tolerance:     15.0,
        };
        assert_eq!(VolumeClass::new("150ml", 150.0, 1.0, &policy).tolerance, 3.0);
        assert_eq!(VolumeClass::new("250ml", 250.0, 1.0, &policy).tolerance, 15.0);
    }

    #[test]
    fn test_band_is_inclusive() {
        let c = VolumeClass::new("70ml", 70.0, 2.0, &TolerancePolicy::default());
        assert_eq!(c.band(), (65.0, 75.0));
        assert!(c.in_band(65.0));
        assert!(c.in_band(75.0));
        assert!(!c.in_band(75.01));
    }

    #[test]
    fn test_default_catalog_is_ordered() {
        let catalog = Catalog::default();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["70ml", "90ml", "250ml", "350ml", "450ml"]);
        assert_eq!(catalog.classes().first().map(|c| c.weight), Some(2.0));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let policy = TolerancePolicy::default();
        let classes = vec![
            VolumeClass::new("70ml", 70.0, 2.0, &policy),
            VolumeClass::new("70ml", 90.0, 2.0, &policy),
        ];
        let err = Catalog::new(classes).unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn test_catalog_spec_from_json() {
        let json = r#"{ "classes": [ { "name": "80ml", "nominal_volume": 80.0, "weight": 3.0 },
                                      { "name": "300ml", "nominal_volume": 300.0 } ] }"#;
        let spec: CatalogSpec = serde_json::from_str(json).unwrap();
        let catalog = Catalog::from_spec(&spec).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.classes()[0].tolerance, 5.0);
        assert_eq!(catalog.classes()[1].weight, 1.0);
        assert_eq!(catalog.classes()[1].tolerance, 10.0);
    }
}
