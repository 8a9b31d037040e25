use anyhow::{Context, Result};
use std::fs;

use crate::domain::volume_class::{Catalog, CatalogSpec};

/// Read a JSON catalog file, or fall back to `default` when no path is given.
pub fn load_catalog_spec(path: Option<&str>, default: &CatalogSpec) -> Result<CatalogSpec> {
    let Some(path) = path else {
        return Ok(default.clone());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read catalog file '{path}'"))?;
    let spec: CatalogSpec = serde_json::from_str(&json)
        .with_context(|| format!("Catalog file '{path}' is not a valid catalog"))?;
    tracing::info!("Loaded {} classes from catalog '{}'", spec.classes.len(), path);
    Ok(spec)
}

pub fn load_catalog(path: Option<&str>, default: &CatalogSpec) -> Result<Catalog> {
    let spec = load_catalog_spec(path, default)?;
    Ok(Catalog::from_spec(&spec)?)
}
