// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The end-to-end training and evaluation workflow
pub mod train_use_case;

// Feature dump for offline inspection
pub mod featurize_use_case;

// Catalog file resolution shared by both workflows
pub mod catalog_file;
