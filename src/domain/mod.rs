// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing the fill-volume
// problem: the container catalog, signal windows, samples,
// partitions, evaluation reports, and the seams other layers
// plug into.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Container classes, the ordered catalog and derivation policies
pub mod volume_class;

// Raw windows, feature vectors, samples and partitions
pub mod sample;

// Per-class evaluation metrics
pub mod report;

// Stage-tagged pipeline errors
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
