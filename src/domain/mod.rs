// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing the classifier and its history.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only structs, enums, traits and pure functions
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Per-sample tensor shapes and the per-layer shape errors
pub mod shape;

/// One entry of the layer stack
pub mod layer;

/// The full stack, its validation and shape trace
pub mod model_config;

/// Recorded runs and observations
pub mod experiment;

// Abstractions implemented by the infra layer
pub mod traits;
