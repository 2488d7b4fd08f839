// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The only layer that imports burn.
//
//   model.rs — turns a validated ModelConfiguration into a burn
//              Module: feature stack (conv / pool / dropout),
//              channel-last flatten, classifier stack
//              (dense / dropout), declared activations applied
//
//   probe.rs — one forward pass on a seeded synthetic batch to
//              confirm the declared stack runs end to end
//
// Reference: Burn Book §3 (Building Blocks)

/// Convolutional classifier built from a layer stack
pub mod model;

/// Forward-pass smoke check
pub mod probe;
