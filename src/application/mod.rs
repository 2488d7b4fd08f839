// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor code, no printing,
// no direct file access.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load, validate and write model configurations
pub mod config_use_case;

// Forward-pass probe of a configuration
pub mod probe_use_case;

// Experiment log: list, best, record, export
pub mod experiments_use_case;
