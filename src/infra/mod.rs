// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   config_store.rs     — ModelConfiguration as a JSON file
//                         (implements ConfigurationSource)
//
//   experiment_store.rs — ExperimentLog as a JSON file
//                         (implements ExperimentSink)
//
//   metrics.rs          — CSV export of the experiment log
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Configuration JSON file
pub mod config_store;

/// Experiment log JSON file
pub mod experiment_store;

/// Experiment metrics CSV export
pub mod metrics;
