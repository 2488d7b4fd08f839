// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Seams between the application layer and storage:
//   - JsonConfigFile  implements ConfigurationSource
//   - ExperimentStore implements ExperimentSink
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::experiment::ExperimentRecord;
use crate::domain::model_config::ModelConfiguration;

// ─── ConfigurationSource ──────────────────────────────────────────────────────
/// Anything that can produce a model configuration.
///
/// Implementations:
///   - JsonConfigFile  → reads a JSON file from disk
///   - BuiltinBase     → the base architecture compiled into the binary
pub trait ConfigurationSource {
    /// Load the configuration. It is not validated yet.
    fn load(&self) -> Result<ModelConfiguration>;
}

// ─── ExperimentSink ───────────────────────────────────────────────────────────
/// Anything that can durably record a new experiment.
pub trait ExperimentSink {
    fn append(&self, record: ExperimentRecord) -> Result<()>;
}

/// The base architecture, no file needed.
pub struct BuiltinBase;

impl ConfigurationSource for BuiltinBase {
    fn load(&self) -> Result<ModelConfiguration> {
        Ok(ModelConfiguration::base())
    }
}
