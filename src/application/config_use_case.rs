// ============================================================
// Layer 2 — ConfigUseCase
// ============================================================
// Loads a configuration (from a JSON file, or the built-in base
// architecture when no file is given) and validates it.
//
// Serves three commands:
//   init     → write the base configuration to a file
//   describe → load + validate, return the shape trace
//   check    → same as describe; the CLI only reports pass/fail

use anyhow::{Context, Result};

use crate::domain::model_config::{ModelConfiguration, ShapeTrace};
use crate::domain::traits::{BuiltinBase, ConfigurationSource};
use crate::infra::config_store::JsonConfigFile;

pub struct ConfigUseCase {
    config_path: Option<String>,
}

impl ConfigUseCase {
    /// `None` means the built-in base configuration.
    pub fn new(config_path: Option<String>) -> Self {
        Self { config_path }
    }

    pub fn load(&self) -> Result<ModelConfiguration> {
        match &self.config_path {
            Some(path) => JsonConfigFile::new(path).load(),
            None       => BuiltinBase.load(),
        }
    }

    /// Load and validate, returning the configuration with its trace.
    pub fn describe(&self) -> Result<(ModelConfiguration, ShapeTrace)> {
        let configuration = self.load()?;
        let trace = configuration
            .validate()
            .with_context(|| format!("Configuration '{}' is invalid", configuration.name))?;

        tracing::info!(
            "Configuration '{}': {} layers, {} params, output {}",
            configuration.name,
            trace.rows.len(),
            trace.total_params(),
            trace.output()
        );
        Ok((configuration, trace))
    }

    /// Write the base configuration to `out`.
    pub fn init(out: &str) -> Result<()> {
        let base = ModelConfiguration::base();
        JsonConfigFile::new(out).save(&base)?;
        tracing::info!("Wrote base configuration to '{}'", out);
        Ok(())
    }
}
