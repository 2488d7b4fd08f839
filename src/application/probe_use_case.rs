// ============================================================
// Layer 2 — ProbeUseCase
// ============================================================
// Loads a configuration and hands it to the ml layer for one
// forward pass on a synthetic batch.

use anyhow::Result;

use crate::application::config_use_case::ConfigUseCase;
use crate::ml::probe::{run_probe, ProbeReport};

pub struct ProbeUseCase {
    config:     ConfigUseCase,
    batch_size: usize,
    seed:       u64,
}

impl ProbeUseCase {
    pub fn new(config_path: Option<String>, batch_size: usize, seed: u64) -> Self {
        Self {
            config: ConfigUseCase::new(config_path),
            batch_size,
            seed,
        }
    }

    pub fn execute(&self) -> Result<ProbeReport> {
        let configuration = self.config.load()?;
        run_probe(&configuration, self.batch_size, self.seed)
    }
}
