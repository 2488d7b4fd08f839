// ============================================================
// Layer 6 — Experiment Log Store
// ============================================================
// Persists the ExperimentLog as a JSON file. A missing file is
// not an error: the seeded log is returned instead, so the
// shipped observations are always available.

use anyhow::{Context, Result};
use std::{fs, io::ErrorKind, path::PathBuf};

use crate::domain::experiment::{ExperimentLog, ExperimentRecord};
use crate::domain::traits::ExperimentSink;

pub struct ExperimentStore {
    path: PathBuf,
}

impl ExperimentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the log, falling back to the seeded log when the file is absent.
    pub fn load(&self) -> Result<ExperimentLog> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    "Experiment log '{}' does not exist, using the built-in log",
                    self.path.display()
                );
                return Ok(ExperimentLog::seeded());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Cannot read experiment log '{}'", self.path.display())
                });
            }
        };

        let log: ExperimentLog = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid experiment log", self.path.display()))?;

        tracing::debug!("Loaded {} experiments from '{}'", log.len(), self.path.display());
        Ok(log)
    }

    pub fn save(&self, log: &ExperimentLog) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(log)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write experiment log '{}'", self.path.display()))?;

        tracing::debug!("Saved {} experiments to '{}'", log.len(), self.path.display());
        Ok(())
    }
}

impl ExperimentSink for ExperimentStore {
    fn append(&self, record: ExperimentRecord) -> Result<()> {
        let mut log = self.load()?;
        let id      = record.id.clone();
        log.push(record)?;
        self.save(&log)?;
        tracing::info!("Recorded experiment '{}'", id);
        Ok(())
    }
}
