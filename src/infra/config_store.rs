// ============================================================
// Layer 6 — Configuration File
// ============================================================
// Reads and writes a ModelConfiguration as pretty-printed JSON.
// Loading does not validate; that is the caller's decision.
//
// File layout:
//   {
//     "name": "base",
//     "input": { "kind": "spatial", "height": 30, "width": 30, "channels": 3 },
//     "categories": 43,
//     "layers": [ { "kind": "convolution", ... }, ... ],
//     "compile": { "optimizer": "adam", ... }
//   }
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::model_config::ModelConfiguration;
use crate::domain::traits::ConfigurationSource;

/// A configuration stored in a single JSON file.
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `configuration` to the file, creating parent directories.
    pub fn save(&self, configuration: &ModelConfiguration) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(configuration)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config to '{}'", self.path.display()))?;

        tracing::debug!("Saved configuration '{}' to '{}'", configuration.name, self.path.display());
        Ok(())
    }
}

impl ConfigurationSource for JsonConfigFile {
    fn load(&self) -> Result<ModelConfiguration> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config from '{}'", self.path.display()))?;

        let configuration: ModelConfiguration = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid model configuration", self.path.display()))?;

        tracing::debug!(
            "Loaded configuration '{}' ({} layers) from '{}'",
            configuration.name,
            configuration.layers.len(),
            self.path.display()
        );
        Ok(configuration)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir  = tempdir().unwrap();
        let file = JsonConfigFile::new(dir.path().join("nested").join("base.json"));

        file.save(&ModelConfiguration::base()).unwrap();
        let loaded = file.load().unwrap();

        assert_eq!(loaded, ModelConfiguration::base());
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir  = tempdir().unwrap();
        let file = JsonConfigFile::new(dir.path().join("absent.json"));
        let err  = file.load().unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "name": "x", "layers": [ { "kind": "lstm" } ] }"#).unwrap();

        let err = JsonConfigFile::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("not a valid model configuration"));
    }
}
