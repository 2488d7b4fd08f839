// ============================================================
// Layer 2 — ExperimentsUseCase
// ============================================================
// Reads, extends and exports the experiment log.

use anyhow::Result;

use crate::domain::experiment::{ExperimentLog, ExperimentRecord};
use crate::domain::traits::ExperimentSink;
use crate::infra::{experiment_store::ExperimentStore, metrics::MetricsCsv};

pub struct ExperimentsUseCase {
    store: ExperimentStore,
}

impl ExperimentsUseCase {
    pub fn new(log_path: impl Into<String>) -> Self {
        Self { store: ExperimentStore::new(log_path.into()) }
    }

    pub fn list(&self) -> Result<ExperimentLog> {
        self.store.load()
    }

    /// The most accurate measured experiment and its accuracy change
    /// relative to the baseline.
    pub fn best(&self) -> Result<Option<(ExperimentRecord, Option<f64>)>> {
        let log = self.store.load()?;
        Ok(log
            .best_by_accuracy()
            .map(|best| (best.clone(), log.accuracy_delta(best))))
    }

    pub fn record(&self, record: ExperimentRecord) -> Result<()> {
        self.store.append(record)
    }

    /// Write the log to `csv_path`, returning the number of rows.
    pub fn export(&self, csv_path: &str) -> Result<usize> {
        let log  = self.store.load()?;
        let rows = MetricsCsv::new(csv_path).export(&log)?;
        tracing::info!("Exported {} experiments to '{}'", rows, csv_path);
        Ok(rows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{RunMetrics, Variation};
    use tempfile::tempdir;

    #[test]
    fn test_best_is_baseline_for_seeded_log() {
        let dir      = tempdir().unwrap();
        let use_case = ExperimentsUseCase::new(dir.path().join("log.json").to_string_lossy());

        let (best, delta) = use_case.best().unwrap().unwrap();
        assert_eq!(best.id, "base");
        assert_eq!(delta, Some(0.0));
    }

    #[test]
    fn test_recorded_run_can_become_best() {
        let dir      = tempdir().unwrap();
        let use_case = ExperimentsUseCase::new(dir.path().join("log.json").to_string_lossy());

        use_case
            .record(
                ExperimentRecord::new("f64", "64/64 filters", Variation::FilterCount, "wider first stage")
                    .with_metrics(RunMetrics::new(0.9700, 0.1300)),
            )
            .unwrap();

        let (best, delta) = use_case.best().unwrap().unwrap();
        assert_eq!(best.id, "f64");
        assert!((delta.unwrap() - 0.008).abs() < 1e-9);
    }

    #[test]
    fn test_export_writes_all_rows() {
        let dir      = tempdir().unwrap();
        let use_case = ExperimentsUseCase::new(dir.path().join("log.json").to_string_lossy());
        let csv      = dir.path().join("out.csv");

        let rows = use_case.export(&csv.to_string_lossy()).unwrap();
        assert_eq!(rows, ExperimentLog::seeded().len());
        assert!(csv.exists());
    }
}
