// ============================================================
// Layer 6 — Metrics CSV Export
// ============================================================
// Writes the experiment log as CSV, one row per experiment,
// for plotting or pasting into a report.
//
// Columns:
//   id,title,variation,accuracy,loss
//
// Unmeasured experiments leave accuracy and loss empty.
//
// Example:
//   id,title,variation,accuracy,loss
//   base,"Two conv/pool stages, dense 128 + dropout 0.5",baseline,0.962000,0.148400
//   layers,More or fewer conv/pool stages,layer_count,,
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::domain::experiment::{ExperimentLog, ExperimentRecord};

const HEADER: &str = "id,title,variation,accuracy,loss";

pub struct MetricsCsv {
    csv_path: PathBuf,
}

impl MetricsCsv {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into() }
    }

    /// Overwrite the CSV with every record in `log`. Returns the row count.
    pub fn export(&self, log: &ExperimentLog) -> Result<usize> {
        if let Some(parent) = self.csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "{HEADER}")?;
        for record in &log.records {
            writeln!(w, "{}", csv_row(record))?;
        }
        w.flush()?;

        tracing::debug!("Exported {} experiments to '{}'", log.len(), self.csv_path.display());
        Ok(log.len())
    }
}

fn csv_row(record: &ExperimentRecord) -> String {
    let (accuracy, loss) = match record.metrics {
        Some(m) => (format!("{:.6}", m.accuracy), format!("{:.6}", m.loss)),
        None    => (String::new(), String::new()),
    };
    format!(
        "{},{},{},{},{}",
        csv_field(&record.id),
        csv_field(&record.title),
        record.variation,
        accuracy,
        loss,
    )
}

/// Quote a field if it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
