// ============================================================
// Layer 3 — Experiment Log
// ============================================================
// Free-text notes on how changes to the base stack affected
// evaluation results. Only runs that were actually measured
// carry metrics; the rest are observations.

use std::fmt;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Evaluation result of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Fraction of test images classified correctly, in [0, 1]
    pub accuracy: f64,
    pub loss:     f64,
}

impl RunMetrics {
    pub fn new(accuracy: f64, loss: f64) -> Self {
        Self { accuracy, loss }
    }

    /// Accuracy must lie in [0, 1] and loss must be finite and non-negative.
    /// JSON has no NaN or infinity, so such values could not be read back.
    pub fn check(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.accuracy) {
            bail!("accuracy {} is outside [0, 1]", self.accuracy);
        }
        if !self.loss.is_finite() || self.loss < 0.0 {
            bail!("loss {} must be a finite, non-negative number", self.loss);
        }
        Ok(())
    }
}

/// Which aspect of the base stack an experiment changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variation {
    Baseline,
    LayerCount,
    FilterCount,
    Dropout,
    Other,
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variation::Baseline    => "baseline",
            Variation::LayerCount  => "layer_count",
            Variation::FilterCount => "filter_count",
            Variation::Dropout     => "dropout",
            Variation::Other       => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Unique within a log
    pub id:          String,
    pub title:       String,
    pub variation:   Variation,
    pub observation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics:     Option<RunMetrics>,
}

impl ExperimentRecord {
    pub fn new(
        id:          impl Into<String>,
        title:       impl Into<String>,
        variation:   Variation,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            id:          id.into(),
            title:       title.into(),
            variation,
            observation: observation.into(),
            metrics:     None,
        }
    }

    pub fn with_metrics(mut self, metrics: RunMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentLog {
    pub records: Vec<ExperimentRecord>,
}

impl ExperimentLog {
    /// The log that ships with the crate.
    pub fn seeded() -> Self {
        let records = vec![
            ExperimentRecord::new(
                "base",
                "Two conv/pool stages, dense 128 + dropout 0.5",
                Variation::Baseline,
                "Reference configuration. 32 then 64 filters of 3x3, 2x2 max pooling \
                 after each, one 128-unit relu layer with 0.5 dropout before the \
                 softmax output.",
            )
            .with_metrics(RunMetrics::new(0.9620, 0.1484)),
            ExperimentRecord::new(
                "layers",
                "More or fewer conv/pool stages",
                Variation::LayerCount,
                "Compared against the baseline accuracy. With one conv/pool stage the \
                 map stays at 14x14x32, so the first dense layer sees 6272 inputs \
                 instead of 2304. A fourth 3x3 conv/pool stage no longer fits the \
                 30x30 input.",
            ),
            ExperimentRecord::new(
                "filters",
                "Changing filter counts",
                Variation::FilterCount,
                "Compared against the baseline accuracy. Each extra channel in the \
                 second convolution adds 36 inputs (6x6 positions) to the first dense \
                 layer, so filter counts drive most of the parameter budget.",
            ),
            ExperimentRecord::new(
                "dropout",
                "Changing the dropout rate",
                Variation::Dropout,
                "Compared against the baseline accuracy. Dropout only acts while \
                 training and adds no parameters, so the rate can be varied without \
                 touching the rest of the stack.",
            ),
        ];
        Self { records }
    }

    /// Append a record, rejecting duplicate ids and unusable metrics.
    pub fn push(&mut self, record: ExperimentRecord) -> Result<()> {
        if self.records.iter().any(|r| r.id == record.id) {
            bail!("experiment '{}' is already in the log", record.id);
        }
        if let Some(metrics) = &record.metrics {
            metrics
                .check()
                .with_context(|| format!("experiment '{}' has invalid metrics", record.id))?;
        }
        self.records.push(record);
        Ok(())
    }

    pub fn baseline(&self) -> Option<&ExperimentRecord> {
        self.records.iter().find(|r| r.variation == Variation::Baseline)
    }

    pub fn by_variation(&self, variation: Variation) -> impl Iterator<Item = &ExperimentRecord> {
        self.records.iter().filter(move |r| r.variation == variation)
    }

    /// The measured record with the highest accuracy.
    pub fn best_by_accuracy(&self) -> Option<&ExperimentRecord> {
        self.records
            .iter()
            .filter_map(|r| r.metrics.map(|m| (r, m.accuracy)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(r, _)| r)
    }

    /// Accuracy difference from the baseline, when both were measured.
    pub fn accuracy_delta(&self, record: &ExperimentRecord) -> Option<f64> {
        let base = self.baseline()?.metrics?;
        record.metrics.map(|m| m.accuracy - base.accuracy)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
