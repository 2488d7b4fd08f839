// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Subcommands:
//   init         write the base configuration as JSON
//   describe     print the layer table with shapes and params
//   check        validate a configuration file
//   probe        run one forward pass on a synthetic batch
//   experiments  list / best / record / export the experiment log
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::domain::experiment::{ExperimentRecord, RunMetrics, Variation};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the base configuration to a JSON file
    Init(InitArgs),

    /// Print every layer with its input/output shape and parameter count
    Describe(DescribeArgs),

    /// Validate a configuration file; exits non-zero when invalid
    Check(CheckArgs),

    /// Build the model and run one forward pass on a synthetic batch
    Probe(ProbeArgs),

    /// Work with the experiment log
    Experiments(ExperimentsArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration
    #[arg(long, default_value = "model.json")]
    pub out: String,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Configuration file; the built-in base architecture when omitted
    #[arg(long)]
    pub config: Option<String>,

    /// Print the trace as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration file to validate
    #[arg(long)]
    pub config: String,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Configuration file; the built-in base architecture when omitted
    #[arg(long)]
    pub config: Option<String>,

    /// Number of synthetic images in the batch
    #[arg(long, default_value_t = 4)]
    pub batch: usize,

    /// Seed for the synthetic pixels
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct ExperimentsArgs {
    /// Experiment log file; the built-in log is used until it exists
    #[arg(long, default_value = "experiments.json")]
    pub log: String,

    #[command(subcommand)]
    pub action: ExperimentAction,
}

#[derive(Subcommand, Debug)]
pub enum ExperimentAction {
    /// Show every experiment, optionally only one kind of variation
    List {
        #[arg(long, value_enum)]
        variation: Option<VariationArg>,
    },

    /// Show the most accurate measured experiment
    Best,

    /// Add an experiment to the log
    Record(RecordArgs),

    /// Write the log as CSV
    Export {
        #[arg(long, default_value = "experiments.csv")]
        csv: String,
    },
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Unique id for the experiment
    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub title: String,

    /// Which part of the stack was changed
    #[arg(long, value_enum, default_value_t = VariationArg::Other)]
    pub variation: VariationArg,

    /// What was observed
    #[arg(long)]
    pub observation: String,

    /// Test accuracy, if the run was measured
    #[arg(long, requires = "loss")]
    pub accuracy: Option<f64>,

    /// Test loss, if the run was measured
    #[arg(long, requires = "accuracy")]
    pub loss: Option<f64>,
}

/// clap-side mirror of the domain Variation
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VariationArg {
    Baseline,
    LayerCount,
    FilterCount,
    Dropout,
    Other,
}

impl From<VariationArg> for Variation {
    fn from(v: VariationArg) -> Self {
        match v {
            VariationArg::Baseline    => Variation::Baseline,
            VariationArg::LayerCount  => Variation::LayerCount,
            VariationArg::FilterCount => Variation::FilterCount,
            VariationArg::Dropout     => Variation::Dropout,
            VariationArg::Other       => Variation::Other,
        }
    }
}

/// The application layer never sees clap types.
impl From<RecordArgs> for ExperimentRecord {
    fn from(a: RecordArgs) -> Self {
        let record = ExperimentRecord::new(a.id, a.title, a.variation.into(), a.observation);
        match (a.accuracy, a.loss) {
            (Some(accuracy), Some(loss)) => record.with_metrics(RunMetrics::new(accuracy, loss)),
            _ => record,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_record_args_become_measured_record() {
        let cli = Cli::try_parse_from([
            "traffic-cnn", "experiments", "record",
            "--id", "d03", "--title", "dropout 0.3", "--variation", "dropout",
            "--observation", "lower rate", "--accuracy", "0.95", "--loss", "0.2",
        ])
        .unwrap();

        let Commands::Experiments(ExperimentsArgs { action: ExperimentAction::Record(args), .. }) = cli.command else {
            panic!("expected experiments record");
        };
        let record: ExperimentRecord = args.into();
        assert_eq!(record.variation, Variation::Dropout);
        assert_eq!(record.metrics, Some(RunMetrics::new(0.95, 0.2)));
    }

    #[test]
    fn test_accuracy_requires_loss() {
        let result = Cli::try_parse_from([
            "traffic-cnn", "experiments", "record",
            "--id", "x", "--title", "t", "--observation", "o", "--accuracy", "0.9",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_probe_defaults() {
        let cli = Cli::try_parse_from(["traffic-cnn", "probe"]).unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(args.batch, 4);
        assert_eq!(args.seed, 42);
        assert!(args.config.is_none());
    }
}
