// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, routes each subcommand to its use
// case in Layer 2, and prints the result. Nothing here computes.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{
    CheckArgs, Commands, DescribeArgs, ExperimentAction, ExperimentsArgs, InitArgs, ProbeArgs,
};

use crate::domain::experiment::ExperimentRecord;
use crate::application::{
    config_use_case::ConfigUseCase,
    experiments_use_case::ExperimentsUseCase,
    probe_use_case::ProbeUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "traffic-cnn",
    version,
    about = "Describe, check and probe a traffic-sign CNN layer stack, and keep its experiment log."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)        => run_init(args),
            Commands::Describe(args)    => run_describe(args),
            Commands::Check(args)       => run_check(args),
            Commands::Probe(args)       => run_probe(args),
            Commands::Experiments(args) => run_experiments(args),
        }
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    ConfigUseCase::init(&args.out)?;
    println!("Base configuration written to {}", args.out);
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    let (configuration, trace) = ConfigUseCase::new(args.config).describe()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    println!("Model '{}'  input {}  categories {}", configuration.name, trace.input, configuration.categories);
    println!("{trace}");
    let trainable = configuration.layers.iter().filter(|l| l.is_trainable()).count();
    println!(
        "conv stages {}, hidden dense {}, dropout {:?}, trainable layers {}",
        configuration.conv_stages(),
        configuration.dense_hidden_layers(),
        configuration.dropout_rates(),
        trainable
    );
    let compile = &configuration.compile;
    println!(
        "compiled with {} / {} / {:?}, {} epochs, test split {}",
        compile.optimizer, compile.loss, compile.metrics, compile.epochs, compile.test_split
    );
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let (configuration, trace) = ConfigUseCase::new(Some(args.config.clone())).describe()?;
    println!(
        "{}: OK ('{}', {} layers, output {})",
        args.config,
        configuration.name,
        trace.rows.len(),
        trace.output()
    );
    Ok(())
}

fn run_probe(args: ProbeArgs) -> Result<()> {
    let report = ProbeUseCase::new(args.config, args.batch, args.seed).execute()?;

    println!("batch       {}", report.batch_size);
    println!("output      {:?}", report.output_dims);
    println!("params      {}", report.num_params);
    println!("predictions {:?}", report.predictions);
    match report.is_distribution {
        Some(true)  => println!("softmax     every row sums to 1"),
        Some(false) => println!("softmax     rows do NOT sum to 1: {:?}", report.row_sums),
        None        => println!("softmax     n/a (final activation is not softmax)"),
    }
    Ok(())
}

fn run_experiments(args: ExperimentsArgs) -> Result<()> {
    let use_case = ExperimentsUseCase::new(args.log);

    match args.action {
        ExperimentAction::List { variation } => {
            let log = use_case.list()?;
            if log.is_empty() {
                println!("The experiment log is empty.");
            }
            let records: Vec<&ExperimentRecord> = match variation {
                Some(v) => log.by_variation(v.into()).collect(),
                None    => log.records.iter().collect(),
            };
            for record in records {
                let metrics = record
                    .metrics
                    .map(|m| format!("acc={:.4} loss={:.4}", m.accuracy, m.loss))
                    .unwrap_or_else(|| "not measured".to_string());
                println!("[{}] {} ({}) — {}", record.id, record.title, record.variation, metrics);
                println!("    {}", record.observation);
            }
        }
        ExperimentAction::Best => match use_case.best()? {
            Some((best, delta)) => {
                println!("Best: [{}] {}", best.id, best.title);
                if let Some(m) = best.metrics {
                    println!("  accuracy={:.4} loss={:.4}", m.accuracy, m.loss);
                }
                if let Some(delta) = delta {
                    println!("  vs baseline: {:+.4}", delta);
                }
            }
            None => println!("No measured experiments in the log."),
        },
        ExperimentAction::Record(record) => {
            let record = record.into();
            use_case.record(record)?;
            println!("Experiment recorded.");
        }
        ExperimentAction::Export { csv } => {
            let rows = use_case.export(&csv)?;
            println!("Wrote {rows} experiments to {csv}");
        }
    }
    Ok(())
}
