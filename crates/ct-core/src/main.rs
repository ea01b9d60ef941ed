//! Conjunction Triage Core - forecasting and decision engine
//!
//! The main entry point for ct-core, handling:
//! - Ingesting raw CDM record batches from JSON files
//! - Running the grouping → sequence → forecast → assess pipeline
//! - Validating configuration and model weights
//! - Emitting machine-readable reports and progress events

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ct_common::{CdmRecord, Error, OutputFormat};
use ct_core::events::{JsonlWriter, ProgressEmitter};
use ct_core::exit_codes::ExitCode;
use ct_core::logging::{init_logging, LogConfig, LogFormat};
use ct_core::pipeline::{run_batch, BatchOptions, BatchReport, InferenceContext};
use ct_config::load_resolved;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Conjunction Triage Core - temporal collision risk assessment
#[derive(Parser)]
#[command(name = "ct-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.yaml
    #[arg(long, global = true, env = "CT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log filter (e.g. "info", "ct_core=debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Emit JSONL progress events on stderr
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over a JSON array of CDM records
    Infer {
        /// Input file with raw CDM records
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Evaluate deadlines against this instant instead of each event's
        /// latest record time (RFC 3339)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,

        /// Seed for Monte Carlo sampling (reproducible runs)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate configuration and model weights, then exit
    Check,
    /// Print the JSON schema of the batch report
    Schema,
}

fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig::from_env(
        cli.global.log_level.as_deref(),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(code = e.code(), category = %e.category(), "{e}");
            eprintln!("✗ {e}");
            eprintln!("  Fix: {}", e.remediation());
            ExitCode::from(&e)
        }
    };
    std::process::exit(code.code());
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let resolved = load_resolved(cli.global.config.as_deref())
        .map_err(|e| Error::Config(e.to_string()))?;
    info!(source = %resolved.source, "configuration loaded");

    match &cli.command {
        Commands::Infer { input, as_of, seed } => {
            let ctx = InferenceContext::from_config(resolved.config)?;
            let text = std::fs::read_to_string(input)?;
            let records: Vec<CdmRecord> = serde_json::from_str(&text)?;

            let emitter = cli
                .global
                .progress
                .then(|| JsonlWriter::new(std::io::stderr()));
            let report = run_batch(
                &records,
                &ctx,
                BatchOptions {
                    as_of: *as_of,
                    rng_seed: *seed,
                },
                emitter.as_ref().map(|e| e as &dyn ProgressEmitter),
            );

            for rejected in &report.rejected {
                let e = rejected.to_error();
                warn!(code = e.code(), index = rejected.index, "{e}");
            }

            print_report(&report, cli.global.format)?;
            if report.summary.events_failed > 0 {
                return Ok(ExitCode::PartialFailure);
            }
            Ok(ExitCode::Success)
        }
        Commands::Check => {
            // Surface weights problems now rather than on the first batch.
            InferenceContext::from_config(resolved.config)?;
            println!("configuration and weights OK");
            Ok(ExitCode::Success)
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(BatchReport);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::Success)
        }
    }
}

fn print_report(report: &BatchReport, format: OutputFormat) -> Result<(), Error> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Jsonl => {
            println!("{}", serde_json::to_string(&report.summary)?);
            for outcome in &report.outcomes {
                println!("{}", serde_json::to_string(outcome)?);
            }
            for rejected in &report.rejected {
                println!("{}", serde_json::to_string(rejected)?);
            }
        }
        OutputFormat::Summary => {
            let s = &report.summary;
            println!(
                "{} events assessed ({} escalating, {} stable, {} resolving), {} failed, {} records rejected, {} past deadline, mean certainty {:.3}",
                s.events_assessed,
                s.escalating,
                s.stable,
                s.resolving,
                s.events_failed,
                s.rejected_records,
                s.past_deadline,
                s.mean_certainty,
            );
        }
    }
    Ok(())
}
