use clap::{Args, Parser, Subcommand};
use speval_ai::analysis::legacy_csv::{self, DEFAULT_ACTIVITY_ID};
use speval_ai::analysis::{AnalysisService, AnalysisThresholds};
use speval_ai::config::{parse_threshold, AppConfig};
use speval_ai::error::AppError;
use speval_ai::inference::HostedInference;
use speval_ai::telemetry;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "speval-ai",
    about = "Flag misbehaviour and comment/mark discrepancies in peer evaluations",
    version
)]
struct Cli {
    #[command(flatten)]
    thresholds: ThresholdArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a JSON payload (array of records or one record) and print the result envelope
    Analyze(AnalyzeArgs),
    /// Run the legacy CSV flow and write the flag table
    Csv(CsvArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Read the payload from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CsvArgs {
    /// Evaluation export to analyze
    #[arg(long)]
    input: PathBuf,
    /// Destination of the flag table
    #[arg(long, default_value = "output_dataset.csv")]
    output: PathBuf,
    /// Activity id used when the export carries none
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_ID)]
    spevalid: i64,
}

#[derive(Args, Debug)]
struct ThresholdArgs {
    /// Override the sentiment confidence threshold
    #[arg(long, global = true, value_parser = unit_threshold)]
    conf_threshold: Option<f64>,
    /// Override the polarity/mark gap tolerance
    #[arg(long, global = true, value_parser = gap_threshold)]
    gap_tolerance: Option<f64>,
    /// Override the minimum misbehaviour score
    #[arg(long, global = true, value_parser = unit_threshold)]
    mis_warn_min: Option<f64>,
}

impl ThresholdArgs {
    fn apply(&self, thresholds: &mut AnalysisThresholds) {
        if let Some(value) = self.conf_threshold {
            thresholds.confidence_threshold = value;
        }
        if let Some(value) = self.gap_tolerance {
            thresholds.gap_tolerance = value;
        }
        if let Some(value) = self.mis_warn_min {
            thresholds.misbehaviour_warn_min = value;
        }
    }
}

fn unit_threshold(raw: &str) -> Result<f64, String> {
    parse_threshold("threshold", raw, 1.0).map_err(|err| err.to_string())
}

fn gap_threshold(raw: &str) -> Result<f64, String> {
    parse_threshold("gap tolerance", raw, 2.0).map_err(|err| err.to_string())
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    cli.thresholds.apply(&mut config.thresholds);
    telemetry::init(&config.telemetry)?;

    let models = Arc::new(HostedInference::new(&config.inference)?);
    let service = AnalysisService::new(models.clone(), models, config.thresholds);
    info!(
        environment = ?config.environment,
        thresholds = ?config.thresholds,
        "peer evaluation analyzer ready"
    );

    match cli.command {
        Command::Analyze(args) => {
            let payload = match args.input {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            let batch = service.process_json(&payload);
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer(&mut stdout, &batch)?;
            writeln!(stdout)?;
        }
        Command::Csv(args) => {
            legacy_csv::analyze_csv_file(&service, &args.input, &args.output, args.spevalid)?;
            println!("Results saved to: {}", args.output.display());
        }
    }

    Ok(())
}
