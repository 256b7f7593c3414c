mod config;
mod error;
mod loader;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use synthscope_eval::{EvaluationEngine, MetricRegistry, ScoreScale};

use error::CliResult;

#[derive(Parser, Debug)]
#[command(name = "synthscope", version, about = "Synthetic data evaluation")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a synthetic CSV against a real CSV.
    Evaluate(EvaluateArgs),
    /// List the registered metrics.
    Metrics,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Real dataset (CSV with header row).
    #[arg(long, value_name = "CSV")]
    real: PathBuf,
    /// Synthetic dataset (CSV with header row).
    #[arg(long, value_name = "CSV")]
    synthetic: PathBuf,
    /// TOML file with evaluation options.
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,
    /// Metric id or category to run; repeat for more. Defaults to all.
    #[arg(long = "metric", value_name = "ID")]
    metrics: Vec<String>,
    /// Target column for utility metrics.
    #[arg(long)]
    target: Option<String>,
    /// Run seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads.
    #[arg(long)]
    workers: Option<usize>,
    /// Default per-metric timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Output directory for report.json and report.md.
    #[arg(long, default_value = "synthscope-report")]
    out: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    logging::init_logging(cli.log_json)?;
    match cli.command {
        Command::Evaluate(args) => run_evaluate(args),
        Command::Metrics => run_metrics(),
    }
}

fn run_evaluate(args: EvaluateArgs) -> CliResult<()> {
    let mut options = config::load_options(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        options.seed = seed;
    }
    if args.target.is_some() {
        options.target_column = args.target;
    }
    if args.workers.is_some() {
        options.workers = args.workers;
    }
    if args.timeout_ms.is_some() {
        options.timeout_ms = args.timeout_ms;
    }

    let real = loader::load_csv(&args.real)?;
    let synthetic = loader::load_csv(&args.synthetic)?;
    tracing::info!(
        real = %args.real.display(),
        synthetic = %args.synthetic.display(),
        "datasets loaded"
    );

    let engine = EvaluationEngine::with_builtins(options);
    let report = engine.run(real, synthetic, args.metrics.as_slice())?;
    let written = output::write_report(&args.out, &report)?;

    println!("report_json={}", written.json_path.display());
    println!("report_md={}", written.markdown_path.display());
    Ok(())
}

fn run_metrics() -> CliResult<()> {
    let registry = MetricRegistry::with_builtins();
    for descriptor in registry.descriptors() {
        let orientation = match descriptor.orientation {
            synthscope_eval::Orientation::HigherIsBetter => "higher",
            synthscope_eval::Orientation::LowerIsBetter => "lower",
        };
        println!(
            "{}\t{}\t{}\t{} is better\tweight={}\tdatasets={}\t{}",
            descriptor.id,
            descriptor.category,
            scale_label(&descriptor.scale),
            orientation,
            descriptor.default_weight,
            descriptor.datasets.as_str(),
            descriptor.description
        );
    }
    Ok(())
}

fn scale_label(scale: &ScoreScale) -> String {
    match scale {
        ScoreScale::Linear { lo, hi } => format!("linear[{lo},{hi}]"),
        ScoreScale::Saturating => "saturating".to_string(),
        ScoreScale::Exponential { rate } => format!("exponential({rate})"),
    }
}
