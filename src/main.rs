use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analyzer::config::{AnalyzerConfig, CONFIG_FILENAME};
use analyzer::error::PipelineError;
use analyzer::pipeline::Pipeline;
use analyzer::registry::{LoaderMode, StageRegistry};

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(version, about = "Streaming text analyzer: runs lines through a pipeline of transform stages", long_about = None)]
struct Cli {
    /// Maximum number of lines buffered by each stage's queue
    queue_size: String,

    /// Names of the stages to run, in pipeline order
    #[arg(required = true)]
    stages: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// Usage text printed to stdout on argument errors, listing the built-in
/// stages from the registry.
fn print_usage(registry: &StageRegistry) {
    println!("Usage: analyzer <queue_size> <stage1> <stage2> ... <stageN>");
    println!();
    println!("Arguments:");
    println!("  queue_size  Maximum number of lines buffered by each stage's queue");
    println!("  stage1..N   Names of the stages to run, in pipeline order");
    println!();
    println!("Available stages:");
    for descriptor in registry.descriptors() {
        println!("  {:<11} - {}", descriptor.name, descriptor.summary);
    }
    println!();
    println!("Examples:");
    println!("  analyzer 20 uppercaser rotator logger");
    println!("  printf 'hello\\n<END>\\n' | analyzer 20 uppercaser rotator logger");
}

fn report_error(err: &PipelineError) {
    eprintln!("{} {err}", "error:".red().bold());
}

fn parse_queue_size(raw: &str) -> Result<usize, PipelineError> {
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n as usize),
        _ => Err(PipelineError::Usage(format!(
            "invalid queue size (must be greater than 0): '{raw}'"
        ))),
    }
}

fn init_tracing(cli: &Cli) {
    let filter_layer = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    // Diagnostics go to stderr; stdout belongs to the transforms.
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli, registry: &StageRegistry) -> Result<(), PipelineError> {
    let config = AnalyzerConfig::load_optional()
        .map_err(|err| PipelineError::Config(format!("invalid {CONFIG_FILENAME}: {err:#}")))?
        .unwrap_or_default();

    let queue_size = parse_queue_size(&cli.queue_size)?;
    let mode = LoaderMode::detect(&config);
    info!(?mode, queue_size, stages = ?cli.stages, "starting pipeline");

    let pipeline = Pipeline::build(queue_size, &cli.stages, registry, mode, &config)?;

    // Shutdown is attempted even when feeding fails; the feed error wins.
    let stdin = std::io::stdin();
    let feed_result = pipeline.feed(stdin.lock(), config.input.max_line_bytes);
    let shutdown_result = pipeline.shutdown();
    feed_result?;
    shutdown_result
}

fn main() {
    let registry = StageRegistry::builtin();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return;
            }
            ErrorKind::MissingRequiredArgument => {
                eprintln!("{} Missing arguments", "error:".red().bold());
                print_usage(&registry);
                std::process::exit(1);
            }
            _ => {
                eprintln!("{} {}", "error:".red().bold(), err.kind());
                print_usage(&registry);
                std::process::exit(1);
            }
        },
    };

    init_tracing(&cli);
    info!("analyzer v{}", env!("CARGO_PKG_VERSION"));

    match run(cli, &registry) {
        Ok(()) => println!("Pipeline shutdown complete"),
        Err(err) => {
            report_error(&err);
            if err.is_usage() {
                print_usage(&registry);
            }
            std::process::exit(err.exit_code());
        }
    }
}
