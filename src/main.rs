//! hidewatch CLI - detect root-hiding and tamper frameworks.
//!
//! `hidewatch detect` (the default) runs every check and prints a report.
//! `hidewatch probe` is the tracer probe's entry point; it is started by the
//! detector itself and is not meant to be run by hand.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hidewatch::config::{DEFAULT_NICE_NAME, DEFAULT_PROBE_DELAY_MS, DEFAULT_TOUCH_PATH};
use hidewatch::logging::{init_tracing, init_tracing_json};
use hidewatch::tracer::child::{self, ProbeArgs};
use hidewatch::tracer::status::SELF_STATUS;
use hidewatch::{DetectConfig, Detector};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "hidewatch")]
#[command(version = VERSION)]
#[command(about = "Detect root-hiding and tamper frameworks")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the report and logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks and print the result
    Detect,

    /// Tracer probe entry point
    #[command(hide = true)]
    Probe {
        /// Inherited write end of the probe channel
        #[arg(long, allow_negative_numbers = true)]
        write_fd: i32,

        #[arg(long, default_value_t = DEFAULT_PROBE_DELAY_MS)]
        delay_ms: u64,

        #[arg(long, default_value = DEFAULT_TOUCH_PATH)]
        touch: PathBuf,

        #[arg(long, default_value = DEFAULT_NICE_NAME)]
        nice_name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    if cli.json {
        init_tracing_json(level);
    } else {
        init_tracing(level);
    }

    let outcome = match cli.command.unwrap_or(Commands::Detect) {
        Commands::Detect => run_detect(cli.config, cli.json),
        Commands::Probe {
            write_fd,
            delay_ms,
            touch,
            nice_name,
        } => run_probe(ProbeArgs {
            write_fd,
            nice_name,
            touch_path: touch,
            delay: Duration::from_millis(delay_ms),
            status_path: PathBuf::from(SELF_STATUS),
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hidewatch failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_detect(config: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => DetectConfig::from_json_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DetectConfig::default(),
    };
    let result = Detector::new(config)
        .context("initializing detector")?
        .detect()
        .context("running detection")?;

    let report = result.report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn run_probe(args: ProbeArgs) -> anyhow::Result<()> {
    child::run(&args).context("tracer probe")?;
    Ok(())
}
