//! loadpipe CLI: run adapter pipelines and sanitize load-test output.
//!
//! Usage:
//!   loadpipe run <pipeline.yaml> [--override file]... [--set key=value]... [--parallel] [--collect]
//!   loadpipe sanitize <events.json> [--view full|summary|digest] [--kind trend]

use clap::{Parser, Subcommand, ValueEnum};
use loadpipe::config::{collect_overrides, PipelineFile};
use loadpipe::{MetricKind, Sanitizer};
use serde::Serialize;
use std::path::PathBuf;

const ENV_LOG: &str = "LOADPIPE_LOG";

#[derive(Parser)]
#[command(
    name = "loadpipe",
    version,
    about = "Adapter pipelines for load-test metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the adapters listed in a pipeline file
    Run {
        /// Pipeline file (YAML or JSON)
        pipeline: PathBuf,
        /// Override file merged onto the adapter configs (repeatable)
        #[arg(long = "override", value_name = "FILE")]
        overrides: Vec<PathBuf>,
        /// Single override, e.g. `smoke.vus=10` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,
        /// Start all adapters together
        #[arg(long)]
        parallel: bool,
        /// Keep going after failures and report every adapter's outcome
        #[arg(long)]
        collect: bool,
    },
    /// Sanitize a recorded event stream and print it as JSON
    Sanitize {
        /// Newline-delimited JSON written by the load generator
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = View::Full)]
        view: View,
        /// Only metrics of this kind (gauge, counter, trend, rate, unknown)
        #[arg(long)]
        kind: Option<MetricKind>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    /// Reports with point series
    Full,
    /// Reports without point series
    Summary,
    /// Unit, latest value and summary per metric
    Digest,
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn print_json(value: &impl Serialize) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_sanitize(file: &PathBuf, view: View, kind: Option<MetricKind>) -> i32 {
    let sanitizer = match Sanitizer::from_path(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return 1;
        }
    };
    let wanted = |k: MetricKind| kind.map_or(true, |want| want == k);

    match view {
        View::Full => {
            let reports: Vec<_> = sanitizer.reports().iter().filter(|r| wanted(r.kind)).collect();
            print_json(&reports)
        }
        View::Summary => {
            let mut summaries = sanitizer.summaries();
            summaries.retain(|_, o| wanted(o.kind));
            print_json(&summaries)
        }
        View::Digest => {
            let mut digest = sanitizer.digest();
            digest.retain(|name, _| sanitizer.get(name).map_or(false, |r| wanted(r.kind)));
            print_json(&digest)
        }
    }
}

fn cmd_run(
    pipeline: &PathBuf,
    overrides: &[PathBuf],
    assignments: &[String],
    parallel: bool,
    collect: bool,
) -> i32 {
    let file = match PipelineFile::load(pipeline) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let built = match file.build() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let overrides = match collect_overrides(overrides, assignments) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut options = file.options.clone();
    options.run_in_parallel |= parallel;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        if collect {
            let outcome = match built.run_collect(overrides.as_ref(), &options).await {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            };
            let code = print_json(&outcome);
            if outcome.is_success() {
                code
            } else {
                1
            }
        } else {
            match built.run(overrides.as_ref(), &options).await {
                Ok(result) => print_json(&result),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    })
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            pipeline,
            overrides,
            assignments,
            parallel,
            collect,
        } => cmd_run(&pipeline, &overrides, &assignments, parallel, collect),
        Commands::Sanitize { file, view, kind } => cmd_sanitize(&file, view, kind),
    };
    std::process::exit(code);
}
