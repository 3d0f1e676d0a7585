//! aidsteps CLI: build, split, check and evaluate first-aid instruction datasets.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// aidsteps: step-by-step first-aid dataset tooling
#[derive(Parser, Debug)]
#[command(name = "aidsteps", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (relative data paths resolve against it)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Additional configuration file merged over the workspace config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Expand the emergency catalog into one example per phrase
    Expand {
        /// Catalog file (defaults to data.catalog_path)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Shuffle the expanded dataset and write train/validation/test files
    Split {
        /// Expanded dataset (defaults to the configured expanded file)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override the shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Expand and split in one go
    Build {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run dataset quality checks over a JSONL file
    Check {
        /// File to check (defaults to the expanded dataset)
        path: Option<PathBuf>,
    },
    /// Show emergency-type distribution across the persisted splits
    Analyze,
    /// Convert a JSONL dataset to ShareGPT conversations
    ExportSharegpt {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate one generated response (file or stdin)
    ValidateOutput {
        /// File holding the generated text; reads stdin when omitted
        file: Option<PathBuf>,
        /// Emergency description to score relevance against
        #[arg(long)]
        input: Option<String>,
    },
    /// Evaluate a served model against the test split
    Evaluate {
        /// Model name (defaults to evaluation.model)
        #[arg(short, long)]
        model: Option<String>,
        /// Server base URL (defaults to evaluation.base_url)
        #[arg(long)]
        base_url: Option<String>,
        /// Only evaluate the first N test examples
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "aidsteps", "aidsteps")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "aidsteps.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref()).await
}
