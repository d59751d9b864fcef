//! metr CLI - record metrics from the command line
//!
//! Usage:
//!   metr record <tag> <value>        Record a single value
//!   metr count <tag> <delta>...      Record the sum of several deltas
//!
//! Add `--metrics --metrics-db <path>` to persist records, `--log` to
//! echo them to the log.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metr::{get_metric, LoggingHandler, Metric, SharedHandler};
use metr_cli::{make_sql_handler_from_args, MetricsArgs};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "metr")]
#[command(author, version, about = "Hierarchical metrics from the command line")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write every record to the log
    #[arg(long)]
    log: bool,

    #[command(flatten)]
    metrics: MetricsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a single value
    Record {
        /// Dotted metric tag
        tag: String,

        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Record the sum of several deltas as one value
    Count {
        /// Dotted metric tag
        tag: String,

        #[arg(allow_negative_numbers = true, required = true)]
        deltas: Vec<i64>,
    },
}

impl Commands {
    fn tag(&self) -> &str {
        match self {
            Commands::Record { tag, .. } | Commands::Count { tag, .. } => tag,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli
        .metrics
        .load_config()
        .context("Failed to load metrics config")?;
    config.apply();

    // Flushes and closes every handler on the way out, errors included
    let _shutdown = metr::shutdown_guard();

    let root = root_metric(cli.command.tag());
    root.add_handler(&make_sql_handler_from_args(&cli.metrics, &config)?);
    if cli.log {
        let handler = LoggingHandler::from_config(&config.logging)?;
        root.add_handler(&SharedHandler::new(handler));
    }

    match cli.command {
        Commands::Record { tag, value } => cmd_record(&tag, value),
        Commands::Count { tag, deltas } => cmd_count(&tag, &deltas),
    }
}

/// Handlers go on the first tag segment so every descendant reaches them
fn root_metric(tag: &str) -> Arc<Metric> {
    let root = tag.split('.').next().unwrap_or(tag);
    get_metric(root)
}

fn cmd_record(tag: &str, value: i64) -> Result<()> {
    get_metric(tag).rec(value)?;
    debug!("Recorded {} = {}", tag, value);
    Ok(())
}

fn cmd_count(tag: &str, deltas: &[i64]) -> Result<()> {
    let metric = get_metric(tag);
    let mut counter = metric.rec_counter();
    for delta in deltas {
        counter.add(*delta);
    }
    debug!("Recording {} = {}", tag, counter.value());
    counter.close()?;
    Ok(())
}
