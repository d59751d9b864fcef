//! Command-line wiring for metr.
//!
//! [`MetricsArgs`] can be flattened into any clap CLI to give it
//! `--metrics` options; [`make_sql_handler_from_args`] turns them into a
//! ready handler.

use chrono::Utc;
use clap::Args;
use metr::settings::propagate_exceptions;
use metr::{MetrConfig, NullHandler, SharedHandler, SqlHandler};
use metr_turso::TursoConnection;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Metrics options shared by metr-instrumented commands
#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Send metrics
    #[arg(long)]
    pub metrics: bool,

    /// Metrics database file
    #[arg(long, value_name = "PATH", default_value = ".metr/metrics.db")]
    pub metrics_db: PathBuf,

    /// Metrics table (defaults to the configured table)
    #[arg(long, value_name = "NAME")]
    pub metrics_table: Option<String>,

    /// Config file (defaults to .metr/config.toml)
    #[arg(long, value_name = "FILE")]
    pub metrics_config: Option<PathBuf>,
}

impl MetricsArgs {
    /// Load the config named by `--metrics-config`, or the default one
    pub fn load_config(&self) -> metr::Result<MetrConfig> {
        match &self.metrics_config {
            Some(path) => MetrConfig::load(path),
            None => MetrConfig::load_or_default(Path::new(".")),
        }
    }
}

/// Build the SQL handler the arguments ask for.
///
/// Returns a [`NullHandler`] when metrics are off. A database that
/// cannot be opened is logged and also yields a [`NullHandler`], unless
/// propagation is enabled, in which case the error is returned.
pub fn make_sql_handler_from_args(
    args: &MetricsArgs,
    config: &MetrConfig,
) -> metr::Result<SharedHandler> {
    if !args.metrics {
        return Ok(SharedHandler::new(NullHandler));
    }

    let table = args
        .metrics_table
        .as_deref()
        .unwrap_or(config.sql.table.as_str());

    match open_sql_handler(&args.metrics_db, table) {
        Ok(handler) => {
            info!("Sending metrics to {:?} (table {})", args.metrics_db, table);
            Ok(handler)
        }
        Err(e) if propagate_exceptions() => Err(e),
        Err(e) => {
            error!("Error while creating metrics database connection: {}", e);
            Ok(SharedHandler::new(NullHandler))
        }
    }
}

fn open_sql_handler(path: &Path, table: &str) -> metr::Result<SharedHandler> {
    let mut conn = TursoConnection::open(path)?;
    conn.init_schema(table)?;
    let handler = SqlHandler::new(conn).with_table(table)?;
    Ok(SharedHandler::new(handler))
}

/// Milliseconds since the Unix epoch
pub fn millis_since_epoch() -> i64 {
    Utc::now().timestamp_millis()
}
