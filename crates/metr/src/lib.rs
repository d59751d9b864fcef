//! # metr
//!
//! Hierarchical metrics recording.
//!
//! Callers get a [`Metric`] by dotted tag, record integer observations
//! against it, and each observation is delivered as one [`Record`] to the
//! metric's handlers and then to the handlers of every registered
//! ancestor:
//!
//! ```no_run
//! use metr::{get_metric, LoggingHandler, SharedHandler};
//! use tracing::Level;
//!
//! let _metrics = metr::shutdown_guard();
//! let log = SharedHandler::new(LoggingHandler::new(Level::INFO, "metrics"));
//! get_metric("service").add_handler(&log);
//!
//! // Seen by the "service" handler; "service.db" need not be registered
//! get_metric("service.db.query").rec(12)?;
//! # Ok::<(), metr::MetrError>(())
//! ```
//!
//! This crate provides:
//! - The handler abstraction and its shutdown registry
//! - The metric registry and propagation along the tag hierarchy
//! - Single-value, counter and exception recorders
//! - Text, JSON and SQL formatters with null, logging and SQL sinks

mod format;
mod handler;
mod handlers;
mod lifecycle;
mod metric;
mod recorder;
mod registry;

#[cfg(test)]
mod testing;

pub use format::{Formatter, JsonFormatter, SqlRecordFormatter, SqlValue, TextFormatter};
pub use handler::{contain_error, Handler, SharedHandler};
pub use handlers::{
    is_sql_identifier, LoggingHandler, NullHandler, SqlConnection, SqlHandler, DEFAULT_TABLE,
};
pub use lifecycle::{live_handler_count, shutdown_guard, shutdown_handlers, ShutdownGuard};
pub use metric::Metric;
pub use recorder::{error_kind, CounterRecorder, ExceptionRecorder};
pub use registry::{add_metric, ancestor_tags, find_metric, get_metric};

pub use metr_core::{settings, MetrConfig, MetrError, Record, Result};
