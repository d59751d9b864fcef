//! Bundled sinks

mod logging;
mod null;
mod sql;

pub use logging::LoggingHandler;
pub use null::NullHandler;
pub use sql::{is_sql_identifier, SqlConnection, SqlHandler, DEFAULT_TABLE};
