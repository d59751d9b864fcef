//! metr-turso - embedded database backend for the metr SQL sink
//!
//! [`TursoConnection`] implements [`metr::SqlConnection`] on top of a
//! local Turso (SQLite-compatible) database file, so records can be
//! persisted with [`metr::SqlHandler`]:
//!
//! ```text
//! Metric ──► SharedHandler(SqlHandler) ──► TursoConnection ──► metrics.db
//!                                             (WAL mode)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use metr::{get_metric, SharedHandler, SqlHandler};
//! use metr_turso::TursoConnection;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = TursoConnection::open(".metr/metrics.db")?;
//! conn.init_schema("metrics")?;
//!
//! let handler = SharedHandler::new(SqlHandler::new(conn));
//! get_metric("service").add_handler(&handler);
//! get_metric("service.requests").rec(1)?;
//! # Ok(())
//! # }
//! ```

pub mod connection;

pub use connection::{DbError, Result, TursoConnection};
