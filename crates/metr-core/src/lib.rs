//! # metr-core
//!
//! Core types for the metr hierarchical metrics library.
//!
//! A metric is identified by a dotted tag (`"service.db.query"`). Every
//! observation becomes one immutable [`Record`] which is handed to the
//! metric's handlers and then to the handlers of each registered ancestor.
//!
//! This crate holds the pieces shared by every other crate:
//!
//! - [`Record`], the observation value
//! - [`settings`], the process-wide propagate flag and correlation (ray) id
//! - [`MetrError`] and the [`Result`] alias
//! - [`MetrConfig`], TOML configuration

mod config;
mod error;
pub mod fail_open;
mod record;
pub mod settings;

pub use config::{LoggingConfig, MetrConfig, SqlConfig};
pub use error::{MetrError, Result};
pub use record::Record;
