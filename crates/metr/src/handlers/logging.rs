//! Sink writing records as tracing events

use metr_core::{LoggingConfig, MetrError, Record, Result};
use std::str::FromStr;
use tracing::{debug, error, info, trace, warn, Level};

use crate::format::{Formatter, TextFormatter};
use crate::handler::Handler;

/// Emits each record as a `tracing` event at a fixed level.
///
/// The event carries a `logger` field with the configured name, so
/// subscribers can route metric lines separately from application logs.
#[derive(Debug, Clone)]
pub struct LoggingHandler<F = TextFormatter> {
    logger: String,
    level: Level,
    formatter: F,
}

impl LoggingHandler {
    pub fn new(level: Level, logger: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level,
            formatter: TextFormatter,
        }
    }

    /// Build from the `[logging]` config section
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let level = Level::from_str(&config.level).map_err(|e| {
            MetrError::Config(format!("Invalid log level {:?}: {}", config.level, e))
        })?;
        Ok(Self::new(level, config.name.clone()))
    }
}

impl<F> LoggingHandler<F> {
    /// Swap the formatter, e.g. for [`JsonFormatter`](crate::JsonFormatter)
    pub fn with_formatter<G>(self, formatter: G) -> LoggingHandler<G>
    where
        G: Formatter<Output = String>,
    {
        LoggingHandler {
            logger: self.logger,
            level: self.level,
            formatter,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl<F: Formatter<Output = String>> LoggingHandler<F> {
    pub fn format(&self, record: &Record) -> Result<String> {
        self.formatter.format(record)
    }
}

impl<F: Formatter<Output = String>> Handler for LoggingHandler<F> {
    fn name(&self) -> &str {
        &self.logger
    }

    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = self.format(record)?;
        let logger = self.logger.as_str();

        if self.level == Level::ERROR {
            error!(logger = logger, "{}", line);
        } else if self.level == Level::WARN {
            warn!(logger = logger, "{}", line);
        } else if self.level == Level::INFO {
            info!(logger = logger, "{}", line);
        } else if self.level == Level::DEBUG {
            debug!(logger = logger, "{}", line);
        } else {
            trace!(logger = logger, "{}", line);
        }
        Ok(())
    }
}
