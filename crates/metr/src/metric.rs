//! Metrics and hierarchical propagation.
//!
//! A metric's parent is never stored. It is resolved on every record by
//! walking the tag's prefixes (longest first) through the registry, so
//! ancestors may be registered after their descendants and unregistered
//! intermediate levels are skipped.

use metr_core::settings::propagate_exceptions;
use metr_core::{Record, Result};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::error;

use crate::handler::SharedHandler;
use crate::recorder::{CounterRecorder, ExceptionRecorder};
use crate::registry;

/// A named node in the dotted-tag hierarchy
pub struct Metric {
    tag: String,
    handlers: RwLock<Vec<SharedHandler>>,
}

impl Metric {
    /// A metric with no handlers. Use [`get_metric`](crate::get_metric)
    /// to obtain the registered instance for a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_handlers(tag, Vec::new())
    }

    /// A metric with initial handlers; duplicates are dropped
    pub fn with_handlers(tag: impl Into<String>, handlers: Vec<SharedHandler>) -> Self {
        let metric = Self {
            tag: tag.into(),
            handlers: RwLock::new(Vec::with_capacity(handlers.len())),
        };
        for handler in &handlers {
            metric.add_handler(handler);
        }
        metric
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attach a handler. Attaching the same handler twice is a no-op.
    pub fn add_handler(&self, handler: &SharedHandler) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !handlers.iter().any(|h| h.ptr_eq(handler)) {
            handlers.push(handler.clone());
        }
    }

    /// Snapshot of the attached handlers, in attachment order
    pub fn handlers(&self) -> Vec<SharedHandler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Nearest registered ancestor, if any
    pub fn parent(&self) -> Option<Arc<Metric>> {
        registry::nearest_ancestor(&self.tag)
    }

    /// Get or create the metric `"<tag>.<name>"`
    pub fn child(&self, name: &str) -> Arc<Metric> {
        registry::get_metric(&format!("{}.{}", self.tag, name))
    }

    pub fn create_record(&self, value: i64) -> Record {
        Record::new(self.tag.as_str(), value)
    }

    /// Build a record for `value` and propagate it.
    ///
    /// Every recorder ends up here.
    pub fn handle_value(&self, value: i64) -> Result<()> {
        let record = self.create_record(value);
        self.propagate(&record)
    }

    /// Hand `record` to this metric's handlers, then to each registered
    /// ancestor's handlers in turn, nearest first.
    ///
    /// Runs synchronously on the calling thread. A failing handler does
    /// not stop the others unless propagation is enabled, in which case
    /// the first error is returned and nothing further is visited.
    pub fn propagate(&self, record: &Record) -> Result<()> {
        self.call_handlers(record)?;

        let mut next = self.parent();
        while let Some(metric) = next {
            metric.call_handlers(record)?;
            next = metric.parent();
        }
        Ok(())
    }

    fn call_handlers(&self, record: &Record) -> Result<()> {
        for handler in self.handlers() {
            if let Err(e) = handler.handle(record) {
                if propagate_exceptions() {
                    return Err(e);
                }
                error!("Handler {} failed for record {}: {}", handler.name(), record, e);
            }
        }
        Ok(())
    }

    /// Record a single value
    pub fn rec(&self, value: i64) -> Result<()> {
        self.handle_value(value)
    }

    /// Start an accumulating counter; its sum is recorded once, when it
    /// is closed or dropped
    pub fn rec_counter(&self) -> CounterRecorder<'_> {
        CounterRecorder::new(self)
    }

    /// Count failures of a unit of work that satisfy `matches`
    pub fn rec_exception<P>(&self, matches: P) -> ExceptionRecorder<'_, P> {
        ExceptionRecorder::new(self, matches)
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("tag", &self.tag)
            .field("handlers", &self.handlers())
            .finish()
    }
}
