//! Handlers shared by the unit tests

use metr_core::{MetrError, Record, Result};
use std::sync::{Arc, Mutex};

use crate::handler::{Handler, SharedHandler};

pub(crate) type EventLog = Arc<Mutex<Vec<&'static str>>>;

struct CaptureSink {
    name: &'static str,
    records: Arc<Mutex<Vec<Record>>>,
    log: Option<EventLog>,
}

impl Handler for CaptureSink {
    fn name(&self) -> &str {
        self.name
    }

    fn emit(&mut self, record: &Record) -> Result<()> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name);
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Keeps every record it receives
pub(crate) struct Capture {
    pub handler: SharedHandler,
    records: Arc<Mutex<Vec<Record>>>,
}

impl Capture {
    pub fn new(name: &'static str) -> Self {
        Self::build(name, None)
    }

    /// Also appends its name to `log` on every emit
    pub fn logging(name: &'static str, log: &EventLog) -> Self {
        Self::build(name, Some(Arc::clone(log)))
    }

    pub fn shared_log() -> EventLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn build(name: &'static str, log: Option<EventLog>) -> Self {
        let records = Arc::new(Mutex::new(Vec::new()));
        let handler = SharedHandler::new(CaptureSink {
            name,
            records: Arc::clone(&records),
            log,
        });
        Self { handler, records }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

/// Fails every emit
pub(crate) struct Failing;

impl Failing {
    pub fn handler() -> SharedHandler {
        SharedHandler::new(Failing)
    }
}

impl Handler for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn emit(&mut self, _record: &Record) -> Result<()> {
        Err(MetrError::Handler("sink unavailable".to_string()))
    }
}
