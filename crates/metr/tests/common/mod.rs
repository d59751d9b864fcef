//! Sinks shared by the integration tests

#![allow(dead_code)]

use metr::{Handler, MetrError, Record, Result, SharedHandler};
use std::sync::{Arc, Mutex, MutexGuard};

pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Tests touching process-wide state take this first
pub fn serial() -> MutexGuard<'static, ()> {
    static SERIAL: Mutex<()> = Mutex::new(());
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Logs `emit:<name>`, `flush:<name>` and `close:<name>`; can be told to fail
pub struct Scripted {
    pub name: String,
    pub log: EventLog,
    pub records: Arc<Mutex<Vec<Record>>>,
    pub fail_emit: bool,
    pub fail_flush: bool,
    pub fail_close: bool,
    pub panic_on: Option<i64>,
}

impl Scripted {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            records: Arc::new(Mutex::new(Vec::new())),
            fail_emit: false,
            fail_flush: false,
            fail_close: false,
            panic_on: None,
        }
    }

    pub fn failing_emit(mut self) -> Self {
        self.fail_emit = true;
        self
    }

    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Panic inside `emit` when a record carries `value`
    pub fn panicking_on(mut self, value: i64) -> Self {
        self.panic_on = Some(value);
        self
    }

    /// Wrap, keeping a handle on the received records
    pub fn share(self) -> (SharedHandler, Arc<Mutex<Vec<Record>>>) {
        let records = Arc::clone(&self.records);
        (SharedHandler::new(self), records)
    }

    fn note(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", event, self.name));
    }
}

impl Handler for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&mut self, record: &Record) -> Result<()> {
        self.note("emit");
        if self.panic_on == Some(record.value()) {
            panic!("{} cannot take {}", self.name, record.value());
        }
        if self.fail_emit {
            return Err(MetrError::Handler(format!("{} refused record", self.name)));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.note("flush");
        if self.fail_flush {
            return Err(MetrError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stream gone",
            )));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.note("close");
        if self.fail_close {
            return Err(MetrError::Closed(self.name.clone()));
        }
        Ok(())
    }
}

/// Events in `log` that mention `name`
pub fn events_for(log: &EventLog, names: &[&str]) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| names.iter().any(|n| e.ends_with(&format!(":{}", n))))
        .cloned()
        .collect()
}
