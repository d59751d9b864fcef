//! The immutable observation value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;

use crate::settings;

/// One observation recorded against a metric.
///
/// A record is built once per observation and never changes afterwards.
/// The same record is handed to every handler along the metric's
/// ancestry chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    tag: String,
    value: i64,
    created: DateTime<Utc>,
    ray_id: String,
    thread: String,
    thread_name: Option<String>,
}

impl Record {
    /// Capture an observation now, on the current thread
    pub fn new(tag: impl Into<String>, value: i64) -> Self {
        Self::at(tag, value, Utc::now())
    }

    /// Capture an observation with an explicit creation time
    pub fn at(tag: impl Into<String>, value: i64, created: DateTime<Utc>) -> Self {
        let current = thread::current();
        Self {
            tag: tag.into(),
            value,
            created,
            ray_id: settings::ray_id().to_string(),
            thread: format!("{:?}", current.id()),
            thread_name: current.name().map(str::to_string),
        }
    }

    /// Use a correlation id other than the process-wide one
    pub fn with_ray_id(mut self, ray_id: impl Into<String>) -> Self {
        self.ray_id = ray_id.into();
        self
    }

    /// Dotted tag of the metric that produced this record
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn ray_id(&self) -> &str {
        &self.ray_id
    }

    /// Identity of the producing thread
    pub fn thread(&self) -> &str {
        &self.thread
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[thread:{}][thread_name:{}][ray:{}][created:{}][tag:{}][value:{}]",
            self.thread,
            self.thread_name.as_deref().unwrap_or("-"),
            self.ray_id,
            self.created,
            self.tag,
            self.value
        )
    }
}
