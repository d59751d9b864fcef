//! Record formatters

use metr_core::{Record, Result};

/// Converts a record into the representation a sink writes
pub trait Formatter: Send {
    type Output;

    fn format(&self, record: &Record) -> Result<Self::Output>;
}

/// Display form, for log streams
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl Formatter for TextFormatter {
    type Output = String;

    fn format(&self, record: &Record) -> Result<String> {
        Ok(record.to_string())
    }
}

/// One JSON object per record
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    type Output = String;

    fn format(&self, record: &Record) -> Result<String> {
        Ok(serde_json::to_string(record)?)
    }
}

/// A statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

/// Values for `(timestamp, tag, value, ray_id)`, in column order
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRecordFormatter;

impl Formatter for SqlRecordFormatter {
    type Output = Vec<SqlValue>;

    fn format(&self, record: &Record) -> Result<Vec<SqlValue>> {
        Ok(vec![
            SqlValue::Text(record.created().to_rfc3339()),
            SqlValue::Text(record.tag().to_string()),
            SqlValue::Integer(record.value()),
            SqlValue::Text(record.ray_id().to_string()),
        ])
    }
}
