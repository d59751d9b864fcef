//! Sink inserting one row per record into a relational table

use metr_core::{MetrError, Record, Result};
use tracing::warn;

use crate::format::{Formatter, SqlRecordFormatter, SqlValue};
use crate::handler::{contain_error, Handler};

pub const DEFAULT_TABLE: &str = "metrics";

/// A connection to a relational store.
///
/// Statements run inside an implicit transaction that
/// [`commit`](SqlConnection::commit) makes durable and
/// [`rollback`](SqlConnection::rollback) discards.
pub trait SqlConnection: Send {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Must tolerate being called more than once
    fn close(&mut self) -> Result<()>;
}

/// Writes `(timestamp, tag, value, ray_id)` rows through a [`SqlConnection`]
pub struct SqlHandler<C> {
    connection: C,
    table: String,
    insert: String,
    formatter: SqlRecordFormatter,
}

impl<C: SqlConnection> SqlHandler<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            table: DEFAULT_TABLE.to_string(),
            insert: insert_statement(DEFAULT_TABLE),
            formatter: SqlRecordFormatter,
        }
    }

    /// Target another table. The name is spliced into SQL, so only
    /// plain identifiers (`[A-Za-z0-9_.]`, not starting with a digit)
    /// are accepted.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        if !is_sql_identifier(table) {
            return Err(MetrError::Config(format!("Invalid table name: {:?}", table)));
        }

        self.table = table.to_string();
        self.insert = insert_statement(table);
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn format(&self, record: &Record) -> Result<Vec<SqlValue>> {
        self.formatter.format(record)
    }
}

/// Whether `name` is safe to splice into SQL as a table name
pub fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn insert_statement(table: &str) -> String {
    format!(
        "INSERT INTO {} (timestamp, tag, value, ray_id) VALUES (?, ?, ?, ?)",
        table
    )
}

impl<C: SqlConnection> Handler for SqlHandler<C> {
    fn name(&self) -> &str {
        "sql"
    }

    fn emit(&mut self, record: &Record) -> Result<()> {
        let values = self.format(record)?;
        self.connection.execute(&self.insert, &values)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.connection.commit()
    }

    fn close(&mut self) -> Result<()> {
        self.connection.close()
    }

    fn handle_error(&mut self, record: &Record, error: MetrError) -> Result<()> {
        if let Err(e) = self.connection.rollback() {
            warn!("Rollback after failed insert also failed: {}", e);
        }
        contain_error(self.name(), record, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::SharedHandler;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        log: Vec<String>,
        params: Vec<Vec<SqlValue>>,
    }

    struct MockConnection {
        calls: Arc<Mutex<Calls>>,
        fail_execute: bool,
    }

    impl SqlConnection for MockConnection {
        fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            calls.log.push(sql.to_string());
            calls.params.push(params.to_vec());
            if self.fail_execute {
                return Err(MetrError::Handler("disk full".to_string()));
            }
            Ok(())
        }

        fn commit(&mut self) -> Result<()> {
            self.calls.lock().unwrap().log.push("COMMIT".to_string());
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            self.calls.lock().unwrap().log.push("ROLLBACK".to_string());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.calls.lock().unwrap().log.push("CLOSE".to_string());
            Ok(())
        }
    }

    fn mock(fail_execute: bool) -> (MockConnection, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let conn = MockConnection {
            calls: calls.clone(),
            fail_execute,
        };
        (conn, calls)
    }

    #[test]
    fn test_emit_inserts_and_commits() {
        let (conn, calls) = mock(false);
        let handler = SharedHandler::new(SqlHandler::new(conn));
        let record = Record::new("sql.insert", 12).with_ray_id("ray-9");

        handler.handle(&record).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            calls.log,
            vec![
                "INSERT INTO metrics (timestamp, tag, value, ray_id) VALUES (?, ?, ?, ?)",
                "COMMIT",
            ]
        );
        assert_eq!(calls.params[0][1], SqlValue::Text("sql.insert".to_string()));
        assert_eq!(calls.params[0][2], SqlValue::Integer(12));
        assert_eq!(calls.params[0][3], SqlValue::Text("ray-9".to_string()));
    }

    #[test]
    fn test_failed_insert_rolls_back_and_is_contained() {
        let (conn, calls) = mock(true);
        let handler = SharedHandler::new(SqlHandler::new(conn));

        assert!(handler.handle(&Record::new("sql.fail", 1)).is_ok());

        let log = calls.lock().unwrap().log.clone();
        assert_eq!(log.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!log.iter().any(|c| c == "COMMIT"));
    }

    #[test]
    fn test_with_table_validates_identifier() {
        let (conn, _) = mock(false);
        let handler = SqlHandler::new(conn).with_table("app_metrics").unwrap();
        assert_eq!(handler.table(), "app_metrics");

        let (conn, _) = mock(false);
        assert!(SqlHandler::new(conn).with_table("x; DROP TABLE y").is_err());
        let (conn, _) = mock(false);
        assert!(SqlHandler::new(conn).with_table("1metrics").is_err());
    }

    #[test]
    fn test_closing_shared_handler_twice_closes_connection_once() {
        let (conn, calls) = mock(false);
        let handler = SharedHandler::new(SqlHandler::new(conn));

        handler.close().unwrap();
        handler.close().unwrap();

        let log = calls.lock().unwrap().log.clone();
        assert_eq!(log.iter().filter(|c| *c == "CLOSE").count(), 1);
    }
}
