//! Turso connection wrapper.
//!
//! The metr handler contract is synchronous, so the connection owns a
//! private current-thread tokio runtime and blocks on each database
//! call. Do not use it from inside another tokio runtime.
//!
//! Statements passed to `execute` are buffered and applied in a single
//! transaction on `commit`.

use metr::{is_sql_identifier, MetrError, SqlConnection, SqlValue};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::debug;
use turso::{params, Builder, Connection};

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("turso error: {0}")]
    Turso(#[from] turso::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid table name: {0}")]
    InvalidTable(String),

    #[error("connection closed: {0}")]
    Closed(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for MetrError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Closed(path) => MetrError::Closed(path),
            other => MetrError::sink(other),
        }
    }
}

/// A statement waiting for the next commit
struct Pending {
    sql: String,
    params: Vec<turso::Value>,
}

/// Connection to an embedded Turso database file
pub struct TursoConnection {
    runtime: Runtime,
    conn: Option<Connection>,
    path: String,
    pending: Vec<Pending>,
}

impl TursoConnection {
    /// Open (or create) the database at `path` in WAL mode.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let conn = runtime.block_on(async {
            let db = Builder::new_local(&path_str).build().await?;
            let conn = db.connect()?;

            // Use query() for PRAGMA statements as they may return results
            let _ = conn.query("PRAGMA journal_mode=WAL", params![]).await?;
            let _ = conn.query("PRAGMA busy_timeout=5000", params![]).await?;
            Ok::<_, DbError>(conn)
        })?;

        debug!("Opened metrics database at {}", path_str);
        Ok(Self {
            runtime,
            conn: Some(conn),
            path: path_str,
            pending: Vec::new(),
        })
    }

    /// Returns the database file path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Statements buffered since the last commit
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Create the metrics table and its indexes if they don't exist.
    ///
    /// Idempotent.
    pub fn init_schema(&mut self, table: &str) -> Result<()> {
        check_table(table)?;
        let statements = [
            format!(
                r#"CREATE TABLE IF NOT EXISTS {table} (
                    timestamp TEXT NOT NULL,
                    tag TEXT NOT NULL,
                    value INTEGER NOT NULL,
                    ray_id TEXT NOT NULL
                )"#
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_tag ON {table}(tag)"),
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_ray ON {table}(ray_id)"),
        ];

        let Self { runtime, conn, path, .. } = self;
        let conn = conn.as_ref().ok_or_else(|| DbError::Closed(path.clone()))?;
        runtime.block_on(async {
            for stmt in &statements {
                conn.execute(stmt, params![]).await?;
            }
            Ok::<(), DbError>(())
        })
    }

    /// Number of committed rows in `table`
    pub fn row_count(&mut self, table: &str) -> Result<i64> {
        check_table(table)?;
        let query = format!("SELECT COUNT(*) FROM {}", table);

        let Self { runtime, conn, path, .. } = self;
        let conn = conn.as_ref().ok_or_else(|| DbError::Closed(path.clone()))?;
        runtime.block_on(async {
            let mut rows = conn.query(&query, params![]).await?;
            let count: i64 = match rows.next().await? {
                Some(row) => row.get(0)?,
                None => 0,
            };
            Ok::<i64, DbError>(count)
        })
    }

    fn apply_pending(&mut self) -> Result<()> {
        let Self {
            runtime,
            conn,
            path,
            pending,
        } = self;
        let conn = conn.as_mut().ok_or_else(|| DbError::Closed(path.clone()))?;
        let statements = std::mem::take(pending);

        runtime.block_on(async {
            let tx = conn.transaction().await?;
            for stmt in statements {
                tx.execute(&stmt.sql, stmt.params).await?;
            }
            tx.commit().await?;
            Ok::<(), DbError>(())
        })
    }
}

fn check_table(table: &str) -> Result<()> {
    if is_sql_identifier(table) {
        Ok(())
    } else {
        Err(DbError::InvalidTable(table.to_string()))
    }
}

fn to_turso(value: &SqlValue) -> turso::Value {
    match value {
        SqlValue::Text(text) => text.clone().into(),
        SqlValue::Integer(int) => (*int).into(),
    }
}

impl SqlConnection for TursoConnection {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> metr::Result<()> {
        if self.conn.is_none() {
            return Err(DbError::Closed(self.path.clone()).into());
        }
        self.pending.push(Pending {
            sql: sql.to_string(),
            params: params.iter().map(to_turso).collect(),
        });
        Ok(())
    }

    fn commit(&mut self) -> metr::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Ok(self.apply_pending()?)
    }

    fn rollback(&mut self) -> metr::Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn close(&mut self) -> metr::Result<()> {
        self.pending.clear();
        if self.conn.take().is_some() {
            debug!("Closed metrics database at {}", self.path);
        }
        Ok(())
    }
}
