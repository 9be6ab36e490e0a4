use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ToSql};

use super::params::to_sqlite_values;
use super::query::build_result_set;
use crate::error::DispatchError;
use crate::pool::QueryExecutor;
use crate::types::{ExecutionMode, QueuedRequest, ResultPayload};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes queued requests against a worker-owned `SQLite` connection.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Open a dedicated connection for one worker.
    ///
    /// # Errors
    ///
    /// Any `rusqlite` error from opening the database or configuring it.
    pub fn open(path: &Path) -> Result<Self, DispatchError> {
        let conn = Connection::open(path)?;
        // File-backed databases see concurrent writers from sibling workers.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&mut self, request: &QueuedRequest) -> Result<ResultPayload, DispatchError> {
        let values = to_sqlite_values(&request.params);
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        match request.mode {
            ExecutionMode::Generic => {
                if values.is_empty() {
                    // Parameterless generic statements may be multi-statement DDL.
                    self.conn.execute_batch(&request.query)?;
                } else {
                    let mut stmt = self.conn.prepare(&request.query)?;
                    stmt.execute(&param_refs[..])?;
                }
                Ok(ResultPayload::Generic)
            }
            ExecutionMode::Change => {
                let mut stmt = self.conn.prepare(&request.query)?;
                let rows_affected = stmt.execute(&param_refs[..])? as u64;
                Ok(ResultPayload::Change { rows_affected })
            }
            ExecutionMode::Insert => {
                let rows_affected = {
                    let mut stmt = self.conn.prepare(&request.query)?;
                    stmt.execute(&param_refs[..])? as u64
                };
                let insert_id = self.conn.last_insert_rowid();
                Ok(ResultPayload::Insert {
                    insert_id,
                    rows_affected,
                })
            }
            ExecutionMode::Select => {
                let mut stmt = self.conn.prepare(&request.query)?;
                let rows = build_result_set(&mut stmt, &values)?;
                Ok(ResultPayload::Select { rows })
            }
        }
    }
}
