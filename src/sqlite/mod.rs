//! `SQLite` reference backend: one dedicated connection per worker thread.

mod executor;
mod params;
mod query;

pub use executor::SqliteExecutor;
pub use params::sql_value_to_sqlite;
pub use query::build_result_set;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::DispatchError;
use crate::pool::{ThreadWorker, Worker, WorkerFactory};
use crate::queue::SharedQueue;
use crate::types::{QueuedRequest, ResultEnvelope};

/// Spawns [`ThreadWorker`]s that each open their own `rusqlite::Connection`
/// to the configured path.
///
/// In-memory databases (`:memory:`) are therefore per-worker; hosts that
/// need state shared across workers use a file path, where concurrent
/// writers serialize through the connection's busy timeout.
pub struct SqliteWorkerFactory {
    path: PathBuf,
    next_worker: AtomicUsize,
}

impl SqliteWorkerFactory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_worker: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl WorkerFactory for SqliteWorkerFactory {
    fn spawn_worker(
        &self,
        requests: SharedQueue<QueuedRequest>,
        results: SharedQueue<ResultEnvelope>,
    ) -> Result<Box<dyn Worker>, DispatchError> {
        let seq = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let path = self.path.clone();
        let worker = ThreadWorker::spawn(
            format!("sqlite-worker-{seq}"),
            move || SqliteExecutor::open(&path),
            requests,
            results,
        )?;
        Ok(Box::new(worker))
    }
}
