//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types to make it easier to
//! get started with the library.

pub use crate::connector::Connector;
pub use crate::driver::Ticker;
pub use crate::error::DispatchError;
pub use crate::pool::{QueryExecutor, ThreadWorker, Worker, WorkerFactory, WorkerPool};
pub use crate::queue::SharedQueue;
pub use crate::results::{ResultSet, Row};
pub use crate::statements::{PlaceholderStyle, StatementStore, StatementTemplate};
pub use crate::types::{
    BoundStatement, ErrorCallback, ExecutionFailure, ExecutionMode, NamedArgs, QueuedRequest,
    ResultCallback, ResultEnvelope, ResultPayload, SqlValue,
};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteExecutor, SqliteWorkerFactory};
