use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::results::ResultSet;

/// Values bound to statement placeholders and returned in result rows.
///
/// One enum serves both directions so callers never branch on driver types:
/// ```rust
/// use sql_dispatch::prelude::*;
///
/// let mut args = NamedArgs::new();
/// args.insert("name".to_string(), SqlValue::Text("alice".into()));
/// args.insert("active".to_string(), SqlValue::Bool(true));
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Booleans stored as 0/1 integers are read back as booleans.
    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let SqlValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    /// Timestamps stored as text are parsed with and without fractional
    /// seconds.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Named arguments supplied to an `execute_*` call, keyed by placeholder name.
pub type NamedArgs = HashMap<String, SqlValue>;

/// How a queued statement's outcome is interpreted and unwrapped for its
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run the statement; no payload beyond success/failure.
    Generic,
    /// DML statement; report the affected-row count.
    Change,
    /// INSERT statement; report the inserted row id and affected-row count.
    Insert,
    /// SELECT statement; report the result rows.
    Select,
}

/// A formatted query and its ordered bound values, produced by
/// [`StatementStore::format`](crate::statements::StatementStore::format).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// Query text with placeholders in the configured style.
    pub query: String,
    /// Bound values aligned with the markers emitted in `query`.
    pub params: Vec<SqlValue>,
}

/// A unit of work created by the connector and consumed by exactly one
/// worker.
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    /// Correlation id joining this request to its eventual result.
    pub id: u64,
    /// How the outcome is interpreted.
    pub mode: ExecutionMode,
    /// Formatted query text.
    pub query: String,
    /// Ordered bound values.
    pub params: Vec<SqlValue>,
}

/// A completed outcome pushed by a worker, consumed exactly once at drain
/// time.
#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    /// Correlation id of the originating request.
    pub id: u64,
    /// The outcome.
    pub payload: ResultPayload,
}

/// Tagged outcome of one executed request.
#[derive(Debug, Clone)]
pub enum ResultPayload {
    /// The statement ran; nothing further to report.
    Generic,
    /// DML outcome.
    Change {
        /// Rows affected by the statement.
        rows_affected: u64,
    },
    /// INSERT outcome.
    Insert {
        /// Row id assigned by the backend.
        insert_id: i64,
        /// Rows affected by the statement.
        rows_affected: u64,
    },
    /// SELECT outcome.
    Select {
        /// The rows returned.
        rows: ResultSet,
    },
    /// Execution failed; routed to the request's error branch.
    Error(ExecutionFailure),
}

impl ResultPayload {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ResultPayload::Generic => "generic",
            ResultPayload::Change { .. } => "change",
            ResultPayload::Insert { .. } => "insert",
            ResultPayload::Select { .. } => "select",
            ResultPayload::Error(_) => "error",
        }
    }
}

/// An asynchronous execution failure, delivered through the result channel
/// rather than thrown across the worker boundary.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    /// Human-readable failure description.
    pub message: String,
    /// The query that failed, when known.
    pub query: Option<String>,
    /// The bound values of the failing query, when known.
    pub params: Option<Vec<SqlValue>>,
}

impl ExecutionFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            query: None,
            params: None,
        }
    }

    /// Attach the failing query and its bound values.
    #[must_use]
    pub fn with_statement(mut self, query: String, params: Vec<SqlValue>) -> Self {
        self.query = Some(query);
        self.params = Some(params);
        self
    }
}

/// Callback registered per request; invoked exactly once with the completed
/// payload.
pub type ResultCallback = Box<dyn FnOnce(ResultPayload) + Send + 'static>;

/// Error branch of an `execute_*` call. When absent, failures go to the
/// default logging reporter.
pub type ErrorCallback = Box<dyn FnOnce(ExecutionFailure) + Send + 'static>;
