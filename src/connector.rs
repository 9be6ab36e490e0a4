//! Public-facing orchestrator joining the statement store, worker pool, and
//! callback registry.

use std::backtrace::Backtrace;
use std::collections::HashMap;

use crate::error::DispatchError;
use crate::pool::{WorkerFactory, WorkerPool};
use crate::results::ResultSet;
use crate::statements::{PlaceholderStyle, StatementStore, StatementTemplate};
use crate::types::{
    ErrorCallback, ExecutionFailure, ExecutionMode, NamedArgs, QueuedRequest, ResultCallback,
    ResultPayload,
};

/// Submits named statements for asynchronous execution and routes each
/// completed result to its registered callback.
///
/// One controller context owns the connector. `execute_*` and
/// [`check_results`](Self::check_results) never block: submission formats
/// the statement, registers the callback under a fresh correlation id, and
/// enqueues the work; results are dispatched only from `check_results`,
/// which a host-supplied periodic driver (e.g.
/// [`Ticker`](crate::driver::Ticker)) must call at a regular cadence.
///
/// Callbacks fire exactly once per request, on the draining context, in
/// completion order — which is not submission order once more than one
/// worker is active.
pub struct Connector {
    statements: StatementStore,
    pool: WorkerPool,
    callbacks: HashMap<u64, ResultCallback>,
    next_id: u64,
    log_queries: bool,
    closed: bool,
}

impl Connector {
    /// Create a connector over `worker_limit` workers spawned by `factory`,
    /// binding placeholders in the given style for its whole lifetime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConfigError`] for a zero limit, or the factory's
    /// error if the eager first worker cannot be spawned.
    pub fn new(
        factory: Box<dyn WorkerFactory>,
        worker_limit: usize,
        style: PlaceholderStyle,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            statements: StatementStore::new(style),
            pool: WorkerPool::new(factory, worker_limit)?,
            callbacks: HashMap::new(),
            next_id: 0,
            log_queries: false,
            closed: false,
        })
    }

    /// Open a connector over worker-owned `SQLite` connections at `path`,
    /// binding placeholders positionally with `?`.
    ///
    /// Each worker opens its own connection, so `:memory:` databases are
    /// per-worker; use a file path for state shared across workers.
    ///
    /// # Errors
    ///
    /// See [`Connector::new`].
    #[cfg(feature = "sqlite")]
    pub fn sqlite(
        path: impl Into<std::path::PathBuf>,
        worker_limit: usize,
    ) -> Result<Self, DispatchError> {
        let factory = crate::sqlite::SqliteWorkerFactory::new(path);
        Self::new(
            Box::new(factory),
            worker_limit,
            PlaceholderStyle::question_mark(),
        )
    }

    /// Register one statement template.
    ///
    /// # Errors
    ///
    /// [`DispatchError::DuplicateStatement`] on a name collision; the first
    /// registration is retained.
    pub fn load_query(&mut self, template: StatementTemplate) -> Result<(), DispatchError> {
        self.statements.load(template)
    }

    /// Register a batch of templates produced by an external parser.
    ///
    /// # Errors
    ///
    /// Stops at the first [`DispatchError::DuplicateStatement`]; templates
    /// loaded before it remain registered.
    pub fn load_queries(
        &mut self,
        templates: impl IntoIterator<Item = StatementTemplate>,
    ) -> Result<(), DispatchError> {
        self.statements.load_all(templates)
    }

    /// Load templates from a JSON file holding an array of
    /// [`StatementTemplate`] records — the bundled reference format; any
    /// serde format works through [`load_queries`](Self::load_queries).
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConfigError`] for unreadable or malformed files,
    /// plus the duplicate handling of `load_queries`.
    pub fn load_query_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), DispatchError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            DispatchError::ConfigError(format!("failed to read statement file: {err}"))
        })?;
        let templates: Vec<StatementTemplate> = serde_json::from_str(&raw).map_err(|err| {
            DispatchError::ConfigError(format!("failed to parse statement file: {err}"))
        })?;
        self.load_queries(templates)
    }

    /// Toggle logging of every formatted query and its bound values before
    /// queuing. Runtime-mutable.
    pub fn set_query_logging(&mut self, enabled: bool) {
        self.log_queries = enabled;
    }

    #[must_use]
    pub fn query_logging(&self) -> bool {
        self.log_queries
    }

    #[must_use]
    pub fn statements(&self) -> &StatementStore {
        &self.statements
    }

    /// Execute a statement for effect only.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownStatement`] / [`DispatchError::MissingArgument`]
    /// synchronously, before anything is registered or queued; execution
    /// failures go to `on_error` (or the default reporter) asynchronously.
    pub fn execute_generic<F>(
        &mut self,
        name: &str,
        args: &NamedArgs,
        on_success: F,
        on_error: Option<ErrorCallback>,
    ) -> Result<u64, DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let trace = submit_trace();
        self.submit(
            name,
            args,
            ExecutionMode::Generic,
            Box::new(move |payload| match payload {
                ResultPayload::Generic => on_success(),
                other => route_failure(on_error, into_failure(other), trace),
            }),
        )
    }

    /// Execute a DML statement; the callback receives the affected-row
    /// count.
    ///
    /// # Errors
    ///
    /// As for [`execute_generic`](Self::execute_generic).
    pub fn execute_change<F>(
        &mut self,
        name: &str,
        args: &NamedArgs,
        on_success: F,
        on_error: Option<ErrorCallback>,
    ) -> Result<u64, DispatchError>
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let trace = submit_trace();
        self.submit(
            name,
            args,
            ExecutionMode::Change,
            Box::new(move |payload| match payload {
                ResultPayload::Change { rows_affected } => on_success(rows_affected),
                other => route_failure(on_error, into_failure(other), trace),
            }),
        )
    }

    /// Execute an INSERT; the callback receives the inserted row id and the
    /// affected-row count.
    ///
    /// # Errors
    ///
    /// As for [`execute_generic`](Self::execute_generic).
    pub fn execute_insert<F>(
        &mut self,
        name: &str,
        args: &NamedArgs,
        on_success: F,
        on_error: Option<ErrorCallback>,
    ) -> Result<u64, DispatchError>
    where
        F: FnOnce(i64, u64) + Send + 'static,
    {
        let trace = submit_trace();
        self.submit(
            name,
            args,
            ExecutionMode::Insert,
            Box::new(move |payload| match payload {
                ResultPayload::Insert {
                    insert_id,
                    rows_affected,
                } => on_success(insert_id, rows_affected),
                other => route_failure(on_error, into_failure(other), trace),
            }),
        )
    }

    /// Execute a SELECT; the callback receives the result rows.
    ///
    /// # Errors
    ///
    /// As for [`execute_generic`](Self::execute_generic).
    pub fn execute_select<F>(
        &mut self,
        name: &str,
        args: &NamedArgs,
        on_success: F,
        on_error: Option<ErrorCallback>,
    ) -> Result<u64, DispatchError>
    where
        F: FnOnce(ResultSet) + Send + 'static,
    {
        let trace = submit_trace();
        self.submit(
            name,
            args,
            ExecutionMode::Select,
            Box::new(move |payload| match payload {
                ResultPayload::Select { rows } => on_success(rows),
                other => route_failure(on_error, into_failure(other), trace),
            }),
        )
    }

    fn submit(
        &mut self,
        name: &str,
        args: &NamedArgs,
        mode: ExecutionMode,
        on_result: ResultCallback,
    ) -> Result<u64, DispatchError> {
        if self.closed {
            return Err(DispatchError::ConnectionError(
                "connector is closed".to_string(),
            ));
        }
        let bound = self.statements.format(name, args)?;
        let id = self.next_id;
        self.next_id += 1;
        if self.log_queries {
            tracing::debug!(
                target: "sql_dispatch::queries",
                id,
                statement = name,
                query = %bound.query,
                params = ?bound.params,
                "queueing statement"
            );
        }
        self.callbacks.insert(id, on_result);
        let request = QueuedRequest {
            id,
            mode,
            query: bound.query,
            params: bound.params,
        };
        if let Err(err) = self.pool.enqueue(request) {
            // No result will ever arrive for this id.
            self.callbacks.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    /// Dispatch every result currently available; the single drain entry
    /// point. Never blocks.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnmatchedResult`] for an envelope with no registered
    /// callback.
    pub fn check_results(&mut self) -> Result<usize, DispatchError> {
        self.pool.drain(&mut self.callbacks)
    }

    /// Requests submitted but not yet dispatched to a callback.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pool.pending_requests()
    }

    #[must_use]
    pub fn completed_results(&self) -> usize {
        self.pool.completed_results()
    }

    /// Advisory saturation metric; see [`WorkerPool::load`].
    #[must_use]
    pub fn load(&self) -> f64 {
        self.pool.load()
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Connection state of the pool's first worker; see
    /// [`WorkerPool::connection_established`].
    #[must_use]
    pub fn connection_established(&self) -> bool {
        self.pool.connection_established()
    }

    #[must_use]
    pub fn has_connection_error(&self) -> bool {
        self.pool.has_connection_error()
    }

    #[must_use]
    pub fn last_connection_error(&self) -> Option<String> {
        self.pool.last_connection_error()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut the pool down and mark the connector closed so an attached
    /// periodic driver detaches. Idempotent.
    ///
    /// Callbacks registered but not yet dispatched stay undelivered.
    ///
    /// # Errors
    ///
    /// Propagates a worker join failure from the pool shutdown.
    pub fn close(&mut self) -> Result<(), DispatchError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pool.shutdown()
    }
}

/// Call-site capture for the default reporter; diagnostic only, skipped in
/// release builds.
fn submit_trace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::capture())
    } else {
        None
    }
}

fn into_failure(payload: ResultPayload) -> ExecutionFailure {
    match payload {
        ResultPayload::Error(failure) => failure,
        other => ExecutionFailure::new(format!(
            "result arrived with unexpected {} payload",
            other.kind()
        )),
    }
}

fn route_failure(on_error: Option<ErrorCallback>, failure: ExecutionFailure, trace: Option<Backtrace>) {
    match on_error {
        Some(on_error) => on_error(failure),
        None => report_failure(&failure, trace.as_ref()),
    }
}

/// Default reporter for execution failures nobody registered a handler for.
fn report_failure(failure: &ExecutionFailure, trace: Option<&Backtrace>) {
    tracing::error!("statement execution failed: {}", failure.message);
    if let Some(query) = &failure.query {
        tracing::debug!("failing query: {query}");
    }
    if let Some(params) = &failure.params {
        tracing::debug!("failing params: {params:?}");
    }
    if let Some(trace) = trace {
        tracing::debug!("submitted from:\n{trace}");
    }
}
