use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::DispatchError;
use crate::queue::SharedQueue;
use crate::types::{ExecutionFailure, QueuedRequest, ResultEnvelope, ResultPayload};

/// How long a worker waits on the request queue before re-checking its stop
/// flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A single execution context bound to the pool's shared queues.
///
/// Implementations must push exactly one [`ResultEnvelope`] — carrying the
/// request's id — for every request they dequeue, on success and failure
/// alike. A dequeued request is never dropped.
pub trait Worker: Send {
    /// Whether the worker is currently executing a request.
    fn is_busy(&self) -> bool;

    /// Ask the worker to stop once its current request, if any, finishes.
    fn request_stop(&self);

    /// Block until the worker has terminated.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ExecutionError`] if the worker's thread
    /// panicked.
    fn join(&mut self) -> Result<(), DispatchError>;

    /// Whether the worker's backend connection was established.
    fn connection_established(&self) -> bool;

    fn has_connection_error(&self) -> bool;

    fn last_connection_error(&self) -> Option<String>;
}

/// Spawns workers bound to the pool's queue pair.
pub trait WorkerFactory: Send {
    /// Create one worker consuming `requests` and answering on `results`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ConnectionError`] if the worker cannot be
    /// started.
    fn spawn_worker(
        &self,
        requests: SharedQueue<QueuedRequest>,
        results: SharedQueue<ResultEnvelope>,
    ) -> Result<Box<dyn Worker>, DispatchError>;
}

/// Backend execution seam: runs one request against a live connection.
///
/// Errors returned here are converted into error envelopes by the worker;
/// they never cross the worker boundary as panics or thrown errors.
pub trait QueryExecutor: Send {
    /// Execute one request and produce its payload.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`]; the worker turns it into a
    /// [`ResultPayload::Error`] envelope for the request.
    fn execute(&mut self, request: &QueuedRequest) -> Result<ResultPayload, DispatchError>;
}

#[derive(Default)]
struct WorkerShared {
    busy: AtomicBool,
    stop: AtomicBool,
    connected: AtomicBool,
    connection_error: Mutex<Option<String>>,
}

fn set_connection_error(shared: &WorkerShared, message: &str) {
    let mut guard = match shared.connection_error.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(message.to_string());
}

/// The crate's standard worker: a named OS thread owning its backend
/// connection.
///
/// The connection is opened inside the thread via the connect closure, so
/// connection handles never cross threads. A worker whose connection attempt
/// failed keeps consuming and answers each request with an error envelope,
/// preserving the one-envelope-per-request contract.
pub struct ThreadWorker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    /// Spawn a worker thread that connects via `connect` and then serves the
    /// request queue until stopped.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ConnectionError`] if the OS thread cannot be
    /// spawned.
    pub fn spawn<E, F>(
        name: impl Into<String>,
        connect: F,
        requests: SharedQueue<QueuedRequest>,
        results: SharedQueue<ResultEnvelope>,
    ) -> Result<Self, DispatchError>
    where
        E: QueryExecutor + 'static,
        F: FnOnce() -> Result<E, DispatchError> + Send + 'static,
    {
        let shared = Arc::new(WorkerShared::default());
        let thread_shared = Arc::clone(&shared);
        let name = name.into();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&thread_shared, connect, &requests, &results))
            .map_err(|err| {
                DispatchError::ConnectionError(format!(
                    "failed to spawn worker thread {name}: {err}"
                ))
            })?;
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }
}

impl Worker for ThreadWorker {
    fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    fn join(&mut self) -> Result<(), DispatchError> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| DispatchError::ExecutionError("worker thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn connection_established(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    fn has_connection_error(&self) -> bool {
        self.last_connection_error().is_some()
    }

    fn last_connection_error(&self) -> Option<String> {
        match self.shared.connection_error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn run_worker<E, F>(
    shared: &WorkerShared,
    connect: F,
    requests: &SharedQueue<QueuedRequest>,
    results: &SharedQueue<ResultEnvelope>,
) where
    E: QueryExecutor,
    F: FnOnce() -> Result<E, DispatchError>,
{
    let (mut executor, connect_failure) = match connect() {
        Ok(executor) => {
            shared.connected.store(true, Ordering::Release);
            (Some(executor), None)
        }
        Err(err) => {
            let message = err.to_string();
            set_connection_error(shared, &message);
            tracing::error!("worker failed to establish its connection: {message}");
            (None, Some(message))
        }
    };

    while !shared.stop.load(Ordering::Acquire) {
        let Some(request) = requests.pop_timeout(POLL_INTERVAL) else {
            continue;
        };
        shared.busy.store(true, Ordering::Release);
        let payload = match executor.as_mut() {
            Some(executor) => match executor.execute(&request) {
                Ok(payload) => payload,
                Err(err) => ResultPayload::Error(
                    ExecutionFailure::new(err.to_string())
                        .with_statement(request.query.clone(), request.params.clone()),
                ),
            },
            None => {
                let reason = connect_failure
                    .as_deref()
                    .unwrap_or("connection not established");
                ResultPayload::Error(ExecutionFailure::new(format!(
                    "worker has no connection: {reason}"
                )))
            }
        };
        let id = request.id;
        if results.push(ResultEnvelope { id, payload }).is_err() {
            tracing::error!("result queue disconnected; envelope for request {id} was lost");
        }
        shared.busy.store(false, Ordering::Release);
    }
}
