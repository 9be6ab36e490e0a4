//! Bounded, lazily-grown worker pool sharing a request and a result queue.

pub mod worker;

pub use worker::{QueryExecutor, ThreadWorker, Worker, WorkerFactory};

use std::collections::HashMap;

use crate::error::DispatchError;
use crate::queue::SharedQueue;
use crate::types::{QueuedRequest, ResultCallback, ResultEnvelope};

/// A single logical execution channel backed by up to `limit` workers.
///
/// The first worker is spawned eagerly at construction; the rest appear on
/// demand, when new work arrives while every existing worker is busy.
/// Workers are never removed until [`shutdown`](Self::shutdown). A request
/// enqueued before shutdown is executed by exactly one worker.
pub struct WorkerPool {
    factory: Box<dyn WorkerFactory>,
    workers: Vec<Box<dyn Worker>>,
    limit: usize,
    requests: SharedQueue<QueuedRequest>,
    results: SharedQueue<ResultEnvelope>,
    shut_down: bool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("limit", &self.limit)
            .field("pending_requests", &self.requests.len())
            .field("completed_results", &self.results.len())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with one eager worker.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConfigError`] for a zero limit, or the factory's
    /// error if the first worker cannot be spawned.
    pub fn new(factory: Box<dyn WorkerFactory>, limit: usize) -> Result<Self, DispatchError> {
        if limit == 0 {
            return Err(DispatchError::ConfigError(
                "worker limit must be positive".to_string(),
            ));
        }
        let requests = SharedQueue::new();
        let results = SharedQueue::new();
        let first = factory.spawn_worker(requests.clone(), results.clone())?;
        Ok(Self {
            factory,
            workers: vec![first],
            limit,
            requests,
            results,
            shut_down: false,
        })
    }

    /// Append a request to the outbound queue, growing the pool by one
    /// worker when every existing worker is busy and the limit allows.
    ///
    /// This is the sole growth trigger; growth decisions run only on the
    /// controller context, serialized with enqueue.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ConnectionError`] once the pool is shut down, or the
    /// factory's error if a growth spawn fails (the request stays queued for
    /// the existing workers in that case).
    pub fn enqueue(&mut self, request: QueuedRequest) -> Result<(), DispatchError> {
        if self.shut_down {
            return Err(DispatchError::ConnectionError(
                "worker pool is shut down".to_string(),
            ));
        }
        self.requests.push(request)?;
        if self.workers.len() < self.limit && self.workers.iter().all(|w| w.is_busy()) {
            let worker = self
                .factory
                .spawn_worker(self.requests.clone(), self.results.clone())?;
            self.workers.push(worker);
        }
        Ok(())
    }

    /// Dispatch every completed envelope currently available, removing each
    /// invoked callback from `callbacks`. Never blocks.
    ///
    /// Returns the number of callbacks invoked.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnmatchedResult`] when an envelope has no registered
    /// callback — a correlation bug that must not pass silently.
    pub fn drain(
        &mut self,
        callbacks: &mut HashMap<u64, ResultCallback>,
    ) -> Result<usize, DispatchError> {
        let mut dispatched = 0;
        while let Some(envelope) = self.results.try_pop() {
            let Some(callback) = callbacks.remove(&envelope.id) else {
                return Err(DispatchError::UnmatchedResult(envelope.id));
            };
            callback(envelope.payload);
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// Advisory saturation metric: pending outbound requests divided by the
    /// worker limit. Not used internally for backpressure.
    #[must_use]
    pub fn load(&self) -> f64 {
        self.requests.len() as f64 / self.limit as f64
    }

    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn completed_results(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn worker_limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Stop every worker and block until all have terminated. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates the first join failure; the pool still counts as shut
    /// down.
    pub fn shutdown(&mut self) -> Result<(), DispatchError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        for worker in &self.workers {
            worker.request_stop();
        }
        let mut workers = std::mem::take(&mut self.workers);
        for worker in &mut workers {
            worker.join()?;
        }
        Ok(())
    }

    /// Connection state of the first worker. Only the first worker is
    /// guaranteed to exist at construction time; later workers appear
    /// lazily.
    #[must_use]
    pub fn connection_established(&self) -> bool {
        self.workers
            .first()
            .is_some_and(|w| w.connection_established())
    }

    #[must_use]
    pub fn has_connection_error(&self) -> bool {
        self.workers.first().is_some_and(|w| w.has_connection_error())
    }

    #[must_use]
    pub fn last_connection_error(&self) -> Option<String> {
        self.workers.first().and_then(|w| w.last_connection_error())
    }
}
