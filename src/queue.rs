use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::DispatchError;

/// Unbounded thread-safe FIFO shared between the controller and workers.
///
/// Every clone addresses the same underlying channel, so a queue handle can
/// be handed to each worker a pool spawns. Pushes never block; the
/// controller drains with [`try_pop`](Self::try_pop) and workers poll with
/// [`pop_timeout`](Self::pop_timeout) so stop requests are observed
/// promptly.
pub struct SharedQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> SharedQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append an item without blocking.
    ///
    /// # Errors
    ///
    /// Fails only if every other handle to the queue has been dropped.
    pub fn push(&self, item: T) -> Result<(), DispatchError> {
        self.tx
            .send(item)
            .map_err(|_| DispatchError::ConnectionError("shared queue is disconnected".to_string()))
    }

    /// Take the next item if one is immediately available.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next item.
    #[must_use]
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for SharedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for SharedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
