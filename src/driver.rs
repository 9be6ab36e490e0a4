//! Reference periodic driver for hosts without their own tick source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connector::Connector;

/// Calls [`Connector::check_results`] at a fixed cadence from a tokio task.
///
/// The task exits when [`stop`](Self::stop) is awaited or when the connector
/// reports closed. Hosts with their own schedulers skip this type and call
/// `check_results` themselves.
pub struct Ticker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl Ticker {
    /// Spawn the drain task on the current tokio runtime.
    #[must_use]
    pub fn spawn(connector: Arc<Mutex<Connector>>, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if stop_flag.load(Ordering::Acquire) {
                    break;
                }
                let drained = {
                    let mut connector = match connector.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if connector.is_closed() {
                        break;
                    }
                    connector.check_results()
                };
                if let Err(err) = drained {
                    // Correlation violations must not pass silently.
                    tracing::error!("result drain failed: {err}");
                }
            }
        });
        Self { handle, stop }
    }

    /// Whether the drain task has exited (e.g. after the connector closed).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        self.handle.abort();
        let _ = self.handle.await;
    }
}
