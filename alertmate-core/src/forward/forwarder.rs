//! Fire-and-forget dispatch of captured events

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::StatusCode;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{Error, Result};
use crate::types::Event;

use super::transport::Transport;

/// Forwarding statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    /// POST requests started
    pub attempted: u64,
    /// Requests answered with a 2xx status
    pub delivered: u64,
    /// Serialization errors, transport errors and non-2xx answers
    pub failed: u64,
    /// Dispatches abandoned by shutdown
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ForwardStats {
        ForwardStats {
            attempted: self.attempted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Relays events to the ingestion endpoint without blocking the caller.
///
/// Every dispatch runs as its own task on the runtime captured at
/// construction, tracked so that [`drain`](Self::drain) can wait for them and
/// [`shutdown`](Self::shutdown) can cancel them. There is no concurrency cap.
/// Dropping the forwarder cancels whatever is still in flight.
pub struct Forwarder {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    tracker: TaskTracker,
    cancel: CancellationToken,
    counters: Arc<Counters>,
}

impl Forwarder {
    /// Create a forwarder bound to the current tokio runtime
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Forward(format!("forwarder needs a tokio runtime: {}", e)))?;
        Ok(Self::with_runtime(transport, runtime))
    }

    /// Create a forwarder that spawns onto `runtime`
    pub fn with_runtime(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Send `event` to `endpoint` in the background.
    ///
    /// Returns immediately. Safe to call from threads outside the runtime.
    pub fn dispatch(&self, event: Event, endpoint: &str) {
        let transport = Arc::clone(&self.transport);
        let counters = Arc::clone(&self.counters);
        let cancel = self.cancel.clone();
        let endpoint = endpoint.to_string();

        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        Counters::bump(&counters.cancelled);
                        tracing::debug!(
                            endpoint = %endpoint,
                            event_id = %event.id,
                            "Dispatch cancelled"
                        );
                    }
                    result = deliver(transport.as_ref(), &event, &endpoint, &counters) => {
                        match result {
                            Ok(status) => {
                                Counters::bump(&counters.delivered);
                                tracing::debug!(
                                    endpoint = %endpoint,
                                    event_id = %event.id,
                                    status = status.as_u16(),
                                    "Forwarded event"
                                );
                            }
                            Err(e) => {
                                // at-most-once: the event is dropped here
                                Counters::bump(&counters.failed);
                                tracing::warn!(
                                    endpoint = %endpoint,
                                    event_id = %event.id,
                                    error = %e,
                                    "Failed to forward event"
                                );
                            }
                        }
                    }
                }
            },
            &self.runtime,
        );
    }

    /// Number of dispatches still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every in-flight dispatch to finish. Dispatching stays possible.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel in-flight dispatches and wait for them to unwind.
    ///
    /// Later dispatches are cancelled as soon as they start.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::debug!(stats = ?self.stats(), "Forwarder shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Get current forwarding statistics
    pub fn stats(&self) -> ForwardStats {
        self.counters.snapshot()
    }
}

impl Drop for Forwarder {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn deliver(
    transport: &dyn Transport,
    event: &Event,
    endpoint: &str,
    counters: &Counters,
) -> Result<StatusCode> {
    let body = event.to_json()?;

    Counters::bump(&counters.attempted);
    let status = transport.post_json(endpoint, body).await?;

    if status.is_success() {
        Ok(status)
    } else {
        Err(Error::Forward(format!("API error ({})", status)))
    }
}
