//! Shared link queue service
//!
//! [`LinkDump`] owns the queue, the flush settings and the transport. One
//! instance is created at startup and shared (behind an `Arc`) by the HTTP
//! handlers and the signal dispatcher, so every trigger goes through the same
//! [`LinkDump::flush`].
//!
//! # Locking
//!
//! - `queue` guards every read-modify-write of the links. Submits hold it for
//!   validate + append + position.
//! - `flush_gate` serializes flushes. It is held for the whole flush,
//!   including delivery, so two triggers never mail the same snapshot.
//!
//! A flush takes the queue lock twice: once to decide and snapshot, once to
//! drain the delivered prefix after the transport succeeded. Delivery runs
//! without the queue lock, so submits keep working while the mailer is slow;
//! links that arrive meanwhile stay queued for the next dump.

use crate::flush::{DumpMessage, FlushConfig, FlushOutcome};
use crate::metrics;
use crate::queue::{Link, LinkQueue, ValidationError};
use crate::transport::{self, Transport, TransportError};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// The link queue service
pub struct LinkDump {
    queue: Mutex<LinkQueue>,
    flush_gate: Mutex<()>,
    config: FlushConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for LinkDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkDump")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

impl LinkDump {
    /// Create a service with an empty queue
    pub fn new(config: FlushConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            queue: Mutex::new(LinkQueue::new()),
            flush_gate: Mutex::new(()),
            config,
            transport,
        }
    }

    /// Validate and queue a link, returning its 1-based position
    pub async fn submit(&self, raw: &str) -> Result<usize, ValidationError> {
        let mut queue = self.queue.lock().await;
        match queue.submit(raw) {
            Ok(position) => {
                tracing::info!(position, link = raw.trim(), "Queueing link");
                metrics::record_submitted();
                metrics::set_queue_depth(queue.len());
                Ok(position)
            }
            Err(e) => {
                tracing::debug!(reason = e.reason(), "Rejected link");
                metrics::record_rejected(e.reason());
                Err(e)
            }
        }
    }

    /// Snapshot of the queue as `(position, link)` pairs
    pub async fn list(&self) -> Vec<(usize, Link)> {
        let queue = self.queue.lock().await;
        queue.list().map(|(i, link)| (i, link.clone())).collect()
    }

    /// Number of queued links
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Dump the queue if allowed
    ///
    /// Empty queues are never dumped. Below `link_min` only a forced flush
    /// proceeds. The queue loses exactly the delivered links, and only when
    /// the transport succeeds.
    ///
    /// Not cancellation safe: dropping the future after delivery but before
    /// the commit leaves delivered links queued. Callers that can be
    /// cancelled, like request handlers, run it on its own task.
    pub async fn flush(&self, force: bool) -> FlushOutcome {
        let _gate = self.flush_gate.lock().await;

        let snapshot = {
            let queue = self.queue.lock().await;
            if let Err(outcome) = self.config.permits(queue.len(), force) {
                match &outcome {
                    FlushOutcome::ThresholdNotMet { size, minimum } => {
                        tracing::info!(size, minimum, "Too few links to dump");
                    }
                    _ => tracing::info!("Nothing to dump, link queue is empty"),
                }
                metrics::record_dump(outcome.label());
                return outcome;
            }
            queue.snapshot()
        };

        let count = snapshot.len();
        tracing::info!(size = count, force, "Dumping link queue to email");

        let message = DumpMessage::new(&self.config.email_addr, snapshot);
        let outcome = match self.deliver(&message).await {
            Ok(()) => {
                let mut queue = self.queue.lock().await;
                if queue.len() == count {
                    queue.clear();
                    tracing::info!(delivered = count, "Successful dump, link queue reset");
                } else {
                    queue.drain_delivered(count);
                    tracing::info!(
                        delivered = count,
                        remaining = queue.len(),
                        "Successful dump, keeping links queued during delivery"
                    );
                }
                metrics::set_queue_depth(queue.len());
                FlushOutcome::Delivered { count }
            }
            Err(e) => {
                tracing::error!(
                    transport = self.transport.name(),
                    kind = e.kind(),
                    error = %e,
                    "Failed to run mailer"
                );
                if let Some(output) = e.diagnostic() {
                    tracing::error!(output = ?output, "Failed mailer output");
                }
                tracing::warn!(size = count, "Failed dump, link queue unchanged");
                FlushOutcome::Failed(e)
            }
        };

        metrics::record_dump(outcome.label());
        outcome
    }

    /// One delivery attempt, bounded by the configured timeout
    async fn deliver(&self, message: &DumpMessage) -> transport::Result<()> {
        let body = message.render();
        let timeout = self.config.delivery_timeout;
        let started = Instant::now();

        let result = tokio::time::timeout(
            timeout,
            self.transport.deliver(message.recipient(), &body),
        )
        .await
        .unwrap_or_else(|_| Err(TransportError::TimedOut(timeout)));

        metrics::record_delivery_duration(started.elapsed().as_secs_f64());
        result
    }
}
