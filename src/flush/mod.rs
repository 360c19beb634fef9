//! Flush decisions and dump formatting
//!
//! A flush turns the queued links into one [`DumpMessage`] and hands it to a
//! transport. The queue is only emptied once the transport accepts the
//! message; anything else is a [`FlushOutcome`] that leaves it alone.

mod message;

pub use message::{DumpMessage, TIMESTAMP_FORMAT};

use crate::transport::TransportError;
use std::time::Duration;

/// Default minimum number of links before a non-forced dump goes out
pub const DEFAULT_LINK_MIN: usize = 10;

/// Default upper bound on one delivery attempt (30 seconds)
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Startup-time flush settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushConfig {
    /// Minimum queue size for a non-forced dump
    pub link_min: usize,

    /// Where dumps are delivered
    pub email_addr: String,

    /// Delivery attempts running longer than this count as failures
    pub delivery_timeout: Duration,
}

impl FlushConfig {
    pub fn new(email_addr: impl Into<String>) -> Self {
        Self {
            link_min: DEFAULT_LINK_MIN,
            email_addr: email_addr.into(),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_link_min(mut self, link_min: usize) -> Self {
        self.link_min = link_min;
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Whether a queue of `size` links may be dumped
    pub fn permits(&self, size: usize, force: bool) -> Result<(), FlushOutcome> {
        if size == 0 {
            return Err(FlushOutcome::EmptyQueue);
        }
        if size < self.link_min && !force {
            return Err(FlushOutcome::ThresholdNotMet {
                size,
                minimum: self.link_min,
            });
        }
        Ok(())
    }
}

/// What a flush did
#[derive(Debug)]
pub enum FlushOutcome {
    /// Transport accepted the dump; these links left the queue
    Delivered { count: usize },

    /// Nothing queued
    EmptyQueue,

    /// Not forced and below the configured minimum
    ThresholdNotMet { size: usize, minimum: usize },

    /// Transport failed; queue unchanged
    Failed(TransportError),
}

impl FlushOutcome {
    /// True only when the queue was committed (links removed)
    pub fn is_committed(&self) -> bool {
        matches!(self, FlushOutcome::Delivered { .. })
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            FlushOutcome::Delivered { .. } => "delivered",
            FlushOutcome::EmptyQueue => "empty",
            FlushOutcome::ThresholdNotMet { .. } => "below_minimum",
            FlushOutcome::Failed(_) => "failed",
        }
    }
}
