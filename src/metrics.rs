//! Prometheus metrics
//!
//! Queue and dump counters, exposed on `GET /metrics` when enabled.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};

lazy_static! {
    /// Counter: links accepted into the queue
    pub static ref LINKS_SUBMITTED: Counter = register_counter!(
        "linkdump_links_submitted_total",
        "Total links accepted into the queue"
    )
    .expect("Failed to create links_submitted metric");

    /// Counter: submissions rejected by validation
    pub static ref LINKS_REJECTED: CounterVec = register_counter_vec!(
        "linkdump_links_rejected_total",
        "Total rejected submissions by reason",
        &["reason"]
    )
    .expect("Failed to create links_rejected metric");

    /// Gauge: links currently waiting for a dump
    pub static ref QUEUE_DEPTH: Gauge = register_gauge!(
        "linkdump_queue_depth",
        "Current number of queued links"
    )
    .expect("Failed to create queue_depth metric");

    /// Counter: dump attempts by outcome
    pub static ref DUMPS: CounterVec = register_counter_vec!(
        "linkdump_dumps_total",
        "Total dump attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to create dumps metric");

    /// Histogram: time spent handing a dump to the transport (seconds)
    pub static ref DELIVERY_DURATION: Histogram = register_histogram!(
        "linkdump_delivery_duration_seconds",
        "Duration of delivery attempts",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create delivery_duration metric");
}

/// Record an accepted link
pub fn record_submitted() {
    LINKS_SUBMITTED.inc();
}

/// Record a rejected submission
pub fn record_rejected(reason: &str) {
    LINKS_REJECTED.with_label_values(&[reason]).inc();
}

/// Set queue depth
pub fn set_queue_depth(depth: usize) {
    QUEUE_DEPTH.set(depth as f64);
}

/// Record a dump outcome
pub fn record_dump(outcome: &str) {
    DUMPS.with_label_values(&[outcome]).inc();
}

/// Record how long a delivery attempt took
pub fn record_delivery_duration(duration_secs: f64) {
    DELIVERY_DURATION.observe(duration_secs);
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
