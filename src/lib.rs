//! linkdump - collect links over HTTP, mail them out in batches
//!
//! Clients POST links to a small HTTP server. They pile up in memory until a
//! dump is triggered (over HTTP or by a signal), at which point the whole
//! queue is formatted as one message and handed to a sendmail-compatible
//! mailer. Links only leave the queue once the mailer accepts the message.
//!
//! # Architecture
//!
//! - **queue**: Link validation and the ordered in-memory store
//! - **flush**: Dump thresholds, outcomes and message formatting
//! - **linkdump**: The shared service tying queue, flush and transport together
//! - **transport**: Delivery trait and the mailer-backed implementation
//! - **server**: Plain-text HTTP interface (axum)
//! - **signals**: SIGUSR1/SIGUSR2 dumps and SIGTERM/SIGINT shutdown
//! - **daemon**: Server and trigger dispatcher lifecycle
//! - **config**: Defaults, YAML config file and validation

// Core modules
pub mod error;
pub mod flush;
pub mod linkdump;
pub mod queue;
pub mod transport;

// Surfaces
pub mod config;
pub mod daemon;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod signals;

// Re-exports
pub use error::{LinkDumpError, Result};
pub use linkdump::LinkDump;
