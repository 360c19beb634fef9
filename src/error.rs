//! Error types for linkdump
//!
//! Startup and wiring failures. Flush-path failures never surface here: they
//! are logged and reduced to a [`crate::flush::FlushOutcome`].

use thiserror::Error;

/// Result type alias for linkdump operations
pub type Result<T> = std::result::Result<T, LinkDumpError>;

/// Errors that can stop the process
#[derive(Error, Debug)]
pub enum LinkDumpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Signal handler registration errors
    #[error("Signal error: {0}")]
    Signal(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
