//! Service log setup
//!
//! Everything goes to stderr through `tracing`. Queue and dump events log at
//! `info`, mailer output at `debug`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparseable
pub const DEFAULT_FILTER: &str = "info";

/// `RUST_LOG` if it parses, [`DEFAULT_FILTER`] otherwise
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// `RUST_LOG=linkdump=debug,mailer=debug` shows rejected links and whatever
/// the mailer printed; `RUST_LOG=warn` keeps only failed dumps.
///
/// Fails if a subscriber is already installed.
pub fn init() -> crate::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| crate::LinkDumpError::Other(format!("Failed to initialize tracing: {}", e)))
}

/// Like [`init`], ignoring an already installed subscriber
pub fn init_test() {
    let _ = init();
}
