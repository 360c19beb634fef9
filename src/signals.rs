//! Signal-driven dumps and shutdown
//!
//! A listener task turns OS signals into [`Trigger`]s and forwards them over
//! a channel. A dispatcher task consumes them and calls the same
//! [`LinkDump::flush`] the HTTP handlers use.
//!
//! | Signal | Trigger | Effect |
//! |---|---|---|
//! | SIGUSR1 | `Flush` | dump if the minimum is met |
//! | SIGUSR2 | `ForceFlush` | dump regardless of the minimum |
//! | SIGTERM, SIGINT | `Terminate` | forced dump, then shut down whatever the outcome |
//!
//! On non-Unix platforms only Ctrl-C is recognised, as `Terminate`.

use crate::linkdump::LinkDump;
use crate::Result;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the trigger channel
pub const TRIGGER_CHANNEL_CAPACITY: usize = 16;

/// What a caught signal asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Respect the minimum queue size
    Flush,

    /// Ignore the minimum queue size
    ForceFlush,

    /// Forced dump, then exit; carries the signal name
    Terminate(&'static str),
}

impl Trigger {
    pub fn force(&self) -> bool {
        !matches!(self, Trigger::Flush)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Trigger::Terminate(_))
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Flush => write!(f, "SIGUSR1"),
            Trigger::ForceFlush => write!(f, "SIGUSR2"),
            Trigger::Terminate(name) => write!(f, "{}", name),
        }
    }
}

/// Resolves once shutdown has been requested
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the shutdown signal
    ///
    /// Also resolves if the coordinator is dropped.
    pub async fn wait(mut self) {
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }
}

/// Requests shutdown of everything holding a [`ShutdownSignal`]
#[derive(Debug)]
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Get a signal receiver
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Trigger shutdown
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Register signal handlers and forward caught signals to `triggers`
///
/// Handlers are installed before this returns, so registration errors are
/// reported to the caller instead of being lost in the task.
#[cfg(unix)]
pub fn listen(triggers: mpsc::Sender<Trigger>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let register = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| {
            crate::LinkDumpError::Signal(format!("Failed to set up {} handler: {}", name, e))
        })
    };

    tracing::info!("Registering signal handlers");
    let mut sigusr1 = register(SignalKind::user_defined1(), "SIGUSR1")?;
    let mut sigusr2 = register(SignalKind::user_defined2(), "SIGUSR2")?;
    let mut sigterm = register(SignalKind::terminate(), "SIGTERM")?;
    let mut sigint = register(SignalKind::interrupt(), "SIGINT")?;

    Ok(tokio::spawn(async move {
        loop {
            let trigger = tokio::select! {
                Some(()) = sigusr1.recv() => Trigger::Flush,
                Some(()) = sigusr2.recv() => Trigger::ForceFlush,
                Some(()) = sigterm.recv() => Trigger::Terminate("SIGTERM"),
                Some(()) = sigint.recv() => Trigger::Terminate("SIGINT"),
                else => break,
            };

            if triggers.send(trigger).await.is_err() {
                tracing::debug!(signal = %trigger, "Dispatcher gone, stopping signal listener");
                break;
            }
            if trigger.is_terminal() {
                break;
            }
        }
    }))
}

/// Forward Ctrl-C to `triggers` (non-Unix platforms)
#[cfg(not(unix))]
pub fn listen(triggers: mpsc::Sender<Trigger>) -> Result<JoinHandle<()>> {
    tracing::info!("Registering Ctrl-C handler");
    Ok(tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        let _ = triggers.send(Trigger::Terminate("ctrl-c")).await;
    }))
}

/// Run dumps for incoming triggers until a terminating one arrives
///
/// A terminating trigger always gets its forced dump attempt first; shutdown
/// is requested whether or not that dump succeeds.
pub async fn dispatch(
    dump: Arc<LinkDump>,
    mut triggers: mpsc::Receiver<Trigger>,
    shutdown: ShutdownCoordinator,
) {
    while let Some(trigger) = triggers.recv().await {
        tracing::info!(signal = %trigger, force = trigger.force(), "Caught signal");
        let outcome = dump.flush(trigger.force()).await;

        if trigger.is_terminal() {
            tracing::info!(
                signal = %trigger,
                outcome = outcome.label(),
                committed = outcome.is_committed(),
                "Exiting..."
            );
            shutdown.shutdown();
            return;
        }
    }
}
