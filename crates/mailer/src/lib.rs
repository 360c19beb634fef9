//! Sendmail-compatible mail transport wrapper for Rust
//!
//! Hands a fully formatted message to a command-line mail transport agent
//! (`msmtp` by default, anything that speaks the `sendmail <recipient>` calling
//! convention works). The agent receives the recipient as its last argument
//! and the message on stdin. Its exit status is the only success signal.
//!
//! # Example
//!
//! ```no_run
//! use mailer::Mailer;
//! use std::time::Duration;
//!
//! # async fn demo() -> mailer::Result<()> {
//! let mailer = Mailer::new("msmtp").with_timeout(Duration::from_secs(10));
//!
//! let message = "Subject: hello\nTo: me@localhost\n\nbody\n";
//! let output = mailer.send("me@localhost", message).await?;
//! println!("mailer said: {}", output.combined());
//! # Ok(())
//! # }
//! ```

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Program used when none is configured
pub const DEFAULT_PROGRAM: &str = "msmtp";

/// Upper bound on a single delivery attempt (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when handing a message to the mailer
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is not installed or not in PATH")]
    NotInstalled(String),

    #[error("Failed to start mailer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to open stdin pipe to mailer")]
    StdinUnavailable,

    #[error("Failed to write message to mailer: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to wait for mailer: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Mailer exited with {status}")]
    Failed {
        status: ExitStatus,
        output: CommandOutput,
    },

    #[error("Mailer did not finish within {0:?}")]
    TimedOut(Duration),
}

impl Error {
    /// True when the mailer never got to see the message
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::NotInstalled(_) | Error::Spawn(_) | Error::StdinUnavailable
        )
    }

    /// Diagnostic output captured from the mailer, if it ran to completion
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            Error::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result type for mailer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Output from a mailer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Get combined stdout and stderr output
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Mail transport agent wrapper
#[derive(Debug, Clone)]
pub struct Mailer {
    program: String,
    /// Arguments placed before the recipient
    args: Vec<String>,
    timeout: Duration,
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Mailer {
    /// Create a mailer that runs `program <recipient>`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add arguments passed before the recipient
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the delivery timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program that will be executed
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Delivery timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver `message` to `recipient`
    ///
    /// The message is streamed to the mailer's stdin while its output is
    /// collected, so a chatty mailer cannot deadlock on a full pipe. On
    /// timeout the child is killed.
    pub async fn send(&self, recipient: &str, message: &str) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(recipient)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, recipient, "Spawning mailer");

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotInstalled(self.program.clone())
            } else {
                Error::Spawn(e)
            }
        })?;

        let mut stdin = child.stdin.take().ok_or(Error::StdinUnavailable)?;

        let write = async move {
            let result = stdin.write_all(message.as_bytes()).await;
            // Closing stdin is what tells the mailer the message is complete
            drop(stdin);
            result
        };

        let (written, output) = tokio::time::timeout(self.timeout, async move {
            tokio::join!(write, child.wait_with_output())
        })
        .await
        .map_err(|_| Error::TimedOut(self.timeout))?;

        let output = output.map_err(Error::Wait)?;
        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        // A mailer that bails out early also breaks the pipe; its exit status
        // is the more useful diagnostic.
        if !output.status.success() {
            return Err(Error::Failed {
                status: output.status,
                output: result,
            });
        }

        written.map_err(Error::Write)?;

        Ok(result)
    }
}
