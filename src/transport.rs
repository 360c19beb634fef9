//! Mail transport abstraction
//!
//! Defines the trait the flush controller delivers dumps through, plus the
//! production implementation backed by a command-line mailer.

use async_trait::async_trait;
use mailer::Mailer;
use std::time::Duration;
use thiserror::Error;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// The message never reached the transport (no pipe, no program)
    #[error("transport setup failed: {0}")]
    Setup(String),

    /// The transport ran but did not accept the message
    #[error("delivery failed: {reason}")]
    Execution { reason: String, output: String },

    #[error("delivery timed out after {0:?}")]
    TimedOut(Duration),
}

impl TransportError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Setup(_) => "setup",
            TransportError::Execution { .. } => "execution",
            TransportError::TimedOut(_) => "timeout",
        }
    }

    /// Whatever the transport printed before failing
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            TransportError::Execution { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

impl From<mailer::Error> for TransportError {
    fn from(err: mailer::Error) -> Self {
        match err {
            mailer::Error::TimedOut(after) => TransportError::TimedOut(after),
            err if err.is_setup() => TransportError::Setup(err.to_string()),
            err => TransportError::Execution {
                output: err.output().map(|o| o.combined()).unwrap_or_default(),
                reason: err.to_string(),
            },
        }
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Something that can deliver a rendered dump to a recipient
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` to `recipient`; `Ok` only if the transport accepted it
    async fn deliver(&self, recipient: &str, message: &str) -> Result<()>;

    /// Name used in log lines
    fn name(&self) -> &str;
}

/// Transport backed by a sendmail-compatible program (msmtp by default)
#[derive(Debug, Clone, Default)]
pub struct MailerTransport {
    mailer: Mailer,
}

impl MailerTransport {
    pub fn new(mailer: Mailer) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Transport for MailerTransport {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<()> {
        let output = self.mailer.send(recipient, message).await?;
        if !output.combined().trim().is_empty() {
            tracing::debug!(output = %output.combined().trim(), "Mailer output");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.mailer.program()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailer_setup_errors_map_to_setup() {
        let err: TransportError = mailer::Error::NotInstalled("msmtp".to_string()).into();
        assert_eq!(err.kind(), "setup");
        assert!(err.diagnostic().is_none());

        let err: TransportError = mailer::Error::StdinUnavailable.into();
        assert_eq!(err.kind(), "setup");
    }

    #[test]
    fn test_mailer_timeout_maps_to_timeout() {
        let err: TransportError = mailer::Error::TimedOut(Duration::from_secs(3)).into();
        assert!(matches!(err, TransportError::TimedOut(d) if d == Duration::from_secs(3)));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_write_error_maps_to_execution() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: TransportError = mailer::Error::Write(io).into();
        assert_eq!(err.kind(), "execution");
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn test_name_is_program() {
        let transport = MailerTransport::new(Mailer::new("sendmail"));
        assert_eq!(transport.name(), "sendmail");
        assert_eq!(MailerTransport::default().name(), "msmtp");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_mailer_keeps_diagnostic() {
        let transport = MailerTransport::new(Mailer::new("sh").with_args([
            "-c",
            "cat > /dev/null; echo 'smtp: auth failed' >&2; exit 1",
            "mailer",
        ]));
        let err = transport
            .deliver("me@localhost", "Subject: x\n\n")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "execution");
        assert_eq!(err.diagnostic().map(str::trim), Some("smtp: auth failed"));
    }
}
