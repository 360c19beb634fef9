//! Dump message formatting

use crate::queue::Link;
use chrono::{DateTime, Local};
use std::fmt;

/// Layout of the timestamp in the subject line (same as `date` on Unix)
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// One outgoing dump, built from a queue snapshot
///
/// Renders as a minimal RFC 822 message that sendmail-style transports
/// accept on stdin:
///
/// ```text
/// Subject: linkdump - Tue Jan  2 03:04:05 +00:00 2024
/// To: me@localhost
///
/// 1. https://example.com/a
/// 2. https://example.com/b
/// ```
#[derive(Debug, Clone)]
pub struct DumpMessage {
    timestamp: DateTime<Local>,
    recipient: String,
    links: Vec<Link>,
}

impl DumpMessage {
    /// Build a message stamped with the current time
    pub fn new(recipient: impl Into<String>, links: Vec<Link>) -> Self {
        Self::with_timestamp(Local::now(), recipient, links)
    }

    pub fn with_timestamp(
        timestamp: DateTime<Local>,
        recipient: impl Into<String>,
        links: Vec<Link>,
    ) -> Self {
        Self {
            timestamp,
            recipient: recipient.into(),
            links,
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> String {
        format!("linkdump - {}", self.timestamp.format(TIMESTAMP_FORMAT))
    }

    /// Full message text handed to the transport
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DumpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject())?;
        writeln!(f, "To: {}", self.recipient)?;
        writeln!(f)?;
        for (i, link) in self.links.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, link)?;
        }
        Ok(())
    }
}
