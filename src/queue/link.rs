//! Validated link type

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder URL browsers report for an empty tab; never worth mailing
pub const BLANK_SENTINEL: &str = "about:blank";

/// Reasons a submitted link is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty link is invalid")]
    EmptyLink,

    #[error("about:blank is invalid")]
    BlankSentinel,
}

impl ValidationError {
    /// Short label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::EmptyLink => "empty",
            ValidationError::BlankSentinel => "blank",
        }
    }
}

/// A submitted link
///
/// Always trimmed, never empty and never `about:blank`. The only way to get
/// one is [`Link::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link(String);

impl Link {
    /// Trim and validate a raw submission
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let link = raw.trim();
        if link.is_empty() {
            return Err(ValidationError::EmptyLink);
        }
        if link == BLANK_SENTINEL {
            return Err(ValidationError::BlankSentinel);
        }
        Ok(Self(link.to_string()))
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Link {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
