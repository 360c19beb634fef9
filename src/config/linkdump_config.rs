//! linkdump configuration file handling
//!
//! Loads the optional ~/.config/linkdump/config.yaml. Every field has a
//! default, so a missing file or a partial one is fine.

use crate::flush::{FlushConfig, DEFAULT_LINK_MIN};
use crate::Result;
use mailer::Mailer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1234
}

fn default_link_min() -> usize {
    DEFAULT_LINK_MIN
}

fn default_mailer() -> String {
    mailer::DEFAULT_PROGRAM.to_string()
}

fn default_mailer_timeout_secs() -> u64 {
    mailer::DEFAULT_TIMEOUT.as_secs()
}

/// `<user>@localhost` for whoever runs the server
pub fn default_email_addr() -> String {
    let user = ["USER", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|u| !u.trim().is_empty()));

    let user = match user {
        Some(user) => user,
        None => {
            tracing::warn!("Could not determine current user, defaulting to root");
            "root".to_string()
        }
    };
    format!("{}@localhost", user.trim())
}

/// linkdump configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDumpConfig {
    /// Address to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Recipient of every dump
    #[serde(default = "default_email_addr")]
    pub email_addr: String,

    /// Minimum queued links before a non-forced dump is sent
    #[serde(default = "default_link_min")]
    pub link_min: usize,

    /// Sendmail-compatible program used for delivery
    #[serde(default = "default_mailer")]
    pub mailer: String,

    /// Extra arguments passed to the mailer before the recipient
    #[serde(default)]
    pub mailer_args: Vec<String>,

    /// Seconds before a delivery attempt is abandoned
    #[serde(default = "default_mailer_timeout_secs")]
    pub mailer_timeout_secs: u64,

    /// Serve Prometheus metrics on /metrics
    #[serde(default)]
    pub metrics: bool,
}

impl LinkDumpConfig {
    /// Create a configuration with every default applied
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            email_addr: default_email_addr(),
            link_min: default_link_min(),
            mailer: default_mailer(),
            mailer_args: Vec::new(),
            mailer_timeout_secs: default_mailer_timeout_secs(),
            metrics: false,
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::LinkDumpError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading linkdump configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            host = %config.host,
            port = config.port,
            link_min = config.link_min,
            mailer = %config.mailer,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load the default config file if there is one, defaults otherwise
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::new())
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving linkdump configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/linkdump/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("linkdump");
        path.push("config.yaml");
        path
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn mailer_timeout(&self) -> Duration {
        Duration::from_secs(self.mailer_timeout_secs)
    }

    /// Flush settings derived from this configuration
    pub fn flush_config(&self) -> FlushConfig {
        FlushConfig::new(&self.email_addr)
            .with_link_min(self.link_min)
            .with_delivery_timeout(self.mailer_timeout())
    }

    /// Mailer invocation derived from this configuration
    pub fn build_mailer(&self) -> Mailer {
        Mailer::new(&self.mailer)
            .with_args(self.mailer_args.iter().cloned())
            .with_timeout(self.mailer_timeout())
    }
}

impl Default for LinkDumpConfig {
    fn default() -> Self {
        Self::new()
    }
}
