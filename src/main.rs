//! linkdump - link queue server
//!
//! Main entry point for the linkdump binary.

use clap::Parser;
use linkdump::config::{validate_config_result, LinkDumpConfig};
use linkdump::server::{self, LinkServer};
use linkdump::signals::{self, TRIGGER_CHANNEL_CAPACITY};
use linkdump::transport::MailerTransport;
use linkdump::LinkDump;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::sync::mpsc;

/// linkdump - queue links over HTTP and mail them out in batches
#[derive(Parser, Debug)]
#[command(name = "linkdump")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/linkdump/config.yaml, if present)
    #[arg(short, long, env = "LINKDUMP_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'b', long, env = "LINKDUMP_HOST")]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "LINKDUMP_PORT")]
    port: Option<u16>,

    /// Email address dumps are sent to (default: <user>@localhost)
    #[arg(short, long = "email", env = "LINKDUMP_EMAIL")]
    email: Option<String>,

    /// Minimum links before a non-forced dump
    #[arg(short = 'm', long = "min", env = "LINKDUMP_MIN")]
    link_min: Option<usize>,

    /// Sendmail-compatible program used to deliver dumps
    #[arg(long, env = "LINKDUMP_MAILER")]
    mailer: Option<String>,

    /// Seconds before a delivery attempt is abandoned
    #[arg(long = "mailer-timeout", env = "LINKDUMP_MAILER_TIMEOUT")]
    mailer_timeout: Option<u64>,

    /// Serve Prometheus metrics on /metrics
    #[arg(long, env = "LINKDUMP_METRICS")]
    metrics: bool,
}

impl Cli {
    /// Flags and environment variables win over the config file
    fn apply(self, config: &mut LinkDumpConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(email) = self.email {
            config.email_addr = email;
        }
        if let Some(link_min) = self.link_min {
            config.link_min = link_min;
        }
        if let Some(mailer) = self.mailer {
            config.mailer = mailer;
        }
        if let Some(timeout) = self.mailer_timeout {
            config.mailer_timeout_secs = timeout;
        }
        if self.metrics {
            config.metrics = true;
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = linkdump::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "linkdump stopped");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> linkdump::Result<()> {
    let mut config = match cli.config {
        Some(ref path) => LinkDumpConfig::load(path)?,
        None => LinkDumpConfig::load_default()?,
    };
    cli.apply(&mut config);
    validate_config_result(&config)?;

    tracing::info!(
        email = %config.email_addr,
        link_min = config.link_min,
        mailer = %config.mailer,
        "Configuration loaded"
    );

    let transport = Arc::new(MailerTransport::new(config.build_mailer()));
    let dump = Arc::new(LinkDump::new(config.flush_config(), transport));

    let server = LinkServer::new(dump).with_metrics(config.metrics);
    let addr = config.bind_addr();
    let listener = server::bind(&addr).await?;
    tracing::info!(addr = %addr, metrics = config.metrics, "Binding to {}", addr);

    let (triggers, trigger_rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
    let _signal_listener = signals::listen(triggers)?;

    linkdump::daemon::run(server, listener, trigger_rx).await
}
