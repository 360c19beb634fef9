//! HTTP server
//!
//! Plain-text interface to the link queue.
//!
//! # Routes
//!
//! - `GET /` - List queued links
//! - `POST /` - Queue a link (form field `link`)
//! - `/dump` - Trigger a dump; `?force` skips the minimum-size check
//! - `GET /metrics` - Prometheus metrics (only when enabled)
//!
//! Anything else gets a 403.
//!
//! # Example
//!
//! ```no_run
//! use linkdump::flush::FlushConfig;
//! use linkdump::server::LinkServer;
//! use linkdump::transport::MailerTransport;
//! use linkdump::LinkDump;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let dump = Arc::new(LinkDump::new(
//!         FlushConfig::new("me@localhost"),
//!         Arc::new(MailerTransport::default()),
//!     ));
//!
//!     LinkServer::new(dump)
//!         .run("127.0.0.1:1234", std::future::pending())
//!         .await
//!         .expect("Server failed");
//! }
//! ```

use crate::linkdump::LinkDump;
use crate::{metrics, LinkDumpError, Result};
use axum::{
    extract::{rejection::FormRejection, DefaultBodyLimit, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Form, Router,
};
use serde::Deserialize;
use std::fmt::Write;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Largest accepted request body (a form with one link)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// How long open connections may keep the server alive after shutdown
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared server state
struct AppState {
    dump: Arc<LinkDump>,
}

/// HTTP server for the link queue
pub struct LinkServer {
    state: Arc<AppState>,
    metrics: bool,
    shutdown_grace: Duration,
}

impl LinkServer {
    pub fn new(dump: Arc<LinkDump>) -> Self {
        Self {
            state: Arc::new(AppState { dump }),
            metrics: false,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Serve Prometheus metrics on `/metrics`
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics = enabled;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// The service the handlers operate on
    pub fn dump(&self) -> &Arc<LinkDump> {
        &self.state.dump
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(list_links).post(submit_link).fallback(forbidden))
            .route("/dump", any(dump));

        if self.metrics {
            router = router.route("/metrics", get(serve_metrics).fallback(forbidden));
        }

        router
            .fallback(forbidden)
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .with_state(self.state.clone())
    }

    /// Run the server on the given address until `shutdown` resolves
    pub async fn run<F>(self, addr: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = bind(addr).await?;
        tracing::info!(addr, metrics = self.metrics, "Binding to {}", addr);
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// In-flight requests get `shutdown_grace` to finish; connections still
    /// open after that are dropped.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let grace = self.shutdown_grace;
        let (requested_tx, requested_rx) = oneshot::channel();
        let shutdown = async move {
            shutdown.await;
            let _ = requested_tx.send(());
        };

        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return result.map_err(LinkDumpError::Io),
            _ = requested_rx => {}
        }

        match tokio::time::timeout(grace, server).await {
            Ok(result) => result.map_err(LinkDumpError::Io),
            Err(_) => {
                tracing::warn!(?grace, "Connections still open after shutdown grace, closing");
                Ok(())
            }
        }
    }
}

/// Bind a TCP listener, reporting the address on failure
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| LinkDumpError::Bind {
            addr: addr.to_string(),
            source,
        })
}

// ============================================================================
// Request types
// ============================================================================

/// Form body for `POST /`
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub link: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_links(State(state): State<Arc<AppState>>) -> String {
    let links = state.dump.list().await;
    if links.is_empty() {
        return "linkdump queue is empty!\n".to_string();
    }

    let mut body = String::from("linkdump queue:\n\n");
    for (position, link) in links {
        let _ = writeln!(body, "{}. {}", position, link);
    }
    body
}

async fn submit_link(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<SubmitForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable submit form");
            return (StatusCode::BAD_REQUEST, "400 Bad Request\n").into_response();
        }
    };

    match state.dump.submit(&form.link).await {
        Ok(position) => format!("Link #{} pushed to queue!\n", position).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            format!("400 Bad Request ({})\n", e),
        )
            .into_response(),
    }
}

async fn dump(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> &'static str {
    let force = query.as_deref().is_some_and(|q| has_key(q, "force"));

    // Runs detached so a client hanging up cannot interrupt the commit
    let dump = state.dump.clone();
    let committed = match tokio::spawn(async move { dump.flush(force).await }).await {
        Ok(outcome) => outcome.is_committed(),
        Err(e) => {
            tracing::error!(error = %e, "Dump task failed");
            false
        }
    };

    if committed {
        "Dump successful, email incoming!\n"
    } else {
        "Dump failed, see log for details\n"
    }
}

/// Whether `key` appears in a raw query string, with or without a value
fn has_key(query: &str, key: &str) -> bool {
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some(key))
}

async fn serve_metrics() -> impl IntoResponse {
    (
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}

async fn forbidden() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, "403 Method Not Allowed\n")
}
