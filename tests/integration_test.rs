//! Integration tests for linkdump
//!
//! These tests drive the HTTP router end to end with a real mailer process
//! (a small shell script standing in for msmtp).

#![cfg(unix)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use linkdump::config::LinkDumpConfig;
use linkdump::server::LinkServer;
use linkdump::transport::MailerTransport;
use linkdump::LinkDump;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Config whose mailer appends each message to `<dir>/outbox`
fn capturing_config(dir: &Path, link_min: usize) -> LinkDumpConfig {
    let mut config = LinkDumpConfig::new();
    config.email_addr = "links@example.com".to_string();
    config.link_min = link_min;
    config.mailer = "sh".to_string();
    config.mailer_args = vec![
        "-c".to_string(),
        format!(
            "printf 'to=%s\\n' \"$1\" >> '{0}'; cat >> '{0}'",
            dir.join("outbox").display()
        ),
        "mailer".to_string(),
    ];
    config.mailer_timeout_secs = 5;
    config
}

/// Config whose mailer always fails
fn failing_config(link_min: usize) -> LinkDumpConfig {
    let mut config = LinkDumpConfig::new();
    config.email_addr = "links@example.com".to_string();
    config.link_min = link_min;
    config.mailer = "sh".to_string();
    config.mailer_args = vec![
        "-c".to_string(),
        "cat > /dev/null; echo 'msmtp: cannot connect' >&2; exit 69".to_string(),
        "mailer".to_string(),
    ];
    config
}

fn build(config: &LinkDumpConfig) -> (LinkServer, Arc<LinkDump>) {
    let transport = Arc::new(MailerTransport::new(config.build_mailer()));
    let dump = Arc::new(LinkDump::new(config.flush_config(), transport));
    (LinkServer::new(dump.clone()), dump)
}

async fn call(server: &LinkServer, request: Request<Body>) -> (StatusCode, String) {
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn submit(server: &LinkServer, link: &str) -> (StatusCode, String) {
    let body = format!("link={}", link.replace(' ', "+"));
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    call(server, request).await
}

async fn get(server: &LinkServer, uri: &str) -> (StatusCode, String) {
    call(server, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

mod delivery_tests {
    use super::*;

    #[tokio::test]
    async fn test_threshold_dump_delivers_formatted_message() {
        let temp_dir = TempDir::new().unwrap();
        let config = capturing_config(temp_dir.path(), 2);
        let (server, dump) = build(&config);

        assert_eq!(submit(&server, "first").await.1, "Link #1 pushed to queue!\n");
        assert_eq!(get(&server, "/dump").await.1, "Dump failed, see log for details\n");
        assert!(!temp_dir.path().join("outbox").exists());

        assert_eq!(submit(&server, " second ").await.1, "Link #2 pushed to queue!\n");
        assert_eq!(get(&server, "/dump").await.1, "Dump successful, email incoming!\n");
        assert!(dump.is_empty().await);

        let outbox = std::fs::read_to_string(temp_dir.path().join("outbox")).unwrap();
        let mut lines = outbox.lines();
        assert_eq!(lines.next(), Some("to=links@example.com"));
        assert!(lines.next().unwrap().starts_with("Subject: linkdump - "));
        assert_eq!(lines.next(), Some("To: links@example.com"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("1. first"));
        assert_eq!(lines.next(), Some("2. second"));
        assert_eq!(lines.next(), None);

        assert_eq!(get(&server, "/").await.1, "linkdump queue is empty!\n");
    }

    #[tokio::test]
    async fn test_positions_restart_after_dump() {
        let temp_dir = TempDir::new().unwrap();
        let config = capturing_config(temp_dir.path(), 10);
        let (server, _) = build(&config);

        submit(&server, "a").await;
        submit(&server, "b").await;
        assert_eq!(get(&server, "/dump?force").await.1, "Dump successful, email incoming!\n");

        assert_eq!(submit(&server, "c").await.1, "Link #1 pushed to queue!\n");
        assert_eq!(get(&server, "/").await.1, "linkdump queue:\n\n1. c\n");
    }

    #[tokio::test]
    async fn test_failed_mailer_keeps_queue_for_retry() {
        let config = failing_config(1);
        let (server, dump) = build(&config);

        submit(&server, "a").await;
        submit(&server, "b").await;
        let before = get(&server, "/").await.1;

        assert_eq!(get(&server, "/dump?force").await.1, "Dump failed, see log for details\n");
        assert_eq!(get(&server, "/").await.1, before);
        assert_eq!(dump.len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_mailer_keeps_queue() {
        let mut config = LinkDumpConfig::new();
        config.mailer = "linkdump-test-no-such-mailer".to_string();
        config.link_min = 1;
        let (server, dump) = build(&config);

        submit(&server, "a").await;
        assert_eq!(get(&server, "/dump").await.1, "Dump failed, see log for details\n");
        assert_eq!(dump.len().await, 1);
    }

    #[tokio::test]
    async fn test_slow_mailer_times_out() {
        let mut config = failing_config(1);
        config.mailer_args = vec!["-c".to_string(), "sleep 10".to_string(), "mailer".to_string()];
        config.mailer_timeout_secs = 1;
        let (server, dump) = build(&config);

        submit(&server, "a").await;
        assert_eq!(get(&server, "/dump").await.1, "Dump failed, see log for details\n");
        assert_eq!(dump.len().await, 1);
    }
}

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn test_config_file_drives_service() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        capturing_config(temp_dir.path(), 1).save(&config_path).unwrap();
        let config = LinkDumpConfig::load(&config_path).unwrap();
        linkdump::config::validate_config_result(&config).unwrap();

        let (server, _) = build(&config);
        submit(&server, "https://example.com").await;
        assert_eq!(get(&server, "/dump").await.1, "Dump successful, email incoming!\n");

        let outbox = std::fs::read_to_string(temp_dir.path().join("outbox")).unwrap();
        assert!(outbox.contains("1. https://example.com\n"));
    }
}
