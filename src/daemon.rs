//! Service lifecycle
//!
//! Ties the HTTP server to the trigger dispatcher: the server runs until a
//! terminating trigger has had its forced dump, then stops within the
//! server's shutdown grace.

use crate::server::LinkServer;
use crate::signals::{self, ShutdownCoordinator, Trigger};
use crate::Result;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serve `listener` and handle `triggers` until shutdown
///
/// Returns once the server has stopped. That happens after a terminating
/// trigger, or when the trigger channel closes.
pub async fn run(
    server: LinkServer,
    listener: TcpListener,
    triggers: mpsc::Receiver<Trigger>,
) -> Result<()> {
    let shutdown = ShutdownCoordinator::new();
    let stopped = shutdown.signal();
    let dispatcher = tokio::spawn(signals::dispatch(server.dump().clone(), triggers, shutdown));

    let result = server.serve(listener, stopped.wait()).await;

    // Already finished unless the server failed
    dispatcher.abort();
    if result.is_ok() {
        tracing::info!("Shutdown complete");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flush::FlushConfig;
    use crate::linkdump::LinkDump;
    use crate::signals::TRIGGER_CHANNEL_CAPACITY;
    use crate::transport::testing::{FailingTransport, RecordingTransport};
    use crate::transport::Transport;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    fn server(transport: Arc<dyn Transport>) -> LinkServer {
        let dump = Arc::new(LinkDump::new(
            FlushConfig::new("me@localhost").with_link_min(10),
            transport,
        ));
        LinkServer::new(dump).with_shutdown_grace(Duration::from_millis(200))
    }

    async fn stalled_client(listener: &TcpListener) -> TcpStream {
        let mut client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        client
            .write_all(b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 100\r\n\r\nlink=a")
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_terminate_dumps_and_stops_with_open_connection() {
        let transport = Arc::new(RecordingTransport::default());
        let server = server(transport.clone());
        let dump = server.dump().clone();
        dump.submit("https://a.example").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = stalled_client(&listener).await;

        let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
        let running = tokio::spawn(run(server, listener, rx));
        tokio::time::sleep(Duration::from_millis(100)).await;

        tx.send(Trigger::Terminate("SIGTERM")).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("service kept running after terminate");
        assert!(result.unwrap().is_ok());

        assert_eq!(transport.sent().len(), 1);
        assert!(dump.is_empty().await);
        drop(client);
    }

    #[tokio::test]
    async fn test_terminate_stops_even_if_final_dump_fails() {
        let transport = Arc::new(FailingTransport::default());
        let server = server(transport.clone());
        let dump = server.dump().clone();
        dump.submit("https://a.example").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
        let running = tokio::spawn(run(server, listener, rx));

        tx.send(Trigger::Terminate("SIGINT")).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("service kept running after terminate");
        assert!(result.unwrap().is_ok());

        assert_eq!(transport.attempts(), 1);
        assert_eq!(dump.len().await, 1);
    }

    #[tokio::test]
    async fn test_soft_trigger_keeps_serving() {
        let transport = Arc::new(RecordingTransport::default());
        let server = server(transport.clone());
        let dump = server.dump().clone();
        dump.submit("https://a.example").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = mpsc::channel(TRIGGER_CHANNEL_CAPACITY);
        let running = tokio::spawn(run(server, listener, rx));

        tx.send(Trigger::Flush).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!running.is_finished());
        assert!(transport.sent().is_empty());

        tx.send(Trigger::ForceFlush).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!running.is_finished());
        assert_eq!(transport.sent().len(), 1);

        // Closing the channel ends the dispatcher, which releases the server
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
