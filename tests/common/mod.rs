//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quote_relay::config::RelayConfig;
use quote_relay::lifecycle::{serve_on, Shutdown};
use quote_relay::storage::QuoteStore;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a mock backend answering every request with `status` and `body`
/// after `delay`. Returns the bound address.
pub async fn start_mock_backend(delay: Duration, status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (status, body.to_string())
    })
    .await
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// A relay running on an ephemeral port, writing to a temporary database.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub store: QuoteStore,
    pub shutdown: Shutdown,
    pub database_url: String,
    server: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestRelay {
    /// Start a relay whose upstream is `source`, with the given budgets.
    pub async fn start(source: SocketAddr, fetch_ms: u64, persist_ms: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = RelayConfig::default();
        config.upstream.source_url = format!("http://{source}/json/last/USD-BRL");
        config.timeouts.fetch_ms = fetch_ms;
        config.timeouts.persist_ms = persist_ms;
        config.storage.database_url =
            format!("sqlite://{}", dir.path().join("currencies.db").display());

        let store = QuoteStore::connect(&config.storage).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let database_url = config.storage.database_url.clone();
        let server_store = store.clone();
        let server = tokio::spawn(async move {
            let _ = serve_on(listener, config, server_store, rx).await;
        });

        Self {
            addr,
            store,
            shutdown,
            database_url,
            server,
            _dir: dir,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/cotacao", self.addr)
    }

    /// Stop accepting, drain, and wait for the store to close.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.server.await;
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Log lines written by the relay while a test runs.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route every event on the current thread into the buffer until the
    /// returned guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let logs = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || logs.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
