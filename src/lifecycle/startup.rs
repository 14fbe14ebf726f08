//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the quote store (the one process-wide sink handle)
//! - Bind the listener and serve until shutdown
//! - Close the store after the server has drained
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when the store is ready)
//! - The store is closed on every exit path once it was opened

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::storage::{QuoteStore, StorageError};

/// Errors that stop the relay from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Open the store, bind, and serve until `shutdown` fires.
pub async fn serve(
    config: RelayConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let store = QuoteStore::connect(&config.storage).await?;

    let listener = match TcpListener::bind(&config.server.bind_address).await {
        Ok(listener) => listener,
        Err(source) => {
            store.close().await;
            return Err(StartupError::Bind {
                address: config.server.bind_address.clone(),
                source,
            });
        }
    };

    serve_on(listener, config, store, shutdown).await
}

/// Serve on an already-bound listener with an already-open store.
///
/// Takes ownership of the store and closes it after the server stops.
pub async fn serve_on(
    listener: TcpListener,
    config: RelayConfig,
    store: QuoteStore,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let server = HttpServer::new(config, store.clone());
    let result = server.run(listener, shutdown).await;
    store.close().await;
    result.map_err(StartupError::Serve)
}
