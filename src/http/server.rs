//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the quote handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Stop accepting on the shutdown signal and drain in-flight requests

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::quote::get_quote;
use crate::quoting::Requester;
use crate::relay::{Responder, StageBudgets};
use crate::storage::{Persister, QuoteStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub responder: Responder,
}

/// HTTP server for the quote relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server writing quotes to `store`.
    pub fn new(config: RelayConfig, store: QuoteStore) -> Self {
        let responder = Responder::new(
            Requester::new(config.upstream.bid_field.clone()),
            Persister::new(store),
            config.upstream.source_url.as_str(),
            StageBudgets::from(&config),
        );

        let router = Self::build_router(AppState { responder });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/cotacao", get(get_quote))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Router with all layers, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            source_url = %self.config.upstream.source_url,
            fetch_ms = self.config.timeouts.fetch_ms,
            persist_ms = self.config.timeouts.persist_ms,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
