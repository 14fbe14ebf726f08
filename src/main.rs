//! Quote relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 QUOTE RELAY                   │
//!   GET /cotacao         │  ┌────────┐   ┌───────────┐   ┌───────────┐  │
//!   ─────────────────────┼─▶│  http  │──▶│ Responder │──▶│ Requester │──┼──▶ Quote source
//!                        │  └────────┘   └─────┬─────┘   └───────────┘  │    (fetch budget)
//!                        │       ▲             │                        │
//!                        │       │             ▼                        │
//!   200 {"bid": "..."}   │       │       ┌───────────┐   ┌───────────┐  │
//!   ◀────────────────────┼───────┴───────│ Persister │──▶│QuoteStore │──┼──▶ SQLite
//!                        │               └───────────┘   └───────────┘  │    (persist budget)
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quote_relay::config::{self, RelayConfig};
use quote_relay::lifecycle::{self, signals, Shutdown};
use quote_relay::observability;

#[derive(Parser)]
#[command(name = "quote-relay")]
#[command(about = "Relays the USD-BRL bid and records every quote", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `upstream.source_url`.
    #[arg(long)]
    source_url: Option<String>,

    /// Override `storage.database_url`.
    #[arg(long)]
    database_url: Option<String>,

    /// Override `timeouts.fetch_ms`.
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,

    /// Override `timeouts.persist_ms`.
    #[arg(long)]
    persist_timeout_ms: Option<u64>,
}

impl Cli {
    fn load(&self) -> Result<RelayConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(url) = &self.source_url {
            config.upstream.source_url = url.clone();
        }
        if let Some(url) = &self.database_url {
            config.storage.database_url = url.clone();
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.timeouts.fetch_ms = ms;
        }
        if let Some(ms) = self.persist_timeout_ms {
            config.timeouts.persist_ms = ms;
        }

        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("quote-relay: {e}");
            return ExitCode::FAILURE;
        }
    };

    observability::logging::init(&config.observability);
    tracing::info!("quote-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_termination(shutdown));

    match lifecycle::serve(config, server_shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "quote-relay failed");
            ExitCode::FAILURE
        }
    }
}
