//! One-shot client: ask the relay for a quote and write it to a file.
//!
//! # Data Flow
//! ```text
//! DeadlineScope(client timeout)
//!     → Requester (GET /cotacao, field `bid`)
//!     → sink.rs (overwrite output file)
//! ```
//!
//! # Design Decisions
//! - Every failure is fatal for the run; nothing is retried
//! - The output file is only opened once a quote is in hand

pub mod sink;

use std::path::Path;

use thiserror::Error;

use crate::config::ClientConfig;
use crate::quoting::{FetchError, Quote, Requester};
use crate::resilience::DeadlineScope;

pub use sink::{render_line, write_quote, SinkWriteError};

/// Why a client run failed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("error getting quote: {0}")]
    Fetch(#[from] FetchError),

    #[error("error saving quote: {0}")]
    Sink(#[from] SinkWriteError),
}

/// Run the client once.
pub async fn run(config: &ClientConfig) -> Result<Quote, ClientError> {
    let requester = Requester::new(config.bid_field.clone());
    run_with(&requester, config).await
}

/// Run the client once with a caller-provided requester.
pub async fn run_with(requester: &Requester, config: &ClientConfig) -> Result<Quote, ClientError> {
    let scope = DeadlineScope::new(config.timeout());
    let quote = requester.fetch(&scope, &config.server_url).await?;

    let path = Path::new(&config.output_path);
    write_quote(path, &config.label, &quote).await?;

    tracing::info!(
        bid = %quote.bid(),
        path = %path.display(),
        elapsed_ms = scope.elapsed().as_millis() as u64,
        "Quote saved"
    );
    Ok(quote)
}
