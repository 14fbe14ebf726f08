//! Outbound quote fetching.
//!
//! # Responsibilities
//! - Issue one GET per call, bound by a deadline scope
//! - Classify the outcome (timeout, cancellation, transport, status, decode)
//! - Extract the bid from the configured field path
//!
//! # Design Decisions
//! - Never retries
//! - Expiry drops the request future, aborting the connection attempt

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::quoting::types::{FieldPath, Quote};
use crate::resilience::{DeadlineScope, ScopeExpired};

/// Errors that can occur while fetching a quote.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The scope's timer fired before a response arrived.
    #[error("timeout: quote source did not answer within {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller went away before a response arrived.
    #[error("request cancelled by caller")]
    Cancelled,

    /// Connection, DNS or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A response arrived with a status other than 200.
    #[error("unexpected status from quote source: {0}")]
    UnexpectedStatus(u16),

    /// The body did not have the expected shape.
    #[error("failed to decode quote: {0}")]
    Decode(String),
}

impl FetchError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::DeadlineExceeded(_) => "deadline_exceeded",
            FetchError::Cancelled => "cancelled",
            FetchError::Transport(_) => "transport",
            FetchError::UnexpectedStatus(_) => "unexpected_status",
            FetchError::Decode(_) => "decode",
        }
    }

    /// Whether the source produced a response we could not use.
    pub fn is_bad_data(&self) -> bool {
        matches!(
            self,
            FetchError::UnexpectedStatus(_) | FetchError::Decode(_)
        )
    }
}

impl From<ScopeExpired> for FetchError {
    fn from(expired: ScopeExpired) -> Self {
        match expired {
            ScopeExpired::DeadlineExceeded(budget) => FetchError::DeadlineExceeded(budget),
            ScopeExpired::Cancelled => FetchError::Cancelled,
        }
    }
}

/// Fetches a quote from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct Requester {
    client: reqwest::Client,
    bid_path: FieldPath,
}

impl Requester {
    /// Create a requester with a default HTTP client.
    pub fn new(bid_path: FieldPath) -> Self {
        Self::with_client(reqwest::Client::new(), bid_path)
    }

    /// Create a requester on top of an existing HTTP client.
    pub fn with_client(client: reqwest::Client, bid_path: FieldPath) -> Self {
        Self { client, bid_path }
    }

    /// Fetch a quote from `url` within `scope`.
    pub async fn fetch(&self, scope: &DeadlineScope, url: &str) -> Result<Quote, FetchError> {
        scope.check()?;
        scope.run(self.send(url)).await?
    }

    async fn send(&self, url: &str) -> Result<Quote, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        let payload: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        tracing::debug!(url = %url, payload = %payload, "Quote payload received");

        let bid = self.bid_path.extract(&payload).ok_or_else(|| {
            FetchError::Decode(format!("missing string field `{}`", self.bid_path))
        })?;

        Ok(Quote::new(bid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_expiry_maps_to_fetch_error() {
        let timeout: FetchError = ScopeExpired::DeadlineExceeded(Duration::from_millis(200)).into();
        assert!(matches!(timeout, FetchError::DeadlineExceeded(d) if d == Duration::from_millis(200)));
        assert!(timeout.to_string().contains("timeout"));

        let cancelled: FetchError = ScopeExpired::Cancelled.into();
        assert_eq!(cancelled.kind(), "cancelled");
    }

    #[test]
    fn bad_data_classification() {
        assert!(FetchError::UnexpectedStatus(503).is_bad_data());
        assert!(FetchError::Decode("eof".into()).is_bad_data());
        assert!(!FetchError::DeadlineExceeded(Duration::ZERO).is_bad_data());
    }

    #[tokio::test]
    async fn expired_scope_skips_network() {
        let requester = Requester::new(FieldPath::relay_bid());
        let scope = DeadlineScope::new(Duration::ZERO);
        // Unroutable on purpose; the scope must fail before any connect.
        let err = requester
            .fetch(&scope, "http://192.0.2.1:9/cotacao")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::DeadlineExceeded(_)));
    }
}
