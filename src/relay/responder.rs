//! Fetch-then-persist orchestration for one inbound request.
//!
//! # Responsibilities
//! - Open the fetch scope from the caller's cancel signal and the fetch budget
//! - Open a fresh persist scope once the quote is in hand
//! - Absorb persist failures; only fetch failures reach the caller
//! - Log each failure with the stage it happened in
//!
//! # Design Decisions
//! - The persist scope never inherits time or cancellation from the request
//! - Persistence runs in its own task and is awaited, so the response waits
//!   for it but a caller disconnect cannot abort it

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::quoting::{FetchError, Quote, Requester};
use crate::relay::stage::Stage;
use crate::resilience::{CancelSignal, DeadlineScope};
use crate::storage::{PersistError, Persister};

/// Budgets of the two bounded stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBudgets {
    pub fetch: Duration,
    pub persist: Duration,
}

impl From<&RelayConfig> for StageBudgets {
    fn from(config: &RelayConfig) -> Self {
        Self {
            fetch: config.timeouts.fetch(),
            persist: config.timeouts.persist(),
        }
    }
}

/// Result of a request whose fetch succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relayed {
    pub quote: Quote,
    /// `Persisted` or `PersistFailed`.
    pub stage: Stage,
    /// Id assigned by the sink when persisted.
    pub record_id: Option<i64>,
}

/// Composes the requester and the persister.
#[derive(Debug, Clone)]
pub struct Responder {
    requester: Requester,
    persister: Persister,
    source_url: Arc<str>,
    budgets: StageBudgets,
}

impl Responder {
    pub fn new(
        requester: Requester,
        persister: Persister,
        source_url: impl Into<Arc<str>>,
        budgets: StageBudgets,
    ) -> Self {
        Self {
            requester,
            persister,
            source_url: source_url.into(),
            budgets,
        }
    }

    /// Run one request through fetch and persist.
    ///
    /// `caller` fires when the inbound request goes away; it ends the fetch
    /// early but has no effect once persistence has started.
    pub async fn respond(&self, caller: CancelSignal) -> Result<Relayed, FetchError> {
        tracing::debug!(stage = %Stage::Received, "Quote requested");

        let quote = self.fetch(caller).await?;
        tracing::debug!(stage = %Stage::Fetched, bid = %quote.bid(), "Quote fetched");

        let (stage, record_id) = match self.persist(quote.clone()).await {
            Some(id) => (Stage::Persisted, Some(id)),
            None => (Stage::PersistFailed, None),
        };

        Ok(Relayed {
            quote,
            stage,
            record_id,
        })
    }

    async fn fetch(&self, caller: CancelSignal) -> Result<Quote, FetchError> {
        let start = Instant::now();
        let scope = DeadlineScope::with_cancel(self.budgets.fetch, caller);
        tracing::debug!(
            stage = %Stage::Fetching,
            budget_ms = scope.budget().as_millis() as u64,
            url = %self.source_url,
            "Calling quote source"
        );

        let result = self.requester.fetch(&scope, &self.source_url).await;
        match &result {
            Ok(_) => metrics::record_fetch("ok", start),
            Err(e) => {
                metrics::record_fetch(e.kind(), start);
                log_fetch_failure(e, &scope);
            }
        }
        result
    }

    async fn persist(&self, quote: Quote) -> Option<i64> {
        let scope = DeadlineScope::new(self.budgets.persist);
        tracing::debug!(
            stage = %Stage::Persisting,
            budget_ms = scope.budget().as_millis() as u64,
            "Saving quote"
        );

        let persister = self.persister.clone();
        let task = tokio::spawn(async move {
            let result = persister.save(&scope, &quote).await;
            (result, scope.elapsed())
        });

        match task.await {
            Ok((Ok(id), elapsed)) => {
                metrics::record_persist("ok");
                tracing::debug!(
                    stage = %Stage::Persisted,
                    record_id = id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Quote saved"
                );
                Some(id)
            }
            Ok((Err(e), elapsed)) => {
                metrics::record_persist(e.kind());
                log_persist_failure(&e, elapsed);
                None
            }
            Err(e) => {
                metrics::record_persist("panicked");
                tracing::error!(stage = %Stage::PersistFailed, error = %e, "Persist task failed");
                None
            }
        }
    }
}

fn log_fetch_failure(error: &FetchError, scope: &DeadlineScope) {
    let elapsed_ms = scope.elapsed().as_millis() as u64;
    match error {
        FetchError::DeadlineExceeded(budget) => tracing::warn!(
            stage = %Stage::FetchFailed,
            budget_ms = budget.as_millis() as u64,
            elapsed_ms,
            "Timeout when calling quote source"
        ),
        FetchError::Cancelled => tracing::info!(
            stage = %Stage::FetchFailed,
            elapsed_ms,
            "Caller went away while calling quote source"
        ),
        FetchError::Transport(e) => tracing::error!(
            stage = %Stage::FetchFailed,
            error = %e,
            elapsed_ms,
            "Quote source unreachable"
        ),
        _ if error.is_bad_data() => tracing::error!(
            stage = %Stage::FetchFailed,
            error = %error,
            elapsed_ms,
            "Quote source returned bad data"
        ),
        _ => tracing::error!(
            stage = %Stage::FetchFailed,
            error = %error,
            elapsed_ms,
            "Quote source failed"
        ),
    }
}

fn log_persist_failure(error: &PersistError, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if error.is_timeout() {
        tracing::warn!(
            stage = %Stage::PersistFailed,
            error = %error,
            elapsed_ms,
            "Timeout when saving quote to database"
        );
    } else {
        tracing::error!(
            stage = %Stage::PersistFailed,
            error = %error,
            elapsed_ms,
            "Failed to save quote to database"
        );
    }
}
