//! Deadline-guarded quote persistence.
//!
//! # Responsibilities
//! - Refuse to touch the sink when the persist scope is already over
//! - Insert one row per quote inside a transaction
//! - Roll back instead of committing when the write outlived the scope
//!
//! # Design Decisions
//! - The write is never raced against the deadline; the scope is checked
//!   before taking a connection, again once the transaction is open, and
//!   again before commit
//! - At most one row per call

use std::time::Duration;

use thiserror::Error;

use crate::quoting::Quote;
use crate::resilience::DeadlineScope;
use crate::storage::store::QuoteStore;

/// Errors that can occur while persisting a quote.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The scope was already over when the write was about to start.
    #[error("timeout: persist budget of {0:?} exhausted before the write")]
    DeadlineExceeded(Duration),

    /// The insert finished after the scope ended and was rolled back.
    #[error("timeout: write took longer than the persist budget of {0:?}, rolled back")]
    RolledBack(Duration),

    /// The sink failed.
    #[error("storage error: {0}")]
    Sink(#[from] sqlx::Error),
}

impl PersistError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PersistError::DeadlineExceeded(_) => "deadline_exceeded",
            PersistError::RolledBack(_) => "rolled_back",
            PersistError::Sink(_) => "sink",
        }
    }

    pub fn is_timeout(&self) -> bool {
        !matches!(self, PersistError::Sink(_))
    }
}

/// Writes quotes to the durable sink.
#[derive(Debug, Clone)]
pub struct Persister {
    store: QuoteStore,
    insert_sql: String,
}

impl Persister {
    pub fn new(store: QuoteStore) -> Self {
        let insert_sql = store.insert_sql();
        Self { store, insert_sql }
    }

    /// Store backing this persister.
    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    /// Insert `quote` and return the id assigned by the sink.
    pub async fn save(&self, scope: &DeadlineScope, quote: &Quote) -> Result<i64, PersistError> {
        if scope.is_expired() {
            return Err(PersistError::DeadlineExceeded(scope.budget()));
        }

        let mut tx = self.store.pool().begin().await?;
        // Waiting for a pooled connection can use up the budget.
        if scope.is_expired() {
            tx.rollback().await?;
            return Err(PersistError::DeadlineExceeded(scope.budget()));
        }

        let id = sqlx::query(&self.insert_sql)
            .bind(quote.bid())
            .bind(quote.bid())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        if scope.is_expired() {
            tx.rollback().await?;
            return Err(PersistError::RolledBack(scope.budget()));
        }

        tx.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::storage::store::tests::file_config;
    use sqlx::{Connection, SqliteConnection};
    use tempfile::TempDir;

    async fn persister(dir: &TempDir) -> Persister {
        Persister::new(QuoteStore::connect(&file_config(dir)).await.unwrap())
    }

    #[tokio::test]
    async fn save_inserts_one_row() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir).await;

        let scope = DeadlineScope::new(Duration::from_secs(5));
        let id = persister.save(&scope, &Quote::new("5.43")).await.unwrap();

        let records = persister.store().recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].bid, "5.43");
        assert!(!records[0].created_at.is_empty());
    }

    #[tokio::test]
    async fn bid_round_trips_without_reformatting() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir).await;

        let sent = ["5.4312", "5.4310", "5.00", "05.43", "1e3", "0.1"];
        for bid in sent {
            let scope = DeadlineScope::new(Duration::from_secs(5));
            persister.save(&scope, &Quote::new(bid)).await.unwrap();
        }

        let bids: Vec<String> = persister
            .store()
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .rev()
            .map(|record| record.bid)
            .collect();
        assert_eq!(bids, sent);

        // The numeric column still stores a number.
        let stored: String =
            sqlx::query_scalar("SELECT typeof(bid) FROM currency WHERE bid_text = '5.00'")
                .fetch_one(persister.store().pool())
                .await
                .unwrap();
        assert_eq!(stored, "integer");
    }

    #[tokio::test]
    async fn expired_scope_never_touches_sink() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir).await;

        let scope = DeadlineScope::new(Duration::ZERO);
        let err = persister.save(&scope, &Quote::new("5.43")).await.unwrap_err();

        assert!(matches!(err, PersistError::DeadlineExceeded(_)));
        assert!(err.is_timeout());
        assert_eq!(persister.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn slow_write_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let persister = persister(&dir).await;

        // Hold the write lock so the insert has to wait past its budget.
        let mut blocker = SqliteConnection::connect(&config.database_url).await.unwrap();
        sqlx::query("BEGIN IMMEDIATE").execute(&mut blocker).await.unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            sqlx::query("COMMIT").execute(&mut blocker).await.unwrap();
            blocker
        });

        let scope = DeadlineScope::new(Duration::from_millis(20));
        let err = persister.save(&scope, &Quote::new("5.43")).await.unwrap_err();
        let _ = release.await.unwrap().close().await;

        assert!(matches!(err, PersistError::RolledBack(_)), "got {err}");
        assert_eq!(persister.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn budget_spent_waiting_for_connection_skips_insert() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            max_connections: 1,
            ..file_config(&dir)
        };
        let persister = Persister::new(QuoteStore::connect(&config).await.unwrap());

        // Take the only pooled connection and hand it back after the budget.
        let held = persister.store().pool().acquire().await.unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(held);
        });

        let scope = DeadlineScope::new(Duration::from_millis(20));
        let err = persister.save(&scope, &Quote::new("5.43")).await.unwrap_err();
        release.await.unwrap();

        assert!(matches!(err, PersistError::DeadlineExceeded(_)), "got {err}");
        assert_eq!(persister.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_store_surfaces_sink_error() {
        let dir = TempDir::new().unwrap();
        let persister = persister(&dir).await;
        persister.store().close().await;

        let scope = DeadlineScope::new(Duration::from_secs(5));
        let err = persister.save(&scope, &Quote::new("5.43")).await.unwrap_err();
        assert!(matches!(err, PersistError::Sink(_)));
        assert!(!err.is_timeout());
    }
}
