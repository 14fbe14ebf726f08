//! SQLite-backed quote store.
//!
//! # Responsibilities
//! - Open the shared connection pool once at startup
//! - Create the quote table idempotently
//! - Expose read-back queries for inspection
//! - Close the pool once at shutdown
//!
//! # Design Decisions
//! - `bid` keeps NUMERIC affinity; `bid_text` keeps the exact string the
//!   source sent and is what read-back returns

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::config::validation::is_sql_identifier;
use crate::config::StorageConfig;

/// Errors raised while opening or preparing the store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid table name `{0}`")]
    InvalidTable(String),

    #[error("failed to open database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to create schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// One persisted quote, as read back from the sink.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct QuoteRecord {
    pub id: i64,
    pub bid: String,
    pub created_at: String,
}

/// Handle to the durable sink, cheap to clone and shared by every request.
#[derive(Debug, Clone)]
pub struct QuoteStore {
    pool: SqlitePool,
    table: Arc<str>,
}

impl QuoteStore {
    /// Open the database and make sure the quote table exists.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        if !is_sql_identifier(&config.table) {
            return Err(StorageError::InvalidTable(config.table.clone()));
        }

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        let store = Self {
            pool,
            table: Arc::from(config.table.as_str()),
        };
        store.ensure_schema().await?;

        tracing::info!(
            database_url = %config.database_url,
            table = %store.table,
            "Quote store ready"
        );

        Ok(store)
    }

    /// Create the quote table if it does not exist yet.
    ///
    /// Tables created before `bid_text` existed get the column added.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bid NUMERIC NOT NULL,
                bid_text TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            self.table
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Schema)?;

        let has_text: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = 'bid_text'",
        )
        .bind(&*self.table)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Schema)?;

        if has_text == 0 {
            let alter = format!("ALTER TABLE {} ADD COLUMN bid_text TEXT", self.table);
            sqlx::query(&alter)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Schema)?;
            tracing::info!(table = %self.table, "Added bid_text column");
        }
        Ok(())
    }

    /// Underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn insert_sql(&self) -> String {
        format!("INSERT INTO {} (bid, bid_text) VALUES (?, ?)", self.table)
    }

    /// Most recent records, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<QuoteRecord>, StorageError> {
        let sql = format!(
            "SELECT id, COALESCE(bid_text, CAST(bid AS TEXT)) AS bid,
                    CAST(created_at AS TEXT) AS created_at
             FROM {} ORDER BY id DESC LIMIT ?",
            self.table
        );
        let records = sqlx::query_as::<_, QuoteRecord>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Number of persisted quotes.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Close every pooled connection. Later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(table = %self.table, "Quote store closed");
    }
}
