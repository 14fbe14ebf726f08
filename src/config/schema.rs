//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay
//! and its client. All types derive Serde traits for deserialization from
//! config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::quoting::FieldPath;

/// Root configuration shared by the relay server and the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Upstream quote source.
    pub upstream: UpstreamConfig,

    /// Durable sink settings.
    pub storage: StorageConfig,

    /// Per-stage budgets of the relay.
    pub timeouts: TimeoutConfig,

    /// Client binary settings.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream quote source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL answering `{"USDBRL": {"bid": "..."}}`.
    pub source_url: String,

    /// Path of the bid inside the source payload.
    pub bid_field: FieldPath,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            source_url: "https://economia.awesomeapi.com.br/json/last/USD-BRL".to_string(),
            bid_field: FieldPath::source_bid(),
        }
    }
}

/// Durable sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL (e.g., "sqlite://currencies.db").
    pub database_url: String,

    /// Table receiving one row per fetched quote.
    pub table: String,

    /// Pool size shared by all request tasks.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://currencies.db".to_string(),
            table: "currency".to_string(),
            max_connections: 5,
        }
    }
}

/// Per-stage budgets in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for the call to the quote source.
    pub fetch_ms: u64,

    /// Budget for the database write. Starts when the write is attempted.
    pub persist_ms: u64,
}

impl TimeoutConfig {
    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_ms: 200,
            persist_ms: 10,
        }
    }
}

/// Client binary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay endpoint.
    pub server_url: String,

    /// Path of the bid inside the relay response.
    pub bid_field: FieldPath,

    /// Budget for the call to the relay.
    pub timeout_ms: u64,

    /// File overwritten with the fetched quote.
    pub output_path: String,

    /// Label written before the bid.
    pub label: String,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/cotacao".to_string(),
            bid_field: FieldPath::relay_bid(),
            timeout_ms: 10,
            output_path: "cotacao.txt".to_string(),
            label: "Dólar".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
