//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (budgets > 0, addresses parse)
//! - Enforce budget nesting (persist strictly shorter than fetch)
//! - Keep the table name safe to interpolate into SQL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: `{value}` is not an http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.persist_ms ({persist_ms}) must be shorter than timeouts.fetch_ms ({fetch_ms})")]
    PersistBudgetNotNested { persist_ms: u64, fetch_ms: u64 },

    #[error("storage.database_url: `{0}` is not an sqlite URL")]
    InvalidDatabaseUrl(String),

    #[error("storage.table: `{0}` is not a valid identifier")]
    InvalidTableName(String),

    #[error("storage.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("client.output_path must not be empty")]
    EmptyOutputPath,
}

/// Whether `name` can be used unquoted as an SQL identifier.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "server.bind_address", &config.server.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_url(&mut errors, "upstream.source_url", &config.upstream.source_url);
    check_url(&mut errors, "client.server_url", &config.client.server_url);

    let timeouts = &config.timeouts;
    if timeouts.fetch_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.fetch_ms"));
    }
    if timeouts.persist_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.persist_ms"));
    }
    if timeouts.persist_ms >= timeouts.fetch_ms && timeouts.fetch_ms > 0 {
        errors.push(ValidationError::PersistBudgetNotNested {
            persist_ms: timeouts.persist_ms,
            fetch_ms: timeouts.fetch_ms,
        });
    }
    if config.client.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("client.timeout_ms"));
    }

    let storage = &config.storage;
    if !storage.database_url.starts_with("sqlite:") {
        errors.push(ValidationError::InvalidDatabaseUrl(storage.database_url.clone()));
    }
    if !is_sql_identifier(&storage.table) {
        errors.push(ValidationError::InvalidTableName(storage.table.clone()));
    }
    if storage.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    if config.client.output_path.trim().is_empty() {
        errors.push(ValidationError::EmptyOutputPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
