//! Quote relay library.
//!
//! A `GET /cotacao` service that fetches the USD→BRL bid from a remote
//! quote source, records it in SQLite and answers `{"bid": "..."}`, plus a
//! one-shot client that writes the relay's answer to a file.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quoting;
pub mod relay;
pub mod resilience;
pub mod storage;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
