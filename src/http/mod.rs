//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → quote.rs (GET /cotacao)
//!     → relay::Responder (fetch → persist)
//!     → 200 {"bid": "..."} | 5xx plain text
//! ```

pub mod quote;
pub mod server;

pub use server::{AppState, HttpServer};
