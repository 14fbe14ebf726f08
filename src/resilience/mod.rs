//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → CancelGuard (fires when the handler future is dropped)
//!     → fetch DeadlineScope (own budget + inherited cancel signal)
//!     → persist DeadlineScope (own budget, fresh clock, no cancel signal)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed stage is reported, never replayed

pub mod timeouts;

pub use timeouts::{CancelGuard, CancelSignal, DeadlineScope, ScopeExpired};
