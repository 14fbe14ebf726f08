//! Per-request stages of the relay.
//!
//! ```text
//! Received → Fetching ─┬─▶ FetchFailed (error response)
//!                      └─▶ Fetched → Persisting ─┬─▶ PersistFailed ─┐
//!                                                └─▶ Persisted ─────┴─▶ Responded
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Fetching,
    FetchFailed,
    Fetched,
    Persisting,
    PersistFailed,
    Persisted,
    Responded,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Fetching => "fetching",
            Stage::FetchFailed => "fetch_failed",
            Stage::Fetched => "fetched",
            Stage::Persisting => "persisting",
            Stage::PersistFailed => "persist_failed",
            Stage::Persisted => "persisted",
            Stage::Responded => "responded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
