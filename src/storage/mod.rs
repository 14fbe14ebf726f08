//! Durable sink subsystem.
//!
//! # Data Flow
//! ```text
//! startup: QuoteStore::connect (pool + CREATE TABLE IF NOT EXISTS)
//!     → cloned into every request task
//!     → Persister::save (guard → INSERT → guard → COMMIT | ROLLBACK)
//! shutdown: QuoteStore::close
//! ```

pub mod persister;
pub mod store;

pub use persister::{PersistError, Persister};
pub use store::{QuoteRecord, QuoteStore, StorageError};
