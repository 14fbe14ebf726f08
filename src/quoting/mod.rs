//! Quote fetching.

pub mod requester;
pub mod types;

pub use requester::{FetchError, Requester};
pub use types::{FieldPath, FieldPathError, Quote};
