//! Request orchestration: the quote source call, then the durable write.

pub mod responder;
pub mod stage;

pub use responder::{Relayed, Responder, StageBudgets};
pub use stage::Stage;
