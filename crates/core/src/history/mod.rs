//! Run history ledger and its persistence.
//!
//! The ledger is an explicit store object over an injected
//! [`PersistencePort`], so tests can substitute an in-memory port.

pub mod error;
pub mod port;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use port::{FilePort, MemoryPort, PersistencePort};
pub use store::RunHistoryStore;
