//! Storage backends for the ledger and the short-lived key-value state.

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::{open_pool, SqliteKvStore, SqliteLedgerStore};
