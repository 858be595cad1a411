//! Storage backends and the gated facade over them.

mod backend;
mod database;
mod memory;

pub use backend::{ExistsFn, Probes, StorageBackend};
pub use database::{Database, WriteOutcome};
pub use memory::{ColumnDef, MemoryBackend};
