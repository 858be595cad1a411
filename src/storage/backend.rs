//! Backend boundary: raw storage operations and injected existence probes.

use serde_json::Value;

use crate::query::Condition;
use crate::types::{Record, Result};

/// Raw storage operations behind the gated facade.
///
/// Implementations do the work and nothing else; every precondition
/// (existence, selection, type consistency) lives in
/// [`Database`](crate::storage::Database). Table-scope operations address
/// the backend's currently selected database.
pub trait StorageBackend {
    fn create_database(&mut self, name: &str) -> Result<bool>;

    /// Make `name` the target of subsequent table-scope operations.
    fn switch_database(&mut self, name: &str) -> Result<bool>;

    fn drop_database(&mut self, name: &str) -> Result<bool>;

    /// Create a table from `(column name, sample value)` pairs. The backend
    /// derives each column's SQL type from its sample.
    fn create_table(&mut self, table: &str, columns: &[(String, Value)]) -> Result<bool>;

    fn drop_table(&mut self, table: &str) -> Result<bool>;

    fn insert(&mut self, table: &str, record: &Record) -> Result<bool>;

    /// Merge `record` into every row matching `filter` (all rows when
    /// `None`).
    fn update(&mut self, table: &str, record: &Record, filter: Option<&Condition>)
        -> Result<bool>;

    fn delete(&mut self, table: &str, filter: Option<&Condition>) -> Result<bool>;

    fn select(&self, table: &str, filter: Option<&Condition>) -> Result<Vec<Record>>;
}

/// Existence predicate evaluated against a backend.
pub type ExistsFn<B> = Box<dyn Fn(&B, &str) -> Result<bool> + Send + Sync>;

/// Existence probes a concrete backend supplies to the facade.
///
/// Keeping these injected, rather than trait methods, decouples the gate
/// logic from any storage engine; the facade treats "no probes registered"
/// as a configuration error on first use.
pub struct Probes<B> {
    pub database_exists: ExistsFn<B>,
    pub table_exists: ExistsFn<B>,
}
