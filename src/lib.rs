//! Relgate - schema-aware write gating and SQL construction for
//! relational stores.
//!
//! Operations pass through precondition gates (existence probes, database
//! selection, learned column types) before touching a backend; conditions
//! and statements compile to parameterized SQL.

pub mod query;
pub mod schema;
pub mod storage;
pub mod sync;
pub mod types;

// Re-export main types
pub use query::{CompareOp, CompiledSql, Condition, Field, SelectBuilder, SortOrder};
pub use schema::{
    compare_record, sql_type_for, value_kind, ColumnTypes, ScalarKind, SqlType, TypeDescriptor,
    TypeMismatch, TypeRegistry,
};
pub use storage::{
    ColumnDef, Database, ExistsFn, MemoryBackend, Probes, StorageBackend, WriteOutcome,
};
pub use sync::{ReadGuard, WritePriorityRwLock, WriteGuard};
pub use types::{DatabaseError, Record, Result};
