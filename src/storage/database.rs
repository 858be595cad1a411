//! Gated database facade.
//!
//! Wraps a [`StorageBackend`] and runs every operation through its
//! precondition gates before anything is delegated: existence probes for
//! database and table scope, the selection requirement, and the
//! type-consistency gate backed by [`TypeRegistry`].

use serde_json::Value;

use crate::query::Condition;
use crate::schema::{TypeMismatch, TypeRegistry};
use crate::storage::backend::{Probes, StorageBackend};
use crate::storage::memory::MemoryBackend;
use crate::types::{DatabaseError, Record, Result};

/// How a gated insert or update ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The backend applied the write and its shape was recorded.
    Applied,
    /// The type gate refused the record; nothing reached the backend.
    Rejected(Vec<TypeMismatch>),
    /// The gates passed but the backend reported failure.
    Failed,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

/// Schema-aware facade over a storage backend.
///
/// Database-scope operations are gated on the injected existence probes;
/// table-scope operations additionally require a selected database, and
/// writes pass the type-consistency check before they are delegated. The
/// first accepted write to a table teaches the registry that table's
/// column types.
///
/// # Example
///
/// ```
/// use relgate::{Database, WriteOutcome};
/// use serde_json::json;
///
/// let mut db = Database::in_memory();
/// db.create_database("app")?;
/// db.switch_database("app")?;
/// db.create_table("users", &[
///     ("name".to_string(), json!("alice")),
///     ("age".to_string(), json!(30)),
/// ])?;
///
/// let row = json!({"name": "alice", "age": 30});
/// assert!(db.insert("users", row.as_object().unwrap())?.is_applied());
///
/// // A later write with a different shape is refused, not applied.
/// let bad = json!({"name": 42});
/// let outcome = db.insert("users", bad.as_object().unwrap())?;
/// assert!(matches!(outcome, WriteOutcome::Rejected(_)));
/// # Ok::<(), relgate::DatabaseError>(())
/// ```
pub struct Database<B: StorageBackend> {
    backend: B,
    probes: Option<Probes<B>>,
    current: Option<String>,
    registry: TypeRegistry,
}

impl Database<MemoryBackend> {
    /// Facade over a fresh [`MemoryBackend`] with its probes wired up.
    pub fn in_memory() -> Self {
        Database::with_probes(MemoryBackend::new(), MemoryBackend::probes())
    }
}

impl<B: StorageBackend> Database<B> {
    /// Wrap a backend without probes. Every gated operation fails with a
    /// configuration error until [`register_probes`](Self::register_probes)
    /// is called.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            probes: None,
            current: None,
            registry: TypeRegistry::new(),
        }
    }

    pub fn with_probes(backend: B, probes: Probes<B>) -> Self {
        let mut db = Self::new(backend);
        db.register_probes(probes);
        db
    }

    pub fn register_probes(&mut self, probes: Probes<B>) {
        self.probes = Some(probes);
    }

    /// Database selected by the last successful switch, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registry of learned column types, for inspection.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Create `name` unless it already exists; an existing database only
    /// logs a warning and still reports success.
    pub fn create_database(&mut self, name: &str) -> Result<bool> {
        if self.database_exists(name)? {
            tracing::warn!(database = %name, "Database already exists");
            return Ok(true);
        }
        self.registry.ensure_database(name);
        self.backend.create_database(name)
    }

    /// Make `name` the target of subsequent table-scope operations. A
    /// missing database logs a warning and reports `false`.
    pub fn switch_database(&mut self, name: &str) -> Result<bool> {
        if !self.database_exists(name)? {
            tracing::warn!(database = %name, "Database does not exist");
            return Ok(false);
        }
        self.registry.ensure_database(name);
        let switched = self.backend.switch_database(name)?;
        if switched {
            self.current = Some(name.to_string());
        }
        Ok(switched)
    }

    /// Drop `name`. Dropping a missing database is an error, not a no-op.
    /// The current selection is left untouched even when it named the
    /// dropped database.
    pub fn drop_database(&mut self, name: &str) -> Result<bool> {
        if !self.database_exists(name)? {
            return Err(DatabaseError::DatabaseNotExists(name.to_string()));
        }
        self.registry.ensure_database(name);
        self.backend.drop_database(name)
    }

    /// Create a table from `(column name, sample value)` pairs. An existing
    /// table only logs a warning and still reports success, leaving its
    /// definition as it was.
    pub fn create_table(&mut self, table: &str, columns: &[(String, Value)]) -> Result<bool> {
        let db = self.selected()?.to_string();
        if self.table_exists(table)? {
            tracing::warn!(table = %table, database = %db, "Table already exists");
            return Ok(true);
        }
        self.backend.create_table(table, columns)
    }

    pub fn drop_table(&mut self, table: &str) -> Result<bool> {
        self.selected()?;
        if !self.table_exists(table)? {
            return Err(DatabaseError::TableNotExists(table.to_string()));
        }
        self.backend.drop_table(table)
    }

    /// Insert `record`, subject to the type gate.
    pub fn insert(&mut self, table: &str, record: &Record) -> Result<WriteOutcome> {
        self.gated_write(table, record, |backend, table, record| {
            backend.insert(table, record)
        })
    }

    /// Merge `record` into rows matching `filter`, subject to the type
    /// gate. New columns introduced by an accepted update are learned just
    /// like on insert.
    pub fn update(
        &mut self,
        table: &str,
        record: &Record,
        filter: Option<&Condition>,
    ) -> Result<WriteOutcome> {
        self.gated_write(table, record, |backend, table, record| {
            backend.update(table, record, filter)
        })
    }

    pub fn delete(&mut self, table: &str, filter: Option<&Condition>) -> Result<bool> {
        self.selected()?;
        if !self.table_exists(table)? {
            return Err(DatabaseError::TableNotExists(table.to_string()));
        }
        self.backend.delete(table, filter)
    }

    pub fn select(&self, table: &str, filter: Option<&Condition>) -> Result<Vec<Record>> {
        self.selected()?;
        if !self.table_exists(table)? {
            return Err(DatabaseError::TableNotExists(table.to_string()));
        }
        self.backend.select(table, filter)
    }

    fn gated_write<F>(&mut self, table: &str, record: &Record, apply: F) -> Result<WriteOutcome>
    where
        F: FnOnce(&mut B, &str, &Record) -> Result<bool>,
    {
        let db = self.selected()?.to_string();
        if !self.table_exists(table)? {
            return Err(DatabaseError::TableNotExists(table.to_string()));
        }

        let (consistent, mismatches) = self.registry.check(&db, table, record);
        if !consistent {
            tracing::warn!(
                table = %table,
                database = %db,
                mismatches = ?mismatches,
                "Write rejected by type check"
            );
            return Ok(WriteOutcome::Rejected(mismatches));
        }

        if apply(&mut self.backend, table, record)? {
            self.registry.record_write(&db, table, record);
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Failed)
        }
    }

    fn selected(&self) -> Result<&str> {
        self.current
            .as_deref()
            .ok_or(DatabaseError::DatabaseNotSelected)
    }

    fn probes(&self) -> Result<&Probes<B>> {
        self.probes.as_ref().ok_or_else(|| {
            DatabaseError::ConfigError("existence probes must be registered before use".to_string())
        })
    }

    fn database_exists(&self, name: &str) -> Result<bool> {
        (self.probes()?.database_exists)(&self.backend, name)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        (self.probes()?.table_exists)(&self.backend, table)
    }
}
