//! Concurrent registry of learned column types.
//!
//! Keyed `database -> table -> column -> TypeDescriptor`. The registry is
//! populated from successful writes only and is monotonically additive:
//! descriptors are never replaced or removed, and dropping a database or
//! table leaves its entries behind.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::schema::descriptor::{compare_record, TypeDescriptor, TypeMismatch};
use crate::sync::WritePriorityRwLock;
use crate::types::Record;

/// Learned column descriptors for one table.
pub type ColumnTypes = BTreeMap<String, TypeDescriptor>;

type TypeMap = BTreeMap<String, BTreeMap<String, ColumnTypes>>;

/// Concurrent, write-prioritized map of learned column types.
///
/// `check` runs under a read lock held for the whole lookup and comparison;
/// `record_write` runs under a write lock held for the whole diff and
/// merge, so a check never observes a half-merged table. The write-priority
/// gate keeps a stream of checks from starving the merge after a write.
pub struct TypeRegistry {
    gate: WritePriorityRwLock,
    // The gate alone decides admission; std::sync::RwLock is only the safe
    // shared cell and is never contended once the gate admits.
    map: RwLock<TypeMap>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            gate: WritePriorityRwLock::new(),
            map: RwLock::new(TypeMap::new()),
        }
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a record against the learned types of `(database, table)`.
    ///
    /// A table that has never been written to (including a database with no
    /// bucket yet) passes vacuously, so first writes can establish types.
    ///
    /// # Returns
    ///
    /// `(true, empty)` when the record conforms or nothing is learned yet;
    /// `(false, mismatches)` otherwise.
    pub fn check(
        &self,
        database: &str,
        table: &str,
        record: &Record,
    ) -> (bool, Vec<TypeMismatch>) {
        let _held = self.gate.read();
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);

        let Some(columns) = map.get(database).and_then(|tables| tables.get(table)) else {
            return (true, Vec::new());
        };

        let mismatches = compare_record(record, columns);
        (mismatches.is_empty(), mismatches)
    }

    /// Learn column types from a record that was successfully written.
    ///
    /// Creates the `(database, table)` entry on first use, then adds only
    /// the top-level columns missing from it. Existing column descriptors
    /// are never replaced, and new nested fields inside an already-known
    /// column are not merged.
    pub fn record_write(&self, database: &str, table: &str, record: &Record) {
        let _held = self.gate.write();
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);

        let columns = map
            .entry(database.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default();

        for (column, value) in record {
            if !columns.contains_key(column) {
                columns.insert(column.clone(), TypeDescriptor::infer(value));
            }
        }
    }

    /// Create the per-database bucket if it does not exist yet.
    ///
    /// Invoked by database-scope operations once their existence gate
    /// passes. `check` never creates the bucket; a missing one just means
    /// nothing is learned.
    pub fn ensure_database(&self, database: &str) {
        let _held = self.gate.write();
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(database.to_string()).or_default();
    }

    /// Whether a per-database bucket exists.
    pub fn has_database(&self, database: &str) -> bool {
        let _held = self.gate.read();
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(database)
    }

    /// Snapshot of a table's learned column descriptors.
    pub fn column_types(&self, database: &str, table: &str) -> Option<ColumnTypes> {
        let _held = self.gate.read();
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(database)
            .and_then(|tables| tables.get(table))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::ScalarKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_first_check_passes_vacuously() {
        let registry = TypeRegistry::new();
        let (ok, mismatches) = registry.check("app", "orders", &record(json!({"id": 1})));
        assert!(ok);
        assert!(mismatches.is_empty());
    }

    #[test]
    fn test_check_is_repeatable_and_creates_nothing() {
        let registry = TypeRegistry::new();
        let incoming = record(json!({"id": 1, "name": "a"}));

        let first = registry.check("app", "orders", &incoming);
        let second = registry.check("app", "orders", &incoming);
        assert_eq!(first, second);
        // Vacuous checks leave no trace: no bucket, nothing learned.
        assert!(!registry.has_database("app"));
        assert!(registry.column_types("app", "orders").is_none());

        registry.record_write("app", "orders", &record(json!({"id": 1})));
        let bad = record(json!({"id": "x"}));
        let first = registry.check("app", "orders", &bad);
        let second = registry.check("app", "orders", &bad);
        assert!(!first.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_check_after_learning() {
        let registry = TypeRegistry::new();
        let first = record(json!({"id": 1, "name": "a", "total": 9.5}));
        registry.record_write("app", "orders", &first);

        let (ok, _) = registry.check("app", "orders", &first);
        assert!(ok);

        let (ok, mismatches) =
            registry.check("app", "orders", &record(json!({"id": "x", "name": "b"})));
        assert!(!ok);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "id");
        assert_eq!(mismatches[0].actual, "str");
        assert_eq!(mismatches[0].expected, "int");
    }

    #[test]
    fn test_merge_adds_only_missing_columns() {
        let registry = TypeRegistry::new();
        registry.record_write("app", "orders", &record(json!({"id": 1})));
        // A later write cannot retype an existing column.
        registry.record_write("app", "orders", &record(json!({"id": "oops", "note": "n"})));

        let columns = registry.column_types("app", "orders").unwrap();
        assert_eq!(columns["id"], TypeDescriptor::Scalar(ScalarKind::Int));
        assert_eq!(columns["note"], TypeDescriptor::Scalar(ScalarKind::Str));
    }

    #[test]
    fn test_record_write_twice_is_a_noop() {
        let registry = TypeRegistry::new();
        let incoming = record(json!({"id": 1, "meta": {"a": true}}));
        registry.record_write("app", "orders", &incoming);
        let first = registry.column_types("app", "orders").unwrap();

        registry.record_write("app", "orders", &incoming);
        assert_eq!(registry.column_types("app", "orders").unwrap(), first);
    }

    #[test]
    fn test_merge_ignores_new_nested_fields() {
        let registry = TypeRegistry::new();
        registry.record_write("app", "orders", &record(json!({"meta": {"a": 1}})));
        registry.record_write("app", "orders", &record(json!({"meta": {"a": 1, "b": 2}})));

        let columns = registry.column_types("app", "orders").unwrap();
        let TypeDescriptor::Object(fields) = &columns["meta"] else {
            panic!("expected object descriptor");
        };
        assert!(fields.contains_key("a"));
        // "meta" already existed at top level, so "b" was never merged in.
        assert!(!fields.contains_key("b"));
    }

    #[test]
    fn test_tables_are_scoped_per_database() {
        let registry = TypeRegistry::new();
        registry.record_write("app", "orders", &record(json!({"id": 1})));
        registry.record_write("analytics", "orders", &record(json!({"id": "a1"})));

        let (ok, _) = registry.check("app", "orders", &record(json!({"id": 2})));
        assert!(ok);
        let (ok, _) = registry.check("analytics", "orders", &record(json!({"id": 2})));
        assert!(!ok);
    }

    #[test]
    fn test_ensure_database_creates_empty_bucket() {
        let registry = TypeRegistry::new();
        assert!(!registry.has_database("app"));
        registry.ensure_database("app");
        assert!(registry.has_database("app"));
        // Still nothing learned for any table.
        assert!(registry.column_types("app", "orders").is_none());
    }

    #[test]
    fn test_record_write_does_not_require_bucket() {
        let registry = TypeRegistry::new();
        registry.record_write("fresh", "t", &record(json!({"id": 1})));
        assert!(registry.has_database("fresh"));
        assert!(registry.column_types("fresh", "t").is_some());
    }

    #[test]
    fn test_concurrent_checks_and_writes() {
        let registry = Arc::new(TypeRegistry::new());
        registry.record_write("app", "orders", &record(json!({"id": 1})));

        let mut handles = Vec::new();
        for worker in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    if worker % 2 == 0 {
                        let (ok, _) = registry.check("app", "orders", &record(json!({"id": i})));
                        assert!(ok);
                    } else {
                        let mut incoming = record(json!({"id": 1}));
                        incoming.insert(format!("extra_{worker}_{i}"), json!("v"));
                        registry.record_write("app", "orders", &incoming);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // The first-learned "id" descriptor survived every concurrent merge.
        let columns = registry.column_types("app", "orders").unwrap();
        assert_eq!(columns["id"], TypeDescriptor::Scalar(ScalarKind::Int));
        assert_eq!(columns.len(), 1 + 2 * 50);
    }
}
