//! In-memory reference backend.
//!
//! Stores databases as nested ordered maps and evaluates [`Condition`]
//! trees structurally against rows, so the gated facade can be exercised
//! end to end without a running server.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{CompareOp, Condition};
use crate::schema::{sql_type_for, SqlType};
use crate::storage::backend::{Probes, StorageBackend};
use crate::types::{DatabaseError, Record, Result};

/// A created column: its name and the SQL type derived from the sample
/// value it was declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<ColumnDef>,
    rows: Vec<Record>,
}

/// Reference [`StorageBackend`] backed by process memory.
#[derive(Default)]
pub struct MemoryBackend {
    databases: BTreeMap<String, BTreeMap<String, Table>>,
    current: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existence probes over this backend type. The table probe answers
    /// against the backend's current selection and reports `false` when
    /// nothing is selected.
    pub fn probes() -> Probes<MemoryBackend> {
        Probes {
            database_exists: Box::new(|backend: &MemoryBackend, name: &str| {
                Ok(backend.databases.contains_key(name))
            }),
            table_exists: Box::new(|backend: &MemoryBackend, table: &str| {
                Ok(backend
                    .current
                    .as_ref()
                    .and_then(|db| backend.databases.get(db))
                    .is_some_and(|tables| tables.contains_key(table)))
            }),
        }
    }

    /// Column definitions recorded for `table`, if the table exists.
    pub fn table_columns(&self, database: &str, table: &str) -> Option<Vec<ColumnDef>> {
        self.databases
            .get(database)
            .and_then(|tables| tables.get(table))
            .map(|t| t.columns.clone())
    }

    fn selected_tables(&self) -> Result<&BTreeMap<String, Table>> {
        let db = self
            .current
            .as_ref()
            .ok_or(DatabaseError::DatabaseNotSelected)?;
        self.databases
            .get(db)
            .ok_or_else(|| DatabaseError::DatabaseNotExists(db.clone()))
    }

    fn selected_tables_mut(&mut self) -> Result<&mut BTreeMap<String, Table>> {
        let db = self
            .current
            .clone()
            .ok_or(DatabaseError::DatabaseNotSelected)?;
        self.databases
            .get_mut(&db)
            .ok_or(DatabaseError::DatabaseNotExists(db))
    }
}

impl StorageBackend for MemoryBackend {
    fn create_database(&mut self, name: &str) -> Result<bool> {
        self.databases.entry(name.to_string()).or_default();
        Ok(true)
    }

    fn switch_database(&mut self, name: &str) -> Result<bool> {
        if !self.databases.contains_key(name) {
            return Ok(false);
        }
        self.current = Some(name.to_string());
        Ok(true)
    }

    fn drop_database(&mut self, name: &str) -> Result<bool> {
        self.databases.remove(name);
        Ok(true)
    }

    fn create_table(&mut self, table: &str, columns: &[(String, Value)]) -> Result<bool> {
        let defs = columns
            .iter()
            .map(|(name, sample)| {
                Ok(ColumnDef {
                    name: name.clone(),
                    sql_type: sql_type_for(sample)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.selected_tables_mut()?.entry(table.to_string()).or_insert(Table {
            columns: defs,
            rows: Vec::new(),
        });
        Ok(true)
    }

    fn drop_table(&mut self, table: &str) -> Result<bool> {
        self.selected_tables_mut()?.remove(table);
        Ok(true)
    }

    fn insert(&mut self, table: &str, record: &Record) -> Result<bool> {
        match self.selected_tables_mut()?.get_mut(table) {
            Some(t) => {
                t.rows.push(record.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update(&mut self, table: &str, record: &Record, filter: Option<&Condition>)
        -> Result<bool>
    {
        match self.selected_tables_mut()?.get_mut(table) {
            Some(t) => {
                for row in t.rows.iter_mut().filter(|row| matches(filter, row)) {
                    for (column, value) in record {
                        row.insert(column.clone(), value.clone());
                    }
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, table: &str, filter: Option<&Condition>) -> Result<bool> {
        match self.selected_tables_mut()?.get_mut(table) {
            Some(t) => {
                t.rows.retain(|row| !matches(filter, row));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn select(&self, table: &str, filter: Option<&Condition>) -> Result<Vec<Record>> {
        let tables = self.selected_tables()?;
        let t = tables
            .get(table)
            .ok_or_else(|| DatabaseError::TableNotExists(table.to_string()))?;
        Ok(t.rows
            .iter()
            .filter(|row| matches(filter, row))
            .cloned()
            .collect())
    }
}

fn matches(filter: Option<&Condition>, row: &Record) -> bool {
    filter.is_none_or(|condition| eval(condition, row))
}

/// Evaluate a condition tree against one row. A comparison on a column the
/// row does not carry never matches.
fn eval(condition: &Condition, row: &Record) -> bool {
    match condition {
        Condition::Compare { field, op, value } => row
            .get(field)
            .is_some_and(|actual| compare(actual, *op, value)),
        Condition::In { field, values } => row
            .get(field)
            .is_some_and(|actual| values.iter().any(|v| values_equal(actual, v))),
        Condition::Between { field, low, high } => row.get(field).is_some_and(|actual| {
            matches!(
                compare_values(actual, low),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                compare_values(actual, high),
                Some(Ordering::Less | Ordering::Equal)
            )
        }),
        Condition::And(children) => children.iter().all(|child| eval(child, row)),
        Condition::Or(children) => children.iter().any(|child| eval(child, row)),
        Condition::Not(child) => !eval(child, row),
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::Ne => !values_equal(actual, expected),
        CompareOp::Lt => matches!(compare_values(actual, expected), Some(Ordering::Less)),
        CompareOp::Lte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => matches!(compare_values(actual, expected), Some(Ordering::Greater)),
        CompareOp::Gte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Ordering between two JSON values where one exists. Numbers compare
/// across integer and float representations; strings and booleans compare
/// within their own kind; everything else is unordered.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
