//! Structural type descriptors for learned column types.
//!
//! Descriptors are inferred from the values of successful writes and later
//! compared against incoming records to catch type drift before it reaches
//! the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Record;

/// Scalar type kind of a JSON value.
///
/// Integral numbers (i64/u64) are `Int`, all other numbers `Float`.
/// `Bool` is a distinct kind and never satisfies an `Int` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl ScalarKind {
    /// Kind of a scalar value, `None` for arrays and objects.
    pub fn of(value: &Value) -> Option<ScalarKind> {
        match value {
            Value::Null => Some(ScalarKind::Null),
            Value::Bool(_) => Some(ScalarKind::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ScalarKind::Int),
            Value::Number(_) => Some(ScalarKind::Float),
            Value::String(_) => Some(ScalarKind::Str),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Null => "null",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Str => "str",
        }
    }
}

/// Kind/shape name of any JSON value, as used in mismatch reports.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Structural type of a column value.
///
/// - `Scalar` - a single kind.
/// - `List` - homogeneous array; the element type is inferred from the
///   *first* element only. An empty array infers `Scalar(Null)`, which then
///   rejects any later non-null value for that column.
/// - `Object` - nested record with per-key descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    List(Box<TypeDescriptor>),
    Object(BTreeMap<String, TypeDescriptor>),
}

impl TypeDescriptor {
    /// Infer the descriptor of a value.
    pub fn infer(value: &Value) -> TypeDescriptor {
        match value {
            Value::Object(map) => TypeDescriptor::Object(
                map.iter()
                    .map(|(key, child)| (key.clone(), TypeDescriptor::infer(child)))
                    .collect(),
            ),
            Value::Array(items) => match items.first() {
                Some(first) => TypeDescriptor::List(Box::new(TypeDescriptor::infer(first))),
                None => TypeDescriptor::Scalar(ScalarKind::Null),
            },
            Value::Null => TypeDescriptor::Scalar(ScalarKind::Null),
            Value::Bool(_) => TypeDescriptor::Scalar(ScalarKind::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => TypeDescriptor::Scalar(ScalarKind::Int),
            Value::Number(_) => TypeDescriptor::Scalar(ScalarKind::Float),
            Value::String(_) => TypeDescriptor::Scalar(ScalarKind::Str),
        }
    }

    /// Shape name used on the expected side of mismatch reports.
    pub fn shape_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Scalar(kind) => kind.name(),
            TypeDescriptor::List(_) => "list",
            TypeDescriptor::Object(_) => "object",
        }
    }
}

/// One position where a record diverges from the learned column types.
///
/// `path` joins nesting with `.` and array positions numerically
/// (`items.0.name`); a top-level column is the bare column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub path: String,
    pub actual: String,
    pub expected: String,
}

impl TypeMismatch {
    fn new(path: &str, actual: &'static str, expected: &'static str) -> Self {
        Self {
            path: path.to_string(),
            actual: actual.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Compare a record against a table's learned column descriptors.
///
/// Columns absent from the descriptor map are skipped, so a first write may
/// introduce them; they are learned once that write succeeds. Within known
/// columns every divergence is reported, including shape divergence (a
/// scalar where an object or list is expected, and vice versa).
///
/// # Returns
///
/// Mismatches in record traversal order; empty means the record conforms.
pub fn compare_record(
    record: &Record,
    columns: &BTreeMap<String, TypeDescriptor>,
) -> Vec<TypeMismatch> {
    let mut mismatches = Vec::new();
    for (column, value) in record {
        if let Some(descriptor) = columns.get(column) {
            compare_value(value, descriptor, column, &mut mismatches);
        }
    }
    mismatches
}

fn compare_value(
    value: &Value,
    descriptor: &TypeDescriptor,
    path: &str,
    out: &mut Vec<TypeMismatch>,
) {
    match descriptor {
        TypeDescriptor::Object(fields) => match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if let Some(field) = fields.get(key) {
                        compare_value(child, field, &format!("{path}.{key}"), out);
                    }
                }
            }
            other => out.push(TypeMismatch::new(path, value_kind(other), "object")),
        },
        TypeDescriptor::List(element) => match value {
            Value::Array(items) => {
                // Every element is held to the single declared element type.
                for (index, item) in items.iter().enumerate() {
                    compare_value(item, element, &format!("{path}.{index}"), out);
                }
            }
            other => out.push(TypeMismatch::new(path, value_kind(other), "list")),
        },
        TypeDescriptor::Scalar(expected) => {
            if ScalarKind::of(value) != Some(*expected) {
                out.push(TypeMismatch::new(path, value_kind(value), expected.name()));
            }
        }
    }
}
