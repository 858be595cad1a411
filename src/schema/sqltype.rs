//! Sample-value to SQL column type mapping.
//!
//! Backends build `CREATE TABLE` columns from `(name, sample value)` pairs;
//! this module maps each sample to its SQL column type. Date and datetime
//! shapes are detected before generic string sizing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::descriptor::value_kind;
use crate::types::{DatabaseError, Result};

// Matches 2024-01-15 / 2024.01.15 / 20240115 shapes. Digit ranges are not
// validated; only the shape counts.
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{4}\W\d{2}\W\d{2}|\d{8})$").expect("valid date pattern"));

// Date part with non-alphanumeric separators, then T or space, then HH:MM:SS
// with 00-23 hours. The separators are matched independently; the regex
// engine has no backreferences to demand the same one twice.
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}[^A-Za-z0-9\s]\d{2}[^A-Za-z0-9\s]\d{2}[T\s](?:[01]\d|2[0-3]):[0-5]\d:[0-5]\d$")
        .expect("valid datetime pattern")
});

/// SQL column type derived from a sample value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Boolean,
    Integer,
    Float,
    Date,
    DateTime,
    Text,
    Varchar,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::Date => "DATE",
            SqlType::DateTime => "DATETIME",
            SqlType::Text => "TEXT",
            SqlType::Varchar => "VARCHAR(255)",
        };
        f.write_str(name)
    }
}

/// Map a column sample value to its SQL type.
///
/// Strings are classified as `DATE`, then `DATETIME`, then `TEXT` when
/// longer than 250 characters, otherwise `VARCHAR(255)`.
///
/// # Errors
///
/// Null samples and compound values (arrays, objects) have no column type.
pub fn sql_type_for(value: &Value) -> Result<SqlType> {
    match value {
        Value::Bool(_) => Ok(SqlType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(SqlType::Integer),
        Value::Number(_) => Ok(SqlType::Float),
        Value::String(s) => {
            if DATE_RE.is_match(s) {
                Ok(SqlType::Date)
            } else if DATETIME_RE.is_match(s) {
                Ok(SqlType::DateTime)
            } else if s.chars().count() > 250 {
                Ok(SqlType::Text)
            } else {
                Ok(SqlType::Varchar)
            }
        }
        Value::Null => Err(DatabaseError::UnsupportedType(
            "column sample value cannot be null".to_string(),
        )),
        other => Err(DatabaseError::UnsupportedType(value_kind(other).to_string())),
    }
}
