//! Fluent SELECT statement builder.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::condition::{CompiledSql, Condition};
use crate::types::{DatabaseError, Result};

/// Sort direction of an ORDER BY key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Fluent builder for parameterized SELECT statements.
///
/// Only the FROM table is required; LIMIT and OFFSET values travel as
/// trailing parameters after the WHERE parameters, never as inline text.
///
/// # Example
///
/// ```
/// use relgate::{Field, SelectBuilder, SortOrder};
///
/// let statement = SelectBuilder::new()
///     .select(["id", "name"])
///     .from_table("users")
///     .filter(Field::new("age").gte(18))
///     .order_by("name", SortOrder::Asc)
///     .limit(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     statement.sql,
///     "SELECT id, name FROM `users` WHERE age >= ? ORDER BY name ASC LIMIT ?"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    columns: Vec<String>,
    table: Option<String>,
    filter: Option<Condition>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add projected columns; defaults to `*` when none are added.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Set the FROM table (required; back-quoted in the output).
    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the WHERE tree. A second call replaces the first.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Append an ORDER BY key.
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, start: u64) -> Self {
        self.offset = Some(start);
        self
    }

    /// Render the statement.
    ///
    /// Clause order is fixed: SELECT, FROM, WHERE, ORDER BY, LIMIT, OFFSET.
    /// Parameters follow the same order: WHERE parameters first, then the
    /// LIMIT value, then the OFFSET value.
    ///
    /// # Errors
    ///
    /// `QueryError` when no FROM table was set.
    pub fn build(&self) -> Result<CompiledSql> {
        let Some(table) = &self.table else {
            return Err(DatabaseError::QueryError(
                "FROM clause is required".to_string(),
            ));
        };

        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM `");
        sql.push_str(table);
        sql.push('`');

        let mut params = Vec::new();

        if let Some(filter) = &self.filter {
            let compiled = filter.compile();
            sql.push_str(" WHERE ");
            sql.push_str(&compiled.sql);
            params.extend(compiled.params);
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (index, (column, order)) in self.order_by.iter().enumerate() {
                if index > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(column);
                sql.push(' ');
                sql.push_str(order.as_sql());
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::from(limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ?");
            params.push(Value::from(offset));
        }

        Ok(CompiledSql { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Field;
    use serde_json::json;

    #[test]
    fn test_minimal_select() {
        let statement = SelectBuilder::new().from_table("t").build().unwrap();
        assert_eq!(statement.sql, "SELECT * FROM `t`");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_missing_from_is_an_error() {
        let err = SelectBuilder::new().select(["id"]).build().unwrap_err();
        match err {
            DatabaseError::QueryError(message) => {
                assert_eq!(message, "FROM clause is required")
            }
            other => panic!("expected QueryError, got {other:?}"),
        }
    }

    #[test]
    fn test_columns_accumulate_across_calls() {
        let statement = SelectBuilder::new()
            .select(["id"])
            .select(["name", "total"])
            .from_table("orders")
            .build()
            .unwrap();
        assert_eq!(statement.sql, "SELECT id, name, total FROM `orders`");
    }

    #[test]
    fn test_full_clause_and_param_order() {
        let age = Field::new("age");
        let statement = SelectBuilder::new()
            .from_table("users")
            .filter(age.gte(18) & age.lt(65))
            .order_by("age", SortOrder::Desc)
            .order_by("name", SortOrder::Asc)
            .limit(10)
            .offset(20)
            .build()
            .unwrap();

        assert_eq!(
            statement.sql,
            "SELECT * FROM `users` WHERE (age >= ? AND age < ?) \
             ORDER BY age DESC, name ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            statement.params,
            vec![json!(18), json!(65), json!(10), json!(20)]
        );
    }

    #[test]
    fn test_second_filter_replaces_first() {
        let statement = SelectBuilder::new()
            .from_table("t")
            .filter(Field::new("a").eq(1))
            .filter(Field::new("b").eq(2))
            .build()
            .unwrap();
        assert_eq!(statement.sql, "SELECT * FROM `t` WHERE b = ?");
        assert_eq!(statement.params, vec![json!(2)]);
    }

    #[test]
    fn test_offset_without_limit_is_allowed() {
        // The target dialect may still reject a bare OFFSET.
        let statement = SelectBuilder::new()
            .from_table("t")
            .offset(5)
            .build()
            .unwrap();
        assert_eq!(statement.sql, "SELECT * FROM `t` OFFSET ?");
        assert_eq!(statement.params, vec![json!(5)]);
    }
}
