//! Condition AST compiled to parameterized SQL fragments.
//!
//! Conditions never interpolate values into SQL text. Compilation emits `?`
//! placeholders and the matching parameter list, in traversal order, for
//! the driver layer to bind.

use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a [`Condition::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// SQL text with `?` placeholders plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A filter tree: comparison, membership and range leaves combined with
/// AND/OR/NOT.
///
/// Trees are built from [`Field`](crate::query::Field) combinators and
/// composed with [`and`](Condition::and) / [`or`](Condition::or) /
/// [`negate`](Condition::negate), or the equivalent `&` / `|` / `!`
/// operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Between {
        field: String,
        low: Value,
        high: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Conjunction.
    ///
    /// When `self` is already an `And`, `other` is appended to its child
    /// list; chained `a & b & c` stays one flat node. Any other left side
    /// nests a fresh two-child `And`.
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            lhs => Condition::And(vec![lhs, other]),
        }
    }

    /// Disjunction; flattens exactly like [`and`](Condition::and).
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut children) => {
                children.push(other);
                Condition::Or(children)
            }
            lhs => Condition::Or(vec![lhs, other]),
        }
    }

    /// Negation. Always wraps the whole tree, never flattens.
    pub fn negate(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    /// Compile to SQL text and ordered parameters.
    ///
    /// AND/OR groups are parenthesized only when they hold more than one
    /// child; NOT is always rendered as `NOT (...)`.
    pub fn compile(&self) -> CompiledSql {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_sql(&mut sql, &mut params);
        CompiledSql { sql, params }
    }

    fn write_sql(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Condition::Compare { field, op, value } => {
                sql.push_str(field);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                params.push(value.clone());
            }
            Condition::In { field, values } => {
                sql.push_str(field);
                sql.push_str(" IN (");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    params.push(value.clone());
                }
                sql.push(')');
            }
            Condition::Between { field, low, high } => {
                sql.push_str(field);
                sql.push_str(" BETWEEN ? AND ?");
                params.push(low.clone());
                params.push(high.clone());
            }
            Condition::And(children) => Self::write_group(children, " AND ", sql, params),
            Condition::Or(children) => Self::write_group(children, " OR ", sql, params),
            Condition::Not(child) => {
                sql.push_str("NOT (");
                child.write_sql(sql, params);
                sql.push(')');
            }
        }
    }

    fn write_group(
        children: &[Condition],
        separator: &str,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        let parenthesize = children.len() > 1;
        if parenthesize {
            sql.push('(');
        }
        for (index, child) in children.iter().enumerate() {
            if index > 0 {
                sql.push_str(separator);
            }
            child.write_sql(sql, params);
        }
        if parenthesize {
            sql.push(')');
        }
    }
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        self.and(rhs)
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        self.or(rhs)
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        self.negate()
    }
}
