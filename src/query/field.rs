//! Column handles for building conditions.

use serde_json::Value;

use crate::query::condition::{CompareOp, Condition};

/// A column reference that seeds condition nodes.
///
/// The name is fixed at construction and only readable afterwards; all
/// combinators borrow the field, so one handle can appear in any number of
/// conditions.
///
/// # Example
///
/// ```
/// use relgate::Field;
///
/// let age = Field::new("age");
/// let working_age = age.gte(18) & age.lt(65);
/// assert_eq!(working_age.compile().sql, "(age >= ? AND age < ?)");
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `column = value`
    pub fn eq(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// `column != value`
    pub fn ne(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    /// `column < value`
    pub fn lt(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// `column <= value`
    pub fn lte(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Lte, value)
    }

    /// `column > value`
    pub fn gt(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// `column >= value`
    pub fn gte(&self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Gte, value)
    }

    /// `column IN (values...)`
    pub fn is_in<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            field: self.name.clone(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `column BETWEEN low AND high` (inclusive on both ends).
    pub fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        Condition::Between {
            field: self.name.clone(),
            low: low.into(),
            high: high.into(),
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Condition {
        Condition::Compare {
            field: self.name.clone(),
            op,
            value: value.into(),
        }
    }
}
