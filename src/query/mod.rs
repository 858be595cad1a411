//! Condition AST and SQL statement building.

mod condition;
mod field;
mod select;

pub use condition::{CompareOp, CompiledSql, Condition};
pub use field::Field;
pub use select::{SelectBuilder, SortOrder};
