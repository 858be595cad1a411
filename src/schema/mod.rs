//! Learned column types: descriptors, the concurrent registry, and SQL
//! column type mapping.

mod descriptor;
mod registry;
mod sqltype;

pub use descriptor::{compare_record, value_kind, ScalarKind, TypeDescriptor, TypeMismatch};
pub use registry::{ColumnTypes, TypeRegistry};
pub use sqltype::{sql_type_for, SqlType};
