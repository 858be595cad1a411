//! Core types for the gated store.

pub mod error;

pub use error::{DatabaseError, Result};

/// A row or write payload: column name to dynamic JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;
