//! Error types for the gated store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database not exists: {0}")]
    DatabaseNotExists(String),

    #[error("Table not exists: {0}")]
    TableNotExists(String),

    #[error("No database selected")]
    DatabaseNotSelected,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
