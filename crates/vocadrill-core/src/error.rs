//! Core error types for vocadrill-core.
//!
//! Each layer has its own error enum; [`CoreError`] wraps all of them so
//! callers that drive a whole session only have to deal with one type.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vocadrill-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog loading or validation errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Mastery ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored snapshot could not be parsed
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Catalog-specific errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read the catalog file
    #[error("Failed to load catalog from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Catalog JSON is malformed
    #[error("Failed to parse catalog: {0}")]
    ParseFailed(String),

    /// Two categories share an id
    #[error("Duplicate category id: {0}")]
    DuplicateCategory(String),

    /// Category id or item token is blank
    #[error("Blank identifier in category '{category}' at position {index}")]
    BlankIdentifier { category: String, index: usize },
}

/// Mastery ledger errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// Outcome reported for a key the ledger has never scheduled
    #[error("Unknown item: {0}")]
    UnknownItem(String),
}

/// Session lifecycle errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Category has no items to drill
    #[error("Invalid category '{0}': empty or missing item list")]
    InvalidCategory(String),

    /// Category id not present in the catalog
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Judgment given while no item is on screen
    #[error("No item is currently presented")]
    NoCurrentItem,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_keep_their_message() {
        let err: CoreError = SessionError::InvalidCategory("verbos".into()).into();
        assert_eq!(
            err.to_string(),
            "Session error: Invalid category 'verbos': empty or missing item list"
        );
    }

    #[test]
    fn rusqlite_errors_map_to_query_failed() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::QueryFailed(_)));
    }
}
