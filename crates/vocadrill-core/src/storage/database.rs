//! SQLite-backed key-value store.
//!
//! The ledger snapshot is a single row of the `kv` table; other small pieces
//! of application state can share the table under their own keys.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{data_dir, SnapshotStore};
use crate::error::StorageError;

/// Key the browser app used for its learning state.
pub const DEFAULT_SNAPSHOT_KEY: &str = "knownWords";

/// SQLite database holding the learning state.
pub struct Database {
    conn: Connection,
    snapshot_key: String,
}

impl Database {
    /// Open the database at `<data_dir>/vocadrill.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("vocadrill.db"))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let db = Self {
            conn,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Store the ledger snapshot under `key` instead of the default.
    pub fn with_snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }

    pub fn snapshot_key(&self) -> &str {
        &self.snapshot_key
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn kv_delete(&self, key: &str) -> Result<bool, StorageError> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

impl SnapshotStore for Database {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.kv_get(&self.snapshot_key)
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        self.kv_set(&self.snapshot_key, snapshot)
    }
}
