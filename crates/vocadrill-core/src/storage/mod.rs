mod config;
pub mod database;
pub mod snapshot;

pub use config::{CatalogConfig, Config, StorageConfig};
pub use database::Database;
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};

use std::cell::RefCell;
use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `VOCADRILL_DATA_DIR` wins when set. Otherwise `~/.config/vocadrill/`, or
/// `~/.config/vocadrill-dev/` with `VOCADRILL_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("VOCADRILL_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("VOCADRILL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("vocadrill-dev")
            } else {
                base_dir.join("vocadrill")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Where the ledger snapshot lives. One serialized blob under one key; the
/// whole blob is overwritten on every save.
pub trait SnapshotStore {
    /// The stored snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    fn save(&self, snapshot: &str) -> Result<(), StorageError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for &T {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Box<T> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }
}

/// Process-local store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RefCell<Option<String>>,
    saves: RefCell<usize>,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: &str) -> Self {
        Self {
            snapshot: RefCell::new(Some(snapshot.to_string())),
            saves: RefCell::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &str) -> Result<(), StorageError> {
        *self.snapshot.borrow_mut() = Some(snapshot.to_string());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
