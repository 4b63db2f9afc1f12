pub mod categories;
pub mod config;
pub mod drill;
pub mod import;
pub mod progress;
pub mod queue;
pub mod reset;

use std::path::Path;

use vocadrill_core::{Catalog, Config, CoreError, Database, Ledger, StorageError};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Configuration and catalog shared by the learning commands.
pub struct Context {
    pub config: Config,
    pub catalog: Catalog,
}

impl Context {
    /// Load the config, then the catalog from `catalog_override`, the
    /// configured path, or the bundled data, in that order.
    pub fn load(catalog_override: Option<&Path>) -> Result<Self, CoreError> {
        let config = Config::load()?;
        let catalog = Catalog::load_or_builtin(catalog_override.or(config.catalog_path()))?;
        Ok(Self { config, catalog })
    }

    pub fn open_db(&self) -> Result<Database, StorageError> {
        Ok(Database::open()?.with_snapshot_key(self.config.storage.snapshot_key.as_str()))
    }

    pub fn load_ledger(&self, db: &Database) -> Result<Ledger, StorageError> {
        Ledger::load(db, self.config.scheduler)
    }
}

/// Print `rows` as pretty JSON.
pub fn print_json<T: serde::Serialize + ?Sized>(rows: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}
