//! # Vocadrill Core Library
//!
//! This library provides the core logic for the Vocadrill vocabulary trainer:
//! a spaced-repetition scheduler over a catalog of flashcard-style items.
//! Everything is synchronous and free of I/O except the storage adapters, so
//! the CLI and any other front end are thin layers over the same core.
//!
//! ## Architecture
//!
//! - **Catalog**: read-only categories of items, bundled or loaded from JSON
//! - **Ledger**: per-item mastery score, last-seen time and dormancy deadline
//! - **Scheduler**: orders a category into a session queue and requeues
//!   forgotten items
//! - **Session**: drives one pass over a category and reports to an observer
//! - **Storage**: snapshot persistence (SQLite or in-memory) and TOML config
//!
//! ## Key Components
//!
//! - [`SessionRunner`]: session state machine
//! - [`Ledger`]: mastery records and progress
//! - [`Database`]: snapshot persistence
//! - [`Config`]: application configuration management

pub mod catalog;
pub mod error;
pub mod events;
pub mod ledger;
pub mod scheduler;
pub mod session;
pub mod storage;

pub use catalog::{Catalog, Category, Item, ItemKey};
pub use error::{CatalogError, ConfigError, CoreError, LedgerError, SessionError, StorageError};
pub use events::Event;
pub use ledger::{Ledger, MasteryRecord, Outcome, Progress};
pub use scheduler::{now_ms, SchedulerPolicy, SessionQueue};
pub use session::{NoopObserver, SessionObserver, SessionPhase, SessionRunner, SessionState};
pub use storage::{Config, Database, MemoryStore, Snapshot, SnapshotStore};
