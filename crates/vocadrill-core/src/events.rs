use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Item, ItemKey};
use crate::ledger::Outcome;

/// Every session state change produces an Event.
/// The CLI prints them with `--json`; other front ends may log or replay them.
/// Fields use camelCase like the snapshot and catalog documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    SessionStarted {
        category_id: String,
        queued: usize,
        at: DateTime<Utc>,
    },
    ItemPresented {
        item: Item,
        /// Zero-based position in the session queue.
        position: usize,
        remaining: usize,
        at: DateTime<Utc>,
    },
    OutcomeRecorded {
        key: ItemKey,
        outcome: Outcome,
        score: u32,
        /// Epoch milliseconds, 0 when the item is not resting.
        dormant_until: i64,
        requeued: bool,
        at: DateTime<Utc>,
    },
    ProgressChanged {
        category_id: String,
        known: usize,
        total: usize,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        category_id: String,
        at: DateTime<Utc>,
    },
    /// Session left before the queue ran out.
    SessionAbandoned {
        category_id: String,
        remaining: usize,
        at: DateTime<Utc>,
    },
}

/// Convert epoch milliseconds for event timestamps.
pub(crate) fn timestamp(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
