//! Spaced-repetition scheduler.
//!
//! Orders a category's items for one session and reinserts forgotten items
//! for a near-term retest.
//!
//! ## Priority
//!
//! Lower values are shown sooner:
//!
//! ```text
//! never seen     -> 0
//! otherwise      -> 1 + 1 / (score + 1) + days since last seen
//! ```
//!
//! Items still resting after mastery (`dormant_until > now`) are left out of
//! the queue entirely. Ties keep catalog order.

mod policy;
mod queue;

pub use policy::{now_ms, SchedulerPolicy, DAY_MS};
pub use queue::{Advance, ScheduledItem, SessionQueue};

use std::collections::HashSet;

use crate::catalog::Item;
use crate::error::{Result, SessionError};
use crate::ledger::{Ledger, MasteryRecord, Outcome};

/// Fractional days from `then` to `now`, never negative.
pub fn days_since(then: i64, now: i64) -> f64 {
    now.saturating_sub(then).max(0) as f64 / DAY_MS as f64
}

/// Scheduling weight of a record at `now`.
pub fn priority(record: &MasteryRecord, now: i64) -> f64 {
    if !record.is_seen() {
        return 0.0;
    }
    1.0 + 1.0 / (f64::from(record.score) + 1.0) + days_since(record.last_seen_at, now)
}

/// Build the session queue for `items`.
///
/// Registers every item in the ledger on first sight. Repeated keys are
/// scheduled once, at their first position.
pub fn build_queue(items: &[Item], ledger: &mut Ledger, now: i64) -> SessionQueue {
    let mut seen = HashSet::with_capacity(items.len());
    let mut dormant = 0usize;
    let mut entries = Vec::with_capacity(items.len());

    for item in items {
        let key = item.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        let record = ledger.register(&key);
        if record.is_dormant(now) {
            dormant += 1;
            continue;
        }
        entries.push(ScheduledItem {
            item: item.clone(),
            priority: priority(&record, now),
        });
    }

    // `sort_by` is stable, so equal priorities stay in catalog order.
    entries.sort_by(|a, b| a.priority.total_cmp(&b.priority));

    tracing::debug!(
        eligible = entries.len(),
        dormant,
        "session queue built"
    );
    SessionQueue::new(entries)
}

/// Apply `outcome` to the current item and, if it was forgotten, put it back
/// `requeue_offset` places ahead.
///
/// # Errors
/// Returns [`SessionError::NoCurrentItem`] if nothing is on screen, or a
/// ledger error if the item was never registered. Neither case mutates the
/// queue or the ledger.
pub fn record_outcome_and_requeue(
    queue: &mut SessionQueue,
    outcome: Outcome,
    ledger: &mut Ledger,
    now: i64,
) -> Result<MasteryRecord> {
    let key = queue.current().ok_or(SessionError::NoCurrentItem)?.key();
    let record = ledger.apply_outcome(&key, outcome, now)?;

    if outcome == Outcome::Forgotten {
        let offset = ledger.policy().requeue_offset;
        if let Some(at) = queue.requeue_current(offset) {
            tracing::debug!(%key, at, "forgotten item requeued");
        }
    }
    Ok(record)
}

/// Move to the next item, or signal the end of the session.
pub fn advance(queue: &mut SessionQueue) -> Advance {
    queue.advance()
}
