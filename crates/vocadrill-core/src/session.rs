//! Session runner.
//!
//! Drives one pass over a category: builds the queue, presents items, applies
//! judgments and flushes the ledger. Front ends plug in through
//! [`SessionObserver`]; every transition is also returned as [`Event`]s.
//!
//! ## State machine
//!
//! ```text
//! NotStarted -> InProgress (start)
//! InProgress -> InProgress (judge, more items)
//! InProgress -> Complete   (judge, queue exhausted; or start on an all-dormant category)
//! InProgress -> NotStarted (abandon)
//! ```

use serde::Serialize;

use crate::catalog::{Catalog, Category, Item};
use crate::error::{Result, SessionError, StorageError};
use crate::events::{timestamp, Event};
use crate::ledger::{Ledger, Outcome, Progress};
use crate::scheduler::{self, Advance, SessionQueue};
use crate::storage::SnapshotStore;

/// Callbacks for a rendering front end. Every method defaults to doing nothing.
pub trait SessionObserver {
    fn on_item_presented(&mut self, _item: &Item) {}
    fn on_session_complete(&mut self, _category_id: &str) {}
    fn on_progress_changed(&mut self, _category_id: &str, _known: usize, _total: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// Everything that belongs to the running session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: SessionPhase,
    category: Option<Category>,
    queue: SessionQueue,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }
}

/// Owns the ledger and the store it is flushed to.
pub struct SessionRunner<S: SnapshotStore, O: SessionObserver = NoopObserver> {
    ledger: Ledger,
    store: S,
    observer: O,
    state: SessionState,
    autosave: bool,
}

impl<S: SnapshotStore, O: SessionObserver> SessionRunner<S, O> {
    pub fn new(ledger: Ledger, store: S, observer: O) -> Self {
        Self {
            ledger,
            store,
            observer,
            state: SessionState::default(),
            autosave: true,
        }
    }

    /// Flush after every judgment (`true`, the default) or only when a
    /// session ends.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The item waiting for a judgment.
    pub fn current(&self) -> Option<&Item> {
        match self.state.phase {
            SessionPhase::InProgress => self.state.queue.current(),
            _ => None,
        }
    }

    /// Look up `category_id` in `catalog` and start it.
    ///
    /// # Errors
    /// [`SessionError::UnknownCategory`] if the catalog has no such category,
    /// otherwise as [`SessionRunner::start`].
    pub fn start_in(&mut self, catalog: &Catalog, category_id: &str, now: i64) -> Result<Vec<Event>> {
        let category = catalog
            .category(category_id)
            .ok_or_else(|| SessionError::UnknownCategory(category_id.to_string()))?;
        self.start(category, now)
    }

    /// Begin a session over `category`, replacing any session in progress.
    ///
    /// # Errors
    /// [`SessionError::InvalidCategory`] if the category has no items. Nothing
    /// is changed in that case.
    pub fn start(&mut self, category: &Category, now: i64) -> Result<Vec<Event>> {
        if category.id.trim().is_empty() || category.is_empty() {
            return Err(SessionError::InvalidCategory(category.id.clone()).into());
        }
        if let Some(previous) = self.state.category_id() {
            if self.state.phase == SessionPhase::InProgress {
                tracing::debug!(previous, "replacing unfinished session");
            }
        }

        let queue = scheduler::build_queue(&category.items, &mut self.ledger, now);
        tracing::info!(category = %category.id, queued = queue.len(), "session started");

        let mut events = vec![Event::SessionStarted {
            category_id: category.id.clone(),
            queued: queue.len(),
            at: timestamp(now),
        }];
        self.state = SessionState {
            phase: SessionPhase::InProgress,
            category: Some(category.clone()),
            queue,
        };
        self.report_progress(now, &mut events);
        self.step(now, &mut events);
        Ok(events)
    }

    /// Judge the item on screen and move on.
    ///
    /// # Errors
    /// [`SessionError::NoCurrentItem`] outside a running session. Ledger
    /// errors from the scheduler are passed through. No state changes on error.
    pub fn judge(&mut self, outcome: Outcome, now: i64) -> Result<Vec<Event>> {
        if self.state.phase != SessionPhase::InProgress {
            return Err(SessionError::NoCurrentItem.into());
        }
        let key = self
            .state
            .queue
            .current()
            .ok_or(SessionError::NoCurrentItem)?
            .key();
        let before = self.state.queue.len();
        let record =
            scheduler::record_outcome_and_requeue(&mut self.state.queue, outcome, &mut self.ledger, now)?;

        let mut events = vec![Event::OutcomeRecorded {
            key,
            outcome,
            score: record.score,
            dormant_until: record.dormant_until,
            requeued: self.state.queue.len() > before,
            at: timestamp(now),
        }];
        self.report_progress(now, &mut events);
        if self.autosave {
            self.flush_quietly();
        }
        self.step(now, &mut events);
        Ok(events)
    }

    /// Leave the running session early. The ledger is flushed and the queue
    /// dropped. Does nothing when no session is running.
    pub fn abandon(&mut self, now: i64) -> Vec<Event> {
        if self.state.phase != SessionPhase::InProgress {
            return Vec::new();
        }
        let remaining = self.state.queue.remaining();
        let category_id = self.state.category_id().unwrap_or_default().to_string();
        tracing::info!(category = %category_id, remaining, "session abandoned");

        self.flush_quietly();
        self.state = SessionState::default();
        vec![Event::SessionAbandoned {
            category_id,
            remaining,
            at: timestamp(now),
        }]
    }

    /// Write the ledger to the store.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.ledger.save(&self.store)
    }

    fn flush_quietly(&self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to save learning state: {e}");
        }
    }

    fn report_progress(&mut self, now: i64, events: &mut Vec<Event>) {
        let Some(category) = self.state.category.as_ref() else {
            return;
        };
        let Progress { known, total } = self.ledger.category_progress(category);
        self.observer.on_progress_changed(&category.id, known, total);
        events.push(Event::ProgressChanged {
            category_id: category.id.clone(),
            known,
            total,
            at: timestamp(now),
        });
    }

    fn step(&mut self, now: i64, events: &mut Vec<Event>) {
        match scheduler::advance(&mut self.state.queue) {
            Advance::Item(item) => {
                self.observer.on_item_presented(&item);
                events.push(Event::ItemPresented {
                    position: self.state.queue.cursor().unwrap_or_default(),
                    remaining: self.state.queue.remaining(),
                    item,
                    at: timestamp(now),
                });
            }
            Advance::SessionComplete => {
                let category_id = self.state.category_id().unwrap_or_default().to_string();
                tracing::info!(category = %category_id, "session complete");
                self.state.phase = SessionPhase::Complete;
                self.observer.on_session_complete(&category_id);
                self.flush_quietly();
                events.push(Event::SessionCompleted {
                    category_id,
                    at: timestamp(now),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemKey;
    use crate::error::CoreError;
    use crate::scheduler::{SchedulerPolicy, DAY_MS};
    use crate::storage::MemoryStore;
    use std::cell::Cell;

    const NOW: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct Recorder {
        presented: Vec<String>,
        completed: Vec<String>,
        progress: Vec<(usize, usize)>,
    }

    impl SessionObserver for Recorder {
        fn on_item_presented(&mut self, item: &Item) {
            self.presented.push(item.token.clone());
        }
        fn on_session_complete(&mut self, category_id: &str) {
            self.completed.push(category_id.to_string());
        }
        fn on_progress_changed(&mut self, _category_id: &str, known: usize, total: usize) {
            self.progress.push((known, total));
        }
    }

    /// Store whose writes always fail.
    #[derive(Default)]
    struct BrokenStore {
        attempts: Cell<usize>,
    }

    impl SnapshotStore for BrokenStore {
        fn load(&self) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn save(&self, _snapshot: &str) -> Result<(), StorageError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(StorageError::QueryFailed("disk full".into()))
        }
    }

    fn category(tokens: &[&str]) -> Category {
        Category {
            id: "c".into(),
            name: "Test".into(),
            items: tokens
                .iter()
                .map(|t| Item {
                    category_id: "c".into(),
                    token: (*t).into(),
                    display_text: t.to_uppercase(),
                    example_text: None,
                })
                .collect(),
        }
    }

    fn runner() -> SessionRunner<MemoryStore, Recorder> {
        SessionRunner::new(Ledger::default(), MemoryStore::default(), Recorder::default())
    }

    #[test]
    fn start_presents_first_item() {
        let mut runner = runner();
        let events = runner.start(&category(&["a", "b"]), NOW).unwrap();

        assert_eq!(runner.phase(), SessionPhase::InProgress);
        assert_eq!(runner.state().category_id(), Some("c"));
        assert_eq!(runner.state().queue().cursor(), Some(0));
        assert_eq!(runner.current().map(|i| i.token.as_str()), Some("a"));
        assert_eq!(runner.observer().presented, ["a"]);
        assert_eq!(runner.observer().progress, [(0, 2)]);
        assert!(matches!(events[0], Event::SessionStarted { queued: 2, .. }));
        assert!(matches!(events.last(), Some(Event::ItemPresented { position: 0, remaining: 1, .. })));
    }

    #[test]
    fn empty_category_is_rejected_without_side_effects() {
        let mut runner = runner();
        let err = runner.start(&category(&[]), NOW).unwrap_err();
        assert!(matches!(err, CoreError::Session(SessionError::InvalidCategory(_))));
        assert_eq!(runner.phase(), SessionPhase::NotStarted);
        assert!(runner.ledger().is_empty());
        assert!(runner.observer().progress.is_empty());
    }

    #[test]
    fn unknown_category_id_is_reported() {
        let catalog = Catalog { categories: vec![category(&["a"])] };
        let mut runner = runner();
        let err = runner.start_in(&catalog, "nope", NOW).unwrap_err();
        assert!(matches!(err, CoreError::Session(SessionError::UnknownCategory(id)) if id == "nope"));
    }

    #[test]
    fn forgotten_item_returns_later_in_the_same_session() {
        let mut runner = runner();
        runner.start(&category(&["a", "b"]), NOW).unwrap();

        let events = runner.judge(Outcome::Forgotten, NOW).unwrap();
        assert!(matches!(events[0], Event::OutcomeRecorded { requeued: true, .. }));
        runner.judge(Outcome::Recalled, NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();

        assert_eq!(runner.observer().presented, ["a", "b", "a"]);
        assert_eq!(runner.observer().completed, ["c"]);
        assert_eq!(runner.phase(), SessionPhase::Complete);
    }

    #[test]
    fn autosave_flushes_after_each_judgment() {
        let mut runner = runner();
        runner.start(&category(&["a", "b"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        assert_eq!(runner.store().save_count(), 1);
        runner.judge(Outcome::Recalled, NOW).unwrap();
        // one per judgment plus the completion flush
        assert_eq!(runner.store().save_count(), 3);
    }

    #[test]
    fn without_autosave_only_completion_flushes() {
        let mut runner = runner().with_autosave(false);
        runner.start(&category(&["a"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        assert_eq!(runner.store().save_count(), 1);
    }

    #[test]
    fn judging_after_completion_is_an_error() {
        let mut runner = runner();
        runner.start(&category(&["a"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        let err = runner.judge(Outcome::Recalled, NOW).unwrap_err();
        assert!(matches!(err, CoreError::Session(SessionError::NoCurrentItem)));
        assert_eq!(runner.ledger().get_record(&ItemKey::new("c", "a")).score, 1);
    }

    #[test]
    fn judging_before_start_is_an_error() {
        let mut runner = runner();
        assert!(runner.judge(Outcome::Forgotten, NOW).is_err());
    }

    #[test]
    fn all_dormant_category_completes_at_start() {
        let mut runner = runner();
        let cat = category(&["a"]);
        for _ in 0..3 {
            runner.start(&cat, NOW).unwrap();
            runner.judge(Outcome::Recalled, NOW).unwrap();
        }
        let events = runner.start(&cat, NOW + 1).unwrap();
        assert_eq!(runner.phase(), SessionPhase::Complete);
        assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));
        assert!(runner.current().is_none());
    }

    #[test]
    fn mastery_makes_item_dormant_and_counts_as_known() {
        let mut runner = runner();
        let cat = category(&["a"]);
        for _ in 0..3 {
            runner.start(&cat, NOW).unwrap();
            runner.judge(Outcome::Recalled, NOW).unwrap();
        }
        let record = runner.ledger().get_record(&ItemKey::new("c", "a"));
        assert_eq!(record.score, 3);
        assert_eq!(record.dormant_until, NOW + DAY_MS);
        assert_eq!(runner.observer().progress.last(), Some(&(1, 1)));
    }

    #[test]
    fn abandon_flushes_and_resets() {
        let mut runner = runner().with_autosave(false);
        runner.start(&category(&["a", "b", "c"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();

        let events = runner.abandon(NOW);
        assert!(matches!(events[..], [Event::SessionAbandoned { remaining: 1, .. }]));
        assert_eq!(runner.phase(), SessionPhase::NotStarted);
        assert_eq!(runner.store().save_count(), 1);
        assert!(runner.observer().completed.is_empty());
        assert!(runner.abandon(NOW).is_empty());
    }

    #[test]
    fn failed_flush_does_not_stop_the_session() {
        let mut runner = SessionRunner::new(Ledger::default(), BrokenStore::default(), NoopObserver);
        runner.start(&category(&["a", "b"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        assert_eq!(runner.phase(), SessionPhase::Complete);
        assert_eq!(runner.store().attempts.get(), 3);
        assert!(runner.flush().is_err());
    }

    #[test]
    fn restart_picks_up_ledger_changes() {
        let mut runner = runner();
        let cat = category(&["a", "b"]);
        runner.start(&cat, NOW).unwrap();
        runner.judge(Outcome::Forgotten, NOW).unwrap();

        runner.start(&cat, NOW + DAY_MS).unwrap();
        // "b" is unseen (priority 0) so it now comes before "a"
        assert_eq!(runner.current().map(|i| i.token.as_str()), Some("b"));
    }

    #[test]
    fn runner_uses_ledger_policy() {
        let policy = SchedulerPolicy {
            review_threshold: 1,
            ..SchedulerPolicy::default()
        };
        let mut runner = SessionRunner::new(Ledger::new(policy), MemoryStore::default(), NoopObserver);
        runner.start(&category(&["a"]), NOW).unwrap();
        runner.judge(Outcome::Recalled, NOW).unwrap();
        assert!(runner.ledger().is_known(&ItemKey::new("c", "a")));
    }
}
