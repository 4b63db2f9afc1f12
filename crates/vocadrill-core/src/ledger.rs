//! Mastery ledger: per-item score, last-seen time and dormancy deadline.
//!
//! Score math and cooldown math are kept as two pure functions over an
//! immutable [`MasteryRecord`]; [`MasteryRecord::apply`] composes them. The
//! ledger only stores the results. It never persists on its own; callers
//! decide when to flush through a [`SnapshotStore`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, Category, ItemKey};
use crate::error::{LedgerError, StorageError};
use crate::scheduler::{SchedulerPolicy, DAY_MS};
use crate::storage::{Snapshot, SnapshotStore};

/// Growth factor applied to the elapsed time when computing a cooldown.
const COOLDOWN_GROWTH: f64 = 1.5;

/// Learner's self-reported recall of the item on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Recalled,
    Forgotten,
}

/// Learning state of one item. All timestamps are epoch milliseconds; 0 means
/// "never" for both of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub last_seen_at: i64,
    #[serde(default)]
    pub dormant_until: i64,
}

impl MasteryRecord {
    pub fn is_seen(&self) -> bool {
        self.last_seen_at != 0
    }

    pub fn is_known(&self, policy: &SchedulerPolicy) -> bool {
        self.score >= policy.review_threshold
    }

    pub fn is_dormant(&self, now: i64) -> bool {
        self.dormant_until > now
    }

    /// Record after `outcome` at `now`. The cooldown is computed from `self`,
    /// i.e. from the record as it was before this outcome.
    pub fn apply(&self, outcome: Outcome, now: i64, policy: &SchedulerPolicy) -> Self {
        let score = next_score(self.score, outcome, policy);
        let dormant_until = match outcome {
            Outcome::Recalled if score >= policy.review_threshold => {
                let days = i64::from(cooldown_days(self, now, policy));
                now.saturating_add(days.saturating_mul(DAY_MS))
            }
            _ => 0,
        };
        Self {
            score,
            last_seen_at: now,
            dormant_until,
        }
    }
}

/// Score after one outcome, clamped to `[0, review_threshold]`.
pub fn next_score(score: u32, outcome: Outcome, policy: &SchedulerPolicy) -> u32 {
    match outcome {
        Outcome::Recalled => score.saturating_add(1).min(policy.review_threshold),
        Outcome::Forgotten => score.saturating_sub(policy.forgotten_penalty),
    }
}

/// Days a newly mastered item rests before it is scheduled again.
///
/// Never-seen items get the base cooldown. Otherwise the elapsed time since the
/// last sighting is stretched by 1.5, rounded up, and kept within
/// `[1, 2 * base_cooldown_days]`.
pub fn cooldown_days(record: &MasteryRecord, now: i64, policy: &SchedulerPolicy) -> u32 {
    if !record.is_seen() {
        return policy.base_cooldown_days;
    }
    let elapsed_days = now.saturating_sub(record.last_seen_at).max(0) as f64 / DAY_MS as f64;
    let stretched = (elapsed_days * COOLDOWN_GROWTH).ceil();
    let cap = policy.max_cooldown_days();
    if stretched >= f64::from(cap) {
        cap
    } else {
        (stretched as u32).max(1)
    }
}

/// Known items out of a total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub known: usize,
    pub total: usize,
}

impl Progress {
    /// Rounded percentage, 0 for an empty set.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.known as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Owns every [`MasteryRecord`], keyed by item.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: BTreeMap<ItemKey, MasteryRecord>,
    policy: SchedulerPolicy,
}

impl Ledger {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self {
            records: BTreeMap::new(),
            policy,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot, policy: SchedulerPolicy) -> Self {
        Self {
            records: snapshot.records,
            policy,
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::from_records(self.records.clone(), &self.policy)
    }

    /// Read the ledger from `store`.
    ///
    /// A missing snapshot yields an empty ledger. So does an unparseable one:
    /// that case is logged and recovered from, not reported.
    ///
    /// # Errors
    /// Returns an error only if the store itself cannot be read.
    pub fn load<S: SnapshotStore + ?Sized>(
        store: &S,
        policy: SchedulerPolicy,
    ) -> Result<Self, StorageError> {
        let Some(raw) = store.load()? else {
            return Ok(Self::new(policy));
        };
        match Snapshot::parse(&raw, &policy) {
            Ok(snapshot) => {
                tracing::debug!(records = snapshot.records.len(), "ledger loaded");
                Ok(Self::from_snapshot(snapshot, policy))
            }
            Err(e) => {
                tracing::warn!("discarding unreadable learning snapshot: {e}");
                Ok(Self::new(policy))
            }
        }
    }

    /// Overwrite the stored snapshot with the current state.
    ///
    /// # Errors
    /// Returns an error if serialization or the store write fails.
    pub fn save<S: SnapshotStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        let json = self.to_snapshot().to_json()?;
        store.save(&json)
    }

    pub fn policy(&self) -> &SchedulerPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &MasteryRecord)> {
        self.records.iter()
    }

    /// Stored record, or the zero-valued default for keys never scheduled.
    pub fn get_record(&self, key: &ItemKey) -> MasteryRecord {
        self.records.get(key).copied().unwrap_or_default()
    }

    /// Create the record for `key` if it does not exist yet.
    pub fn register(&mut self, key: &ItemKey) -> MasteryRecord {
        *self.records.entry(key.clone()).or_default()
    }

    /// Apply `outcome` to the record of `key` and store the result.
    ///
    /// # Errors
    /// Returns [`LedgerError::UnknownItem`] if `key` was never registered; the
    /// ledger is left unchanged.
    pub fn apply_outcome(
        &mut self,
        key: &ItemKey,
        outcome: Outcome,
        now: i64,
    ) -> Result<MasteryRecord, LedgerError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| LedgerError::UnknownItem(key.to_string()))?;
        *record = record.apply(outcome, now, &self.policy);
        Ok(*record)
    }

    pub fn is_known(&self, key: &ItemKey) -> bool {
        self.get_record(key).is_known(&self.policy)
    }

    /// Known items of one category. Dormancy does not matter here.
    pub fn known_count(&self, category: &Category) -> usize {
        category
            .items
            .iter()
            .filter(|item| self.is_known(&item.key()))
            .count()
    }

    pub fn category_progress(&self, category: &Category) -> Progress {
        Progress {
            known: self.known_count(category),
            total: category.items.len(),
        }
    }

    /// Known items across the whole catalog.
    pub fn progress(&self, catalog: &Catalog) -> Progress {
        catalog
            .categories
            .iter()
            .map(|c| self.category_progress(c))
            .fold(Progress::default(), |acc, p| Progress {
                known: acc.known + p.known,
                total: acc.total + p.total,
            })
    }

    /// Merge records from another snapshot. Imported records replace existing
    /// ones when they were seen more recently or, on the same sighting, carry
    /// a higher score. Browser exports leave unmastered words without a
    /// sighting, so their scores still win over records only registered here.
    pub fn merge(&mut self, snapshot: Snapshot) -> usize {
        let mut merged = 0;
        for (key, incoming) in snapshot.records {
            let replace = self.records.get(&key).map_or(true, |current| {
                (incoming.last_seen_at, incoming.score) > (current.last_seen_at, current.score)
            });
            if replace {
                self.records.insert(key, incoming);
                merged += 1;
            }
        }
        merged
    }

    /// Parse a snapshot in either layout and [`merge`](Self::merge) it.
    ///
    /// # Errors
    /// Returns [`StorageError::CorruptSnapshot`] if `json` is not a snapshot.
    pub fn import_legacy(&mut self, json: &str) -> Result<usize, StorageError> {
        let snapshot = Snapshot::parse(json, &self.policy)?;
        Ok(self.merge(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000_000;

    fn policy() -> SchedulerPolicy {
        SchedulerPolicy::default()
    }

    fn key() -> ItemKey {
        ItemKey::new("verbos", "ser")
    }

    #[test]
    fn missing_record_is_zero_valued() {
        let ledger = Ledger::new(policy());
        assert_eq!(ledger.get_record(&key()), MasteryRecord::default());
        assert!(!ledger.contains(&key()));
    }

    #[test]
    fn recalled_increments_without_dormancy_below_threshold() {
        let record = MasteryRecord::default().apply(Outcome::Recalled, NOW, &policy());
        assert_eq!(record.score, 1);
        assert_eq!(record.last_seen_at, NOW);
        assert_eq!(record.dormant_until, 0);
    }

    #[test]
    fn reaching_threshold_from_unseen_record_uses_base_cooldown() {
        let prior = MasteryRecord {
            score: 2,
            last_seen_at: 0,
            dormant_until: 0,
        };
        let record = prior.apply(Outcome::Recalled, NOW, &policy());
        assert_eq!(record.score, 3);
        assert_eq!(record.dormant_until, NOW + 2 * DAY_MS);
    }

    #[test]
    fn cooldown_uses_pre_outcome_last_seen() {
        let prior = MasteryRecord {
            score: 2,
            last_seen_at: NOW - DAY_MS,
            dormant_until: 0,
        };
        let record = prior.apply(Outcome::Recalled, NOW, &policy());
        // ceil(1 day * 1.5) = 2
        assert_eq!(record.dormant_until, NOW + 2 * DAY_MS);
    }

    #[test]
    fn forgotten_drops_two_and_clears_dormancy() {
        let prior = MasteryRecord {
            score: 3,
            last_seen_at: NOW - DAY_MS,
            dormant_until: NOW + DAY_MS,
        };
        let record = prior.apply(Outcome::Forgotten, NOW, &policy());
        assert_eq!(record.score, 1);
        assert_eq!(record.dormant_until, 0);
        assert!(!record.is_known(&policy()));
        assert!(!record.is_dormant(NOW));
    }

    #[test]
    fn forgotten_never_goes_negative() {
        assert_eq!(next_score(1, Outcome::Forgotten, &policy()), 0);
        assert_eq!(next_score(0, Outcome::Forgotten, &policy()), 0);
    }

    #[test]
    fn threshold_recalls_make_item_known_and_dormant() {
        let mut ledger = Ledger::new(policy());
        ledger.register(&key());
        let mut record = MasteryRecord::default();
        for step in 0..3 {
            record = ledger
                .apply_outcome(&key(), Outcome::Recalled, NOW + step * 1000)
                .unwrap();
        }
        assert_eq!(record.score, 3);
        assert!(record.dormant_until > NOW);
        assert!(record.dormant_until > record.last_seen_at);
        assert!(ledger.is_known(&key()));
    }

    #[test]
    fn unknown_item_is_rejected_without_mutation() {
        let mut ledger = Ledger::new(policy());
        let result = ledger.apply_outcome(&key(), Outcome::Recalled, NOW);
        assert_eq!(result, Err(LedgerError::UnknownItem("verbos::ser".into())));
        assert!(ledger.is_empty());
    }

    #[test]
    fn cooldown_is_capped_at_twice_base() {
        let record = MasteryRecord {
            score: 2,
            last_seen_at: NOW - 30 * DAY_MS,
            dormant_until: 0,
        };
        assert_eq!(cooldown_days(&record, NOW, &policy()), 4);
    }

    #[test]
    fn cooldown_for_same_instant_is_one_day() {
        let record = MasteryRecord {
            score: 2,
            last_seen_at: NOW,
            dormant_until: 0,
        };
        assert_eq!(cooldown_days(&record, NOW, &policy()), 1);
    }

    #[test]
    fn progress_counts_known_regardless_of_dormancy() {
        let catalog = Catalog::from_json(
            r#"{"categories":[{"id":"c","name":"C","items":[
                {"token":"a","displayText":"A"},{"token":"b","displayText":"B"}]}]}"#,
        )
        .unwrap();
        let mut ledger = Ledger::new(policy());
        let a = ItemKey::new("c", "a");
        ledger.register(&a);
        for _ in 0..3 {
            ledger.apply_outcome(&a, Outcome::Recalled, NOW).unwrap();
        }
        assert!(ledger.get_record(&a).is_dormant(NOW));
        let progress = ledger.progress(&catalog);
        assert_eq!(progress, Progress { known: 1, total: 2 });
        assert_eq!(progress.percent(), 50);
    }

    #[test]
    fn empty_progress_is_zero_percent() {
        assert_eq!(Progress::default().percent(), 0);
    }

    #[test]
    fn untouched_ledger_round_trips_stored_snapshot() {
        let mut ledger = Ledger::new(policy());
        ledger.register(&key());
        ledger.apply_outcome(&key(), Outcome::Recalled, NOW).unwrap();
        let store = MemoryStore::default();
        ledger.save(&store).unwrap();
        let before = store.load().unwrap();

        let reloaded = Ledger::load(&store, policy()).unwrap();
        reloaded.save(&store).unwrap();
        assert_eq!(store.load().unwrap(), before);
    }

    #[test]
    fn corrupt_snapshot_loads_as_empty_ledger() {
        let store = MemoryStore::with_snapshot("{definitely not json");
        let ledger = Ledger::load(&store, policy()).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn merge_keeps_the_most_recent_sighting() {
        let mut ledger = Ledger::new(policy());
        ledger.register(&key());
        ledger.apply_outcome(&key(), Outcome::Recalled, NOW).unwrap();

        let mut older = BTreeMap::new();
        older.insert(
            key(),
            MasteryRecord {
                score: 0,
                last_seen_at: NOW - DAY_MS,
                dormant_until: 0,
            },
        );
        let fresh = ItemKey::new("verbos", "ir");
        older.insert(fresh.clone(), MasteryRecord::default());

        let merged = ledger.merge(Snapshot::from_records(older, &policy()));
        assert_eq!(merged, 1);
        assert_eq!(ledger.get_record(&key()).score, 1);
        assert!(ledger.contains(&fresh));
    }

    #[test]
    fn import_legacy_reads_browser_blob() {
        let mut ledger = Ledger::new(policy());
        let json = r#"{"words":[],"timestamps":{},"wordScores":{"verbos::ser":2}}"#;
        assert_eq!(ledger.import_legacy(json).unwrap(), 1);
        assert_eq!(ledger.get_record(&key()).score, 2);
        assert!(ledger.import_legacy("[oops").is_err());
    }

    #[test]
    fn import_legacy_scores_replace_registered_records() {
        let mut ledger = Ledger::new(policy());
        let verde = ItemKey::new("colores", "verde");
        ledger.register(&verde);

        let json = r#"{"words":[],"timestamps":{},"wordScores":{"colores::verde":2}}"#;
        assert_eq!(ledger.import_legacy(json).unwrap(), 1);
        assert_eq!(ledger.get_record(&verde).score, 2);

        // a second import of the same blob changes nothing
        assert_eq!(ledger.import_legacy(json).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn cooldown_stays_within_bounds(
            elapsed in 0i64..(3650 * DAY_MS),
            base in 1u32..30,
        ) {
            let policy = SchedulerPolicy { base_cooldown_days: base, ..SchedulerPolicy::default() };
            let record = MasteryRecord { score: 1, last_seen_at: NOW - elapsed, dormant_until: 0 };
            let days = cooldown_days(&record, NOW, &policy);
            prop_assert!(days >= 1);
            prop_assert!(days <= 2 * base);
        }

        #[test]
        fn score_stays_clamped(start in 0u32..=3, outcomes in proptest::collection::vec(any::<bool>(), 0..40)) {
            let policy = SchedulerPolicy::default();
            let mut record = MasteryRecord { score: start, ..MasteryRecord::default() };
            for (i, recalled) in outcomes.into_iter().enumerate() {
                let outcome = if recalled { Outcome::Recalled } else { Outcome::Forgotten };
                record = record.apply(outcome, NOW + i as i64, &policy);
                prop_assert!(record.score <= policy.review_threshold);
                if record.is_known(&policy) {
                    prop_assert!(record.dormant_until > record.last_seen_at);
                }
            }
        }
    }
}
