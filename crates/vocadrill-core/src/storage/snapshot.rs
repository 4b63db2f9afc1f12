//! Serialized form of the mastery ledger.
//!
//! Current format:
//!
//! ```json
//! { "version": 1,
//!   "records": { "verbos::ser": { "score": 3, "lastSeenAt": 1700000000000, "dormantUntil": 1700172800000 } },
//!   "words": ["verbos::ser"] }
//! ```
//!
//! `words` lists the known keys for readers that only understand the older
//! browser format. That older format (`words`, `timestamps`, `wordScores`,
//! no `records`) is still accepted on load and converted.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::catalog::ItemKey;
use crate::error::StorageError;
use crate::ledger::MasteryRecord;
use crate::scheduler::{SchedulerPolicy, DAY_MS};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub records: BTreeMap<ItemKey, MasteryRecord>,
    /// Keys whose score reached the review threshold.
    pub words: Vec<ItemKey>,
}

/// Union of the current and the browser-era layout.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnySnapshot {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    records: Option<BTreeMap<ItemKey, MasteryRecord>>,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    timestamps: HashMap<String, f64>,
    #[serde(default)]
    word_scores: HashMap<String, f64>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: BTreeMap::new(),
            words: Vec::new(),
        }
    }

    /// Build a snapshot, deriving the known-keys list from the scores.
    pub fn from_records(records: BTreeMap<ItemKey, MasteryRecord>, policy: &SchedulerPolicy) -> Self {
        let words = records
            .iter()
            .filter(|(_, r)| r.is_known(policy))
            .map(|(k, _)| k.clone())
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            records,
            words,
        }
    }

    /// Parse either snapshot layout.
    ///
    /// # Errors
    /// Returns [`StorageError::CorruptSnapshot`] if the text is not a snapshot
    /// or was written by a newer version.
    pub fn parse(raw: &str, policy: &SchedulerPolicy) -> Result<Self, StorageError> {
        let any: AnySnapshot =
            serde_json::from_str(raw).map_err(|e| StorageError::CorruptSnapshot(e.to_string()))?;

        if let Some(version) = any.version {
            if version > SNAPSHOT_VERSION {
                return Err(StorageError::CorruptSnapshot(format!(
                    "unsupported snapshot version {version}"
                )));
            }
        }

        let records = match any.records {
            Some(records) => records
                .into_iter()
                .map(|(k, r)| (k, clamp_record(r, policy)))
                .collect(),
            None => convert_legacy(&any.words, &any.timestamps, &any.word_scores, policy),
        };
        Ok(Self::from_records(records, policy))
    }

    /// Canonical JSON text. Identical snapshots always produce identical text.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::CorruptSnapshot(e.to_string()))
    }
}

/// Fit a stored record to the current policy.
///
/// A known record must rest past its last sighting. When a lowered threshold
/// makes a record known without that, it rests one base cooldown from its
/// last sighting; a record that was never seen stays just below the threshold.
fn clamp_record(record: MasteryRecord, policy: &SchedulerPolicy) -> MasteryRecord {
    let threshold = policy.review_threshold;
    let mut fitted = MasteryRecord {
        score: record.score.min(threshold),
        last_seen_at: record.last_seen_at.max(0),
        dormant_until: record.dormant_until.max(0),
    };
    if fitted.score >= threshold && fitted.dormant_until <= fitted.last_seen_at {
        if fitted.is_seen() {
            let base_ms = i64::from(policy.base_cooldown_days).saturating_mul(DAY_MS);
            fitted.dormant_until = fitted.last_seen_at.saturating_add(base_ms);
        } else {
            fitted.score = threshold.saturating_sub(1);
        }
    }
    fitted
}

/// Convert the browser-era blob.
///
/// There, `timestamps[key]` was written only when a word was mastered and held
/// the end of its rest period. A known word therefore becomes dormant until
/// that instant, last seen one base cooldown earlier. A word that is listed as
/// known but has no timestamp keeps its score just below the threshold, since
/// its dormancy cannot be reconstructed.
fn convert_legacy(
    words: &[String],
    timestamps: &HashMap<String, f64>,
    word_scores: &HashMap<String, f64>,
    policy: &SchedulerPolicy,
) -> BTreeMap<ItemKey, MasteryRecord> {
    let known: BTreeSet<&str> = words.iter().map(String::as_str).collect();
    let keys: BTreeSet<&str> = known
        .iter()
        .copied()
        .chain(timestamps.keys().map(String::as_str))
        .chain(word_scores.keys().map(String::as_str))
        .collect();

    let threshold = policy.review_threshold;
    let base_ms = i64::from(policy.base_cooldown_days) * DAY_MS;

    keys.into_iter()
        .map(|key| {
            let stored_score = word_scores
                .get(key)
                .map(|s| s.max(0.0).round() as u32)
                .unwrap_or(0)
                .min(threshold);
            let timestamp = timestamps
                .get(key)
                .map(|t| t.max(0.0) as i64)
                .filter(|t| *t > 0);

            let record = match (known.contains(key) || stored_score >= threshold, timestamp) {
                (true, Some(until)) => MasteryRecord {
                    score: threshold,
                    last_seen_at: (until - base_ms).clamp(0, until - 1),
                    dormant_until: until,
                },
                (true, None) => MasteryRecord {
                    score: threshold.saturating_sub(1),
                    last_seen_at: 0,
                    dormant_until: 0,
                },
                (false, ts) => MasteryRecord {
                    score: stored_score,
                    last_seen_at: ts.unwrap_or(0),
                    dormant_until: 0,
                },
            };
            (ItemKey::from(key), record)
        })
        .collect()
}
