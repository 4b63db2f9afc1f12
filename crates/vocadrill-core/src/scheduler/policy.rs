//! Tunable constants of the scheduler.
//!
//! Serialized as the `[scheduler]` table of `config.toml`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerPolicy {
    /// Successful recalls needed before an item counts as known.
    #[serde(default = "default_review_threshold")]
    pub review_threshold: u32,
    /// Rest period for a freshly mastered item, in days.
    #[serde(default = "default_base_cooldown_days")]
    pub base_cooldown_days: u32,
    /// How far ahead of the cursor a forgotten item is reinserted.
    #[serde(default = "default_requeue_offset")]
    pub requeue_offset: usize,
    /// Score lost on a forgotten item.
    #[serde(default = "default_forgotten_penalty")]
    pub forgotten_penalty: u32,
}

fn default_review_threshold() -> u32 {
    3
}
fn default_base_cooldown_days() -> u32 {
    2
}
fn default_requeue_offset() -> usize {
    3
}
fn default_forgotten_penalty() -> u32 {
    2
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            review_threshold: default_review_threshold(),
            base_cooldown_days: default_base_cooldown_days(),
            requeue_offset: default_requeue_offset(),
            forgotten_penalty: default_forgotten_penalty(),
        }
    }
}

impl SchedulerPolicy {
    /// Upper bound of any cooldown, in days.
    pub fn max_cooldown_days(&self) -> u32 {
        self.base_cooldown_days.saturating_mul(2).max(1)
    }

    /// Check the values a user may set through the config file.
    pub fn validate(&self) -> Result<(), String> {
        if self.review_threshold == 0 {
            return Err("review_threshold must be at least 1".into());
        }
        if self.base_cooldown_days == 0 {
            return Err("base_cooldown_days must be at least 1".into());
        }
        if self.requeue_offset == 0 {
            return Err("requeue_offset must be at least 1".into());
        }
        Ok(())
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
