use serde::Serialize;

use crate::catalog::Item;

/// An item together with the priority it was scheduled with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub item: Item,
    pub priority: f64,
}

/// Result of moving the cursor forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Item(Item),
    SessionComplete,
}

/// Ordered items of one session plus a cursor.
///
/// The cursor starts before the first entry and only moves forward. Entries
/// may be inserted at or after the cursor, never before it.
#[derive(Debug, Clone, Default)]
pub struct SessionQueue {
    entries: Vec<ScheduledItem>,
    position: Option<usize>,
}

impl SessionQueue {
    pub fn new(entries: Vec<ScheduledItem>) -> Self {
        Self {
            entries,
            position: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScheduledItem] {
        &self.entries
    }

    /// Index of the item on screen; `None` before the first `advance`.
    pub fn cursor(&self) -> Option<usize> {
        self.position
    }

    /// The item on screen, if any.
    pub fn current(&self) -> Option<&Item> {
        self.position
            .and_then(|p| self.entries.get(p))
            .map(|e| &e.item)
    }

    pub fn is_complete(&self) -> bool {
        self.position.is_some_and(|p| p >= self.entries.len())
    }

    /// Entries after the current one.
    pub fn remaining(&self) -> usize {
        match self.position {
            None => self.entries.len(),
            Some(p) => self.entries.len().saturating_sub(p + 1),
        }
    }

    /// Move to the next entry.
    pub fn advance(&mut self) -> Advance {
        let next = self.position.map_or(0, |p| p + 1).min(self.entries.len());
        self.position = Some(next);
        match self.entries.get(next) {
            Some(entry) => Advance::Item(entry.item.clone()),
            None => Advance::SessionComplete,
        }
    }

    /// Insert a copy of the current entry `offset` places ahead of the cursor,
    /// or at the last position if the queue is shorter than that. Returns the
    /// index used, or `None` if no entry is current.
    pub fn requeue_current(&mut self, offset: usize) -> Option<usize> {
        let cursor = self.position?;
        let entry = self.entries.get(cursor)?.clone();
        let at = cursor.saturating_add(offset).min(self.entries.len() - 1);
        self.entries.insert(at, entry);
        Some(at)
    }
}
