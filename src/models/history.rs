//! Snapshot-based undo/redo for the key sequence.
//!
//! Each entry is a full, owned copy of the key list taken before a mutation.
//! Selection and unit pitch are not part of a snapshot.

use std::collections::VecDeque;

use crate::models::KeyLayout;

/// One stored key sequence.
pub type Snapshot = Vec<KeyLayout>;

/// Undo (`past`) and redo (`future`) stacks.
///
/// # Capacity
///
/// Unbounded unless created with [`History::with_limit`], in which case the
/// oldest undo entry is evicted once the limit is exceeded.
#[derive(Debug, Clone, Default)]
pub struct History {
    past: Vec<Snapshot>,
    future: VecDeque<Snapshot>,
    limit: Option<usize>,
}

impl History {
    /// Creates an empty, unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history keeping at most `limit` undo entries.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Maximum number of undo entries, if capped.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Records the pre-mutation state and invalidates redo.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.push_past(snapshot);
        self.future.clear();
    }

    /// Steps back. Returns the state to restore, or `None` if there is nothing to undo.
    ///
    /// `current` is kept so the step can be redone.
    pub fn undo(&mut self, current: &[KeyLayout]) -> Option<Snapshot> {
        let previous = self.past.pop()?;
        self.future.push_front(current.to_vec());
        Some(previous)
    }

    /// Steps forward. Returns the state to restore, or `None` if there is nothing to redo.
    pub fn redo(&mut self, current: &[KeyLayout]) -> Option<Snapshot> {
        let next = self.future.pop_front()?;
        self.push_past(current.to_vec());
        Some(next)
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Returns true if there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Returns true if there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo entries.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of redo entries.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    fn push_past(&mut self, snapshot: Snapshot) {
        self.past.push(snapshot);
        if let Some(limit) = self.limit {
            if self.past.len() > limit {
                let excess = self.past.len() - limit;
                self.past.drain(..excess);
            }
        }
    }
}
