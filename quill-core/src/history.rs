//! Bounded undo/redo history of content snapshots for one document.
//!
//! Snapshots are whole-content strings. The undo stack holds at most
//! [`HISTORY_LIMIT`] entries and evicts the oldest first. The redo stack only
//! ever holds snapshots displaced by `undo`, and any forward edit clears it.

use std::collections::VecDeque;

/// Maximum number of undo snapshots kept per document.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo: VecDeque<String>,
    redo: Vec<String>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `previous` as the state a forward edit moved away from.
    ///
    /// Evicts the oldest snapshot when the stack is full and invalidates redo.
    pub fn record(&mut self, previous: String) {
        self.push_undo(previous);
        self.redo.clear();
    }

    /// Steps back one snapshot.
    ///
    /// `current` is the content being displaced; it becomes the next redo
    /// target. Returns the snapshot to restore, or `None` (and leaves both
    /// stacks untouched) when there is nothing to undo.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(current);
        Some(snapshot)
    }

    /// Re-applies the snapshot most recently displaced by [`undo`](Self::undo).
    ///
    /// `current` goes back onto the undo stack (bounded like any other entry).
    pub fn redo(&mut self, current: String) -> Option<String> {
        let snapshot = self.redo.pop()?;
        self.push_undo(current);
        Some(snapshot)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn push_undo(&mut self, snapshot: String) {
        if self.undo.len() == HISTORY_LIMIT {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut h = EditHistory::new();
        assert_eq!(h.undo("now".into()), None);
        assert_eq!(h.redo_depth(), 0);
    }

    #[test]
    fn redo_replays_in_reverse_undo_order() {
        let mut h = EditHistory::new();
        h.record("a".into());
        h.record("b".into());
        // content is now "c"
        assert_eq!(h.undo("c".into()).as_deref(), Some("b"));
        assert_eq!(h.undo("b".into()).as_deref(), Some("a"));
        assert_eq!(h.redo("a".into()).as_deref(), Some("b"));
        assert_eq!(h.redo("b".into()).as_deref(), Some("c"));
        assert_eq!(h.redo("c".into()), None);
    }

    #[test]
    fn record_clears_redo() {
        let mut h = EditHistory::new();
        h.record("a".into());
        h.undo("b".into());
        assert!(h.can_redo());
        h.record("a".into());
        assert!(!h.can_redo());
    }

    #[test]
    fn oldest_snapshot_is_evicted_at_limit() {
        let mut h = EditHistory::new();
        for i in 0..=HISTORY_LIMIT {
            h.record(i.to_string());
        }
        assert_eq!(h.undo_depth(), HISTORY_LIMIT);

        let mut current = "latest".to_owned();
        let mut restored = Vec::new();
        while let Some(prev) = h.undo(current.clone()) {
            restored.push(prev.clone());
            current = prev;
        }
        assert_eq!(restored.len(), HISTORY_LIMIT);
        // "0" was evicted; the floor is "1".
        assert_eq!(restored.last().map(String::as_str), Some("1"));
    }

    #[test]
    fn redo_push_respects_limit() {
        let mut h = EditHistory::new();
        for i in 0..HISTORY_LIMIT {
            h.record(i.to_string());
        }
        h.undo("x".into());
        h.redo("19".into());
        assert_eq!(h.undo_depth(), HISTORY_LIMIT);
    }
}
