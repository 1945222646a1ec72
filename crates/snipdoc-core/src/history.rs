use std::collections::VecDeque;

use crate::MAX_UNDO_HISTORY;

/// Bounded log of text appended to one document, oldest first.
///
/// Once `limit` entries are held, each push drops the oldest entry first, so
/// `len() <= limit` at all times.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(text.into());
    }

    /// Most recently pushed entry.
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the entries in chronological order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}
