//! Bounded undo/redo history.
//!
//! Snapshots pair the serialized document content with the caret's linear
//! offset. The stack keeps at most [`HISTORY_LIMIT`] entries; the oldest is
//! evicted on overflow, and the baseline entry is never popped so undo can
//! always land on a valid state.

use serde::{Deserialize, Serialize};

pub const HISTORY_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub content: String,
    pub caret: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct History {
    stack: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Appends a snapshot unless its content matches the current top.
    /// Any push invalidates the redo stack.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self
            .stack
            .last()
            .is_some_and(|top| top.content == snapshot.content)
        {
            return;
        }
        self.stack.push(snapshot);
        if self.stack.len() > self.limit {
            self.stack.remove(0);
        }
        self.redo.clear();
    }

    /// Steps back one snapshot, returning the state to restore. The oldest
    /// entry stays as the baseline.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.stack.len() <= 1 {
            return None;
        }
        let current = self.stack.pop()?;
        self.redo.push(current);
        self.stack.last()
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        let snapshot = self.redo.pop()?;
        self.stack.push(snapshot);
        self.stack.last()
    }

    pub fn peek(&self) -> Option<&Snapshot> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
