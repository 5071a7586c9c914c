use std::collections::VecDeque;

use crate::action::Action;
use crate::mutator::Revert;

/// One performed action with the payload that reverts it.
#[derive(Debug)]
pub(crate) struct UndoEntry<V> {
    pub(crate) action: Action<V>,
    pub(crate) revert: Revert<V>,
    /// Sheet extent before the action ran.
    pub(crate) extents: (u32, u32),
}

/// Bounded undo history plus a redo stack of actions to perform again.
#[derive(Debug)]
pub(crate) struct UndoStack<V> {
    done: VecDeque<UndoEntry<V>>,
    undone: Vec<Action<V>>,
    limit: usize,
}

impl<V> UndoStack<V> {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            limit,
        }
    }

    /// Record a fresh edit. Any redo history is discarded.
    pub(crate) fn push(&mut self, entry: UndoEntry<V>) {
        self.undone.clear();
        self.push_done(entry);
    }

    /// Record a redone edit, keeping the rest of the redo history.
    pub(crate) fn push_done(&mut self, entry: UndoEntry<V>) {
        if self.limit == 0 {
            return;
        }
        self.done.push_back(entry);
        while self.done.len() > self.limit {
            self.done.pop_front();
        }
    }

    pub(crate) fn pop_done(&mut self) -> Option<UndoEntry<V>> {
        self.done.pop_back()
    }

    pub(crate) fn push_undone(&mut self, action: Action<V>) {
        self.undone.push(action);
    }

    pub(crate) fn pop_undone(&mut self) -> Option<Action<V>> {
        self.undone.pop()
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub(crate) fn undo_label(&self) -> Option<String> {
        self.done.back().map(|entry| entry.action.describe())
    }

    pub(crate) fn redo_label(&self) -> Option<String> {
        self.undone.last().map(Action::describe)
    }
}
