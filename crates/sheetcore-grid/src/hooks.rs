//! Change notification and lock queries.
//!
//! The grid core tells outside collaborators (formula dependency tracking,
//! floating-shape anchors) about structural edits through `ChangeListener`s,
//! and asks a `LockPredicate` whether a cell may be destroyed.

use sheetcore_common::{CellPosition, RangePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Insert,
    Delete,
    Merge,
    Unmerge,
    BorderChange,
}

/// One structural edit, described by the lines or cells it touched.
///
/// For `Insert`/`Delete` the range spans whole rows or whole columns: the
/// inserted lines, or the deleted window before it was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub range: RangePosition,
    pub kind: EditKind,
}

impl ChangeEvent {
    pub fn new(range: RangePosition, kind: EditKind) -> Self {
        Self { range, kind }
    }
}

pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeEvent),
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Subscribed listeners, notified in subscription order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn ChangeListener>)>,
}

impl Listeners {
    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&mut self, event: &ChangeEvent) {
        for (_, listener) in &mut self.entries {
            listener.on_change(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Decides whether a populated cell is read-only.
pub trait LockPredicate {
    fn is_locked(&self, pos: CellPosition) -> bool;
}

impl<F> LockPredicate for F
where
    F: Fn(CellPosition) -> bool,
{
    fn is_locked(&self, pos: CellPosition) -> bool {
        self(pos)
    }
}
