//! Sparse two-dimensional cell store.
//!
//! `SparseGrid` is a 16-way radix tree keyed by row whose leaves are 16-way
//! radix trees keyed by column. An unpopulated subtree is a `None` slot, so an
//! empty region of any size costs one pointer. Lookups walk a fixed number of
//! levels (5 for rows, 4 for columns).
//!
//! Shifts split the tree along the boundary path and re-link the detached
//! tail at its new offset. A subtree whose new base stays aligned to its own
//! span moves as one pointer, so shifting by a multiple of `16^k` touches one
//! node per populated `16^k` block rather than every entry. Column edits do
//! this once per populated row. Payloads are moved, never cloned.

use std::fmt;

use sheetcore_common::{Axis, CellPosition, GridError, MAX_COLS, MAX_ROWS, RangePosition};

const BITS: u32 = 4;
const FANOUT: usize = 1 << BITS;
const MASK: u32 = (FANOUT as u32) - 1;

/// Levels needed to address 2^20 rows.
const ROW_LEVELS: u32 = 5;
/// Levels needed to address 2^14 columns (rounded up to 16 bits).
const COL_LEVELS: u32 = 4;

#[derive(Clone)]
enum Node<T> {
    Inner(Box<[Option<Node<T>>; FANOUT]>),
    Leaf(Box<[Option<T>; FANOUT]>),
}

impl<T> Node<T> {
    fn empty(remaining: u32) -> Self {
        if remaining <= 1 {
            Node::Leaf(Box::new(std::array::from_fn(|_| None)))
        } else {
            Node::Inner(Box::new(std::array::from_fn(|_| None)))
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Node::Inner(children) => children.iter().all(Option::is_none),
            Node::Leaf(items) => items.iter().all(Option::is_none),
        }
    }
}

#[inline(always)]
fn slot_of(key: u32, remaining: u32) -> usize {
    ((key >> ((remaining - 1) * BITS)) & MASK) as usize
}

#[inline(always)]
fn child_base(base: u32, slot: usize, remaining: u32) -> u32 {
    base + ((slot as u32) << ((remaining - 1) * BITS))
}

#[inline(always)]
fn child_last(child_base: u32, remaining: u32) -> u64 {
    child_base as u64 + (1u64 << ((remaining - 1) * BITS)) - 1
}

fn insert_in<T>(node: &mut Node<T>, key: u32, remaining: u32, value: T) -> Option<T> {
    let slot = slot_of(key, remaining);
    match node {
        Node::Inner(children) => {
            let child = children[slot].get_or_insert_with(|| Node::empty(remaining - 1));
            insert_in(child, key, remaining - 1, value)
        }
        Node::Leaf(items) => items[slot].replace(value),
    }
}

fn get_in<T>(node: &Node<T>, key: u32, remaining: u32) -> Option<&T> {
    let slot = slot_of(key, remaining);
    match node {
        Node::Inner(children) => get_in(children[slot].as_ref()?, key, remaining - 1),
        Node::Leaf(items) => items[slot].as_ref(),
    }
}

fn get_mut_in<T>(node: &mut Node<T>, key: u32, remaining: u32) -> Option<&mut T> {
    let slot = slot_of(key, remaining);
    match node {
        Node::Inner(children) => get_mut_in(children[slot].as_mut()?, key, remaining - 1),
        Node::Leaf(items) => items[slot].as_mut(),
    }
}

fn remove_in<T>(node: &mut Node<T>, key: u32, remaining: u32) -> Option<T> {
    let slot = slot_of(key, remaining);
    match node {
        Node::Inner(children) => {
            let (removed, emptied) = match children[slot].as_mut() {
                Some(child) => {
                    let removed = remove_in(child, key, remaining - 1);
                    (removed, child.is_empty())
                }
                None => return None,
            };
            if emptied {
                children[slot] = None;
            }
            removed
        }
        Node::Leaf(items) => items[slot].take(),
    }
}

fn drain_in<T>(
    node: &mut Node<T>,
    base: u32,
    remaining: u32,
    lo: u32,
    hi: u32,
    out: &mut Vec<(u32, T)>,
) {
    match node {
        Node::Inner(children) => {
            for (slot, entry) in children.iter_mut().enumerate() {
                let cb = child_base(base, slot, remaining);
                if child_last(cb, remaining) < lo as u64 || cb > hi {
                    continue;
                }
                let emptied = match entry.as_mut() {
                    Some(child) => {
                        drain_in(child, cb, remaining - 1, lo, hi, out);
                        child.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    *entry = None;
                }
            }
        }
        Node::Leaf(items) => {
            for (slot, item) in items.iter_mut().enumerate() {
                let key = base + slot as u32;
                if key < lo || key > hi {
                    continue;
                }
                if let Some(value) = item.take() {
                    out.push((key, value));
                }
            }
        }
    }
}

/// Keys covered by a node with `remaining` levels at and below it.
#[inline(always)]
fn span(remaining: u32) -> u64 {
    1u64 << (remaining * BITS)
}

/// Detach every key `>= at` from `node` into a node of the same level.
fn split_in<T>(node: &mut Node<T>, base: u64, remaining: u32, at: u64) -> Option<Node<T>> {
    let tail = match node {
        Node::Inner(children) => {
            let width = span(remaining - 1);
            let mut out: Box<[Option<Node<T>>; FANOUT]> =
                Box::new(std::array::from_fn(|_| None));
            for (slot, entry) in children.iter_mut().enumerate() {
                let cb = base + slot as u64 * width;
                if cb >= at {
                    out[slot] = entry.take();
                } else if cb + width > at {
                    let emptied = match entry.as_mut() {
                        Some(child) => {
                            out[slot] = split_in(child, cb, remaining - 1, at);
                            child.is_empty()
                        }
                        None => false,
                    };
                    if emptied {
                        *entry = None;
                    }
                }
            }
            Node::Inner(out)
        }
        Node::Leaf(items) => {
            let mut out: Box<[Option<T>; FANOUT]> = Box::new(std::array::from_fn(|_| None));
            for (slot, item) in items.iter_mut().enumerate() {
                if base + slot as u64 >= at {
                    out[slot] = item.take();
                }
            }
            Node::Leaf(out)
        }
    };
    (!tail.is_empty()).then_some(tail)
}

/// Fold `source` into `target`; both cover the same keys.
fn merge_in<T>(target: &mut Node<T>, source: Node<T>) {
    match (target, source) {
        (Node::Inner(into), Node::Inner(from)) => {
            for (slot, child) in (*from).into_iter().enumerate() {
                let Some(child) = child else { continue };
                match into[slot].as_mut() {
                    Some(existing) => merge_in(existing, child),
                    None => into[slot] = Some(child),
                }
            }
        }
        (Node::Leaf(into), Node::Leaf(from)) => {
            for (slot, item) in (*from).into_iter().enumerate() {
                if item.is_some() {
                    into[slot] = item;
                }
            }
        }
        _ => unreachable!("merged subtrees sit at the same depth"),
    }
}

/// Hang `node`, a subtree `remaining` levels deep starting at key `dest`,
/// below `current`, which sits at `level`.
fn place_in<T>(current: &mut Node<T>, level: u32, node: Node<T>, dest: u64, remaining: u32) {
    let slot = ((dest >> ((level - 1) * BITS)) & MASK as u64) as usize;
    match current {
        Node::Inner(children) if level - 1 == remaining => match children[slot].as_mut() {
            Some(existing) => merge_in(existing, node),
            None => children[slot] = Some(node),
        },
        Node::Inner(children) => {
            let child = children[slot].get_or_insert_with(|| Node::empty(level - 1));
            place_in(child, level - 1, node, dest, remaining);
        }
        Node::Leaf(_) => unreachable!("subtrees are never placed below a leaf"),
    }
}

/// Every entry of `node` in ascending key order.
fn collect_in<T>(node: Node<T>, base: u64, remaining: u32, out: &mut Vec<(u32, T)>) {
    match node {
        Node::Inner(children) => {
            let width = span(remaining - 1);
            for (slot, child) in (*children).into_iter().enumerate() {
                if let Some(child) = child {
                    collect_in(child, base + slot as u64 * width, remaining - 1, out);
                }
            }
        }
        Node::Leaf(items) => {
            for (slot, item) in (*items).into_iter().enumerate() {
                if let Some(value) = item {
                    out.push(((base + slot as u64) as u32, value));
                }
            }
        }
    }
}

fn last_in<T>(node: &Node<T>, base: u32, remaining: u32) -> Option<u32> {
    match node {
        Node::Inner(children) => (0..FANOUT).rev().find_map(|slot| {
            children[slot]
                .as_ref()
                .and_then(|child| last_in(child, child_base(base, slot, remaining), remaining - 1))
        }),
        Node::Leaf(items) => (0..FANOUT)
            .rev()
            .find(|slot| items[*slot].is_some())
            .map(|slot| base + slot as u32),
    }
}

/// Fixed-depth 16-way radix tree over `u32` keys.
#[derive(Clone)]
pub struct RadixTree<T> {
    levels: u32,
    root: Option<Node<T>>,
}

impl<T> RadixTree<T> {
    /// Tree addressing keys below `16^levels`.
    pub fn new(levels: u32) -> Self {
        assert!((1..=8).contains(&levels), "unsupported radix depth {levels}");
        Self { levels, root: None }
    }

    /// One past the largest key this tree can address.
    pub fn key_limit(&self) -> u64 {
        1u64 << (self.levels * BITS)
    }

    /// Walks the tree; the count is not cached because shifts move whole subtrees.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, key: u32) -> Option<&T> {
        if key as u64 >= self.key_limit() {
            return None;
        }
        get_in(self.root.as_ref()?, key, self.levels)
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut T> {
        if key as u64 >= self.key_limit() {
            return None;
        }
        get_mut_in(self.root.as_mut()?, key, self.levels)
    }

    /// Store `value` at `key`, returning the previous occupant.
    pub fn insert(&mut self, key: u32, value: T) -> Option<T> {
        assert!(
            (key as u64) < self.key_limit(),
            "key {key} exceeds radix tree depth {}",
            self.levels
        );
        let levels = self.levels;
        let root = self.root.get_or_insert_with(|| Node::empty(levels));
        insert_in(root, key, levels, value)
    }

    pub fn remove(&mut self, key: u32) -> Option<T> {
        if key as u64 >= self.key_limit() {
            return None;
        }
        let root = self.root.as_mut()?;
        let removed = remove_in(root, key, self.levels);
        let emptied = root.is_empty();
        if emptied {
            self.root = None;
        }
        removed
    }

    /// Remove every entry with `lo <= key <= hi`, in ascending key order.
    pub fn drain_range(&mut self, lo: u32, hi: u32) -> Vec<(u32, T)> {
        let mut out = Vec::new();
        if lo > hi {
            return out;
        }
        let levels = self.levels;
        let emptied = match self.root.as_mut() {
            Some(root) => {
                drain_in(root, 0, levels, lo, hi, &mut out);
                root.is_empty()
            }
            None => false,
        };
        if emptied {
            self.root = None;
        }
        out
    }

    /// Largest occupied key.
    pub fn last_key(&self) -> Option<u32> {
        last_in(self.root.as_ref()?, 0, self.levels)
    }

    /// Entries with `lo <= key <= hi` in ascending order. Empty subtrees are skipped.
    pub fn range(&self, lo: u32, hi: u32) -> RadixRange<'_, T> {
        let mut stack = Vec::with_capacity(self.levels as usize);
        if lo <= hi {
            if let Some(root) = self.root.as_ref() {
                stack.push(Frame {
                    node: root,
                    base: 0,
                    remaining: self.levels,
                    next: 0,
                });
            }
        }
        RadixRange { stack, lo, hi }
    }

    pub fn iter(&self) -> RadixRange<'_, T> {
        self.range(0, u32::MAX)
    }

    /// Open a gap of `count` keys at `at`: keys `>= at` move up by `count`.
    ///
    /// Entries pushed past `limit` are returned in ascending order of their
    /// original key.
    pub fn open_gap(&mut self, at: u32, count: u32, limit: u32) -> Vec<(u32, T)> {
        let mut dropped = Vec::new();
        if count == 0 {
            return dropped;
        }
        if let Some(tail) = self.split_off(at as u64) {
            self.relocate(tail, 0, self.levels, count as i64, limit as u64, &mut dropped);
        }
        dropped
    }

    /// Remove keys `[at, at + count)` and close the gap. Removed entries are returned.
    pub fn close_gap(&mut self, at: u32, count: u32) -> Vec<(u32, T)> {
        let mut removed = Vec::new();
        if count == 0 {
            return removed;
        }
        let Some(mut window) = self.split_off(at as u64) else {
            return removed;
        };
        let rest = split_in(&mut window, 0, self.levels, at as u64 + count as u64);
        collect_in(window, 0, self.levels, &mut removed);
        if let Some(rest) = rest {
            let mut dropped = Vec::new();
            let limit = self.key_limit();
            self.relocate(rest, 0, self.levels, -(count as i64), limit, &mut dropped);
            debug_assert!(dropped.is_empty(), "closing a gap never pushes keys out");
        }
        removed
    }

    /// Detach every key `>= at` as a root-level node.
    fn split_off(&mut self, at: u64) -> Option<Node<T>> {
        let levels = self.levels;
        let root = self.root.as_mut()?;
        let tail = split_in(root, 0, levels, at);
        if root.is_empty() {
            self.root = None;
        }
        tail
    }

    /// Re-link the keys of `node`, which covers `[base, base + span)`,
    /// `shift` keys away. Subtrees landing on a base aligned to their span
    /// move whole; entries landing at or past `limit` go to `dropped`.
    fn relocate(
        &mut self,
        node: Node<T>,
        base: u64,
        remaining: u32,
        shift: i64,
        limit: u64,
        dropped: &mut Vec<(u32, T)>,
    ) {
        let width = span(remaining);
        let dest = base as i64 + shift;
        if dest >= limit as i64 {
            collect_in(node, base, remaining, dropped);
            return;
        }
        if dest >= 0 && (dest as u64) % width == 0 && dest as u64 + width <= limit {
            self.place(node, dest as u64, remaining);
            return;
        }
        match node {
            Node::Inner(children) => {
                let child_width = span(remaining - 1);
                for (slot, child) in (*children).into_iter().enumerate() {
                    if let Some(child) = child {
                        let cb = base + slot as u64 * child_width;
                        self.relocate(child, cb, remaining - 1, shift, limit, dropped);
                    }
                }
            }
            Node::Leaf(items) => {
                for (slot, item) in (*items).into_iter().enumerate() {
                    let Some(value) = item else { continue };
                    let key = base + slot as u64;
                    let moved = key as i64 + shift;
                    if moved < limit as i64 {
                        self.insert(moved as u32, value);
                    } else {
                        dropped.push((key as u32, value));
                    }
                }
            }
        }
    }

    fn place(&mut self, node: Node<T>, dest: u64, remaining: u32) {
        let levels = self.levels;
        if remaining == levels {
            match self.root.as_mut() {
                Some(root) => merge_in(root, node),
                None => self.root = Some(node),
            }
            return;
        }
        let root = self.root.get_or_insert_with(|| Node::empty(levels));
        place_in(root, levels, node, dest, remaining);
    }
}

impl<T: fmt::Debug> fmt::Debug for RadixTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

struct Frame<'a, T> {
    node: &'a Node<T>,
    base: u32,
    remaining: u32,
    next: usize,
}

/// Lazy in-order walk over a key range of a [`RadixTree`].
pub struct RadixRange<'a, T> {
    stack: Vec<Frame<'a, T>>,
    lo: u32,
    hi: u32,
}

impl<'a, T> Iterator for RadixRange<'a, T> {
    type Item = (u32, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.next >= FANOUT {
                self.stack.pop();
                continue;
            }
            let slot = frame.next;
            frame.next += 1;
            let (node, base, remaining) = (frame.node, frame.base, frame.remaining);

            let cb = child_base(base, slot, remaining);
            if child_last(cb, remaining) < self.lo as u64 {
                continue;
            }
            if cb > self.hi {
                self.stack.pop();
                continue;
            }
            match node {
                Node::Inner(children) => {
                    if let Some(child) = children[slot].as_ref() {
                        self.stack.push(Frame {
                            node: child,
                            base: cb,
                            remaining: remaining - 1,
                            next: 0,
                        });
                    }
                }
                Node::Leaf(items) => {
                    if let Some(value) = items[slot].as_ref() {
                        return Some((cb, value));
                    }
                }
            }
        }
    }
}

/// Sparse (row, column) → payload store over the full addressable grid.
#[derive(Clone)]
pub struct SparseGrid<T> {
    rows: RadixTree<RadixTree<T>>,
    len: usize,
}

impl<T> Default for SparseGrid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseGrid<T> {
    pub fn new() -> Self {
        Self {
            rows: RadixTree::new(ROW_LEVELS),
            len: 0,
        }
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, pos: CellPosition) -> Option<&T> {
        self.rows.get(pos.row())?.get(pos.col())
    }

    pub fn get_mut(&mut self, pos: CellPosition) -> Option<&mut T> {
        self.rows.get_mut(pos.row())?.get_mut(pos.col())
    }

    /// Store a payload, returning the previous one.
    pub fn set(&mut self, pos: CellPosition, value: T) -> Option<T> {
        let row = match self.rows.get_mut(pos.row()) {
            Some(row) => row,
            None => {
                self.rows.insert(pos.row(), RadixTree::new(COL_LEVELS));
                match self.rows.get_mut(pos.row()) {
                    Some(row) => row,
                    None => unreachable!("row {} was just inserted", pos.row()),
                }
            }
        };
        let previous = row.insert(pos.col(), value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Store a payload at raw coordinates, rejecting addresses outside the grid.
    pub fn try_set(&mut self, row: u32, col: u32, value: T) -> Result<Option<T>, GridError> {
        let pos = CellPosition::try_new(row, col)?;
        Ok(self.set(pos, value))
    }

    pub fn clear(&mut self, pos: CellPosition) -> Option<T> {
        let row = self.rows.get_mut(pos.row())?;
        let removed = row.remove(pos.col());
        let emptied = row.is_empty();
        if emptied {
            self.rows.remove(pos.row());
        }
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Populated cells inside `range`, row-major. Empty subtrees are never visited.
    pub fn iter_range(&self, range: &RangePosition) -> impl Iterator<Item = (CellPosition, &T)> + '_ {
        let (r0, r1) = (range.row(), range.last_row(MAX_ROWS));
        let (c0, c1) = (range.col(), range.last_col(MAX_COLS));
        self.rows.range(r0, r1).flat_map(move |(r, row)| {
            row.range(c0, c1)
                .map(move |(c, value)| (CellPosition::new(r, c), value))
        })
    }

    /// Every position inside `range` with its payload, or only populated ones
    /// when `skip_empty` is set. Restartable: each call begins a new walk.
    pub fn iterate_range(
        &self,
        range: &RangePosition,
        skip_empty: bool,
    ) -> Box<dyn Iterator<Item = (CellPosition, Option<&T>)> + '_> {
        if skip_empty {
            return Box::new(self.iter_range(range).map(|(pos, v)| (pos, Some(v))));
        }
        let (r0, r1) = (range.row(), range.last_row(MAX_ROWS));
        let (c0, c1) = (range.col(), range.last_col(MAX_COLS));
        Box::new((r0..=r1).flat_map(move |r| {
            (c0..=c1).map(move |c| {
                let pos = CellPosition::new(r, c);
                (pos, self.get(pos))
            })
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellPosition, &T)> + '_ {
        self.rows.iter().flat_map(|(r, row)| {
            row.iter()
                .map(move |(c, value)| (CellPosition::new(r, c), value))
        })
    }

    /// Highest populated row.
    pub fn max_row(&self) -> Option<u32> {
        self.rows.last_key()
    }

    /// Highest populated column across all rows.
    pub fn max_col(&self) -> Option<u32> {
        self.rows.iter().filter_map(|(_, row)| row.last_key()).max()
    }

    /// Move cells at or below `at` down by `count` rows. Cells pushed off the
    /// grid are returned.
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        let dropped = self.rows.open_gap(at, count, MAX_ROWS);
        self.flatten_rows(dropped)
    }

    /// Remove rows `[at, at + count)` and move later rows up. Removed cells are returned.
    pub fn delete_rows(&mut self, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        let removed = self.rows.close_gap(at, count);
        self.flatten_rows(removed)
    }

    /// Move cells at or right of `at` right by `count` columns.
    pub fn insert_cols(&mut self, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        self.edit_columns(|row| row.open_gap(at, count, MAX_COLS))
    }

    /// Remove columns `[at, at + count)` and move later columns left.
    pub fn delete_cols(&mut self, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        self.edit_columns(|row| row.close_gap(at, count))
    }

    /// Axis-generic form of the four shift operations.
    pub fn insert_lines(&mut self, axis: Axis, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        match axis {
            Axis::Row => self.insert_rows(at, count),
            Axis::Column => self.insert_cols(at, count),
        }
    }

    pub fn delete_lines(&mut self, axis: Axis, at: u32, count: u32) -> Vec<(CellPosition, T)> {
        match axis {
            Axis::Row => self.delete_rows(at, count),
            Axis::Column => self.delete_cols(at, count),
        }
    }

    fn edit_columns<F>(&mut self, mut edit: F) -> Vec<(CellPosition, T)>
    where
        F: FnMut(&mut RadixTree<T>) -> Vec<(u32, T)>,
    {
        let row_keys: Vec<u32> = self.rows.iter().map(|(r, _)| r).collect();
        let mut out = Vec::new();
        for r in row_keys {
            let (taken, emptied) = match self.rows.get_mut(r) {
                Some(row) => {
                    let taken = edit(row);
                    (taken, row.is_empty())
                }
                None => continue,
            };
            if emptied {
                self.rows.remove(r);
            }
            out.extend(
                taken
                    .into_iter()
                    .map(|(c, value)| (CellPosition::new(r, c), value)),
            );
        }
        self.len -= out.len();
        out
    }

    fn flatten_rows(&mut self, rows: Vec<(u32, RadixTree<T>)>) -> Vec<(CellPosition, T)> {
        let mut out = Vec::new();
        for (r, mut row) in rows {
            out.extend(
                row.drain_range(0, u32::MAX)
                    .into_iter()
                    .map(|(c, value)| (CellPosition::new(r, c), value)),
            );
        }
        self.len -= out.len();
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseGrid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
