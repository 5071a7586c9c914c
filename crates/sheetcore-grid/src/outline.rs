//! Row and column outline groups.
//!
//! Each axis keeps a flat list of intervals sorted so that a parent always
//! precedes its children. Intervals on one axis are pairwise disjoint or
//! strictly nested. Collapsing marks a node; a line is hidden while any
//! collapsed node contains it, so line sizes never have to be rewritten.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sheetcore_common::{Axis, GridError};

use crate::shift::ShiftOperation;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutlineNode {
    pub start: u32,
    pub count: u32,
    pub collapsed: bool,
}

impl OutlineNode {
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    #[inline]
    pub fn contains_line(&self, line: u32) -> bool {
        self.start <= line && line < self.end()
    }

    fn same_interval(&self, start: u32, count: u32) -> bool {
        self.start == start && self.count == count
    }

    fn encloses(&self, start: u32, count: u32) -> bool {
        self.start <= start && start + count <= self.end()
    }

    fn overlaps(&self, start: u32, count: u32) -> bool {
        self.start < start + count && start < self.end()
    }
}

/// Outline nodes a shift cannot give back through its inverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlinePatch {
    axis: Axis,
    /// Nodes as they stood before the shift.
    original: Vec<OutlineNode>,
    /// Spans those nodes occupy after the shift and its inverse.
    images: Vec<(u32, u32)>,
}

impl OutlinePatch {
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Outline groups along one axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineAxis {
    axis: Axis,
    nodes: Vec<OutlineNode>,
}

impl OutlineAxis {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            nodes: Vec::new(),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Nodes ordered by start, outer before inner.
    pub fn nodes(&self) -> &[OutlineNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, start: u32, count: u32) -> Result<(), GridError> {
        self.check_bounds(start, count)?;
        for node in &self.nodes {
            if node.same_interval(start, count) {
                return Err(GridError::OutlineExists {
                    axis: self.axis,
                    start,
                    count,
                });
            }
            let nested = node.encloses(start, count)
                || (start <= node.start && node.end() <= start + count);
            if node.overlaps(start, count) && !nested {
                return Err(GridError::AmbiguousOutlineNesting {
                    axis: self.axis,
                    start,
                    count,
                    other_start: node.start,
                    other_count: node.count,
                });
            }
        }
        self.nodes.push(OutlineNode {
            start,
            count,
            collapsed: false,
        });
        self.normalize();
        Ok(())
    }

    pub fn remove(&mut self, start: u32, count: u32) -> Result<OutlineNode, GridError> {
        let idx = self.find(start, count)?;
        Ok(self.nodes.remove(idx))
    }

    /// Set the collapsed flag, returning the previous value.
    pub fn set_collapsed(
        &mut self,
        start: u32,
        count: u32,
        collapsed: bool,
    ) -> Result<bool, GridError> {
        let idx = self.find(start, count)?;
        let previous = self.nodes[idx].collapsed;
        self.nodes[idx].collapsed = collapsed;
        Ok(previous)
    }

    pub fn collapse(&mut self, start: u32, count: u32) -> Result<bool, GridError> {
        self.set_collapsed(start, count, true)
    }

    pub fn expand(&mut self, start: u32, count: u32) -> Result<bool, GridError> {
        self.set_collapsed(start, count, false)
    }

    pub fn get(&self, start: u32, count: u32) -> Option<&OutlineNode> {
        self.nodes.iter().find(|n| n.same_interval(start, count))
    }

    /// Nodes grouped by nesting depth; index 0 holds the outermost groups.
    pub fn get_outlines(&self) -> Vec<Vec<OutlineNode>> {
        let mut levels: Vec<Vec<OutlineNode>> = Vec::new();
        for node in &self.nodes {
            let depth = self.depth_of(node);
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(*node);
        }
        levels
    }

    /// Number of nesting levels.
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| self.depth_of(n) + 1)
            .max()
            .unwrap_or(0)
    }

    /// A line is hidden while any collapsed group contains it.
    pub fn is_hidden(&self, line: u32) -> bool {
        self.nodes
            .iter()
            .take_while(|n| n.start <= line)
            .any(|n| n.collapsed && n.contains_line(line))
    }

    /// Maximal `[start, end)` spans of hidden lines, in order.
    pub fn hidden_spans(&self) -> Vec<(u32, u32)> {
        let mut spans: Vec<(u32, u32)> = Vec::new();
        for node in self.nodes.iter().filter(|n| n.collapsed) {
            match spans.last_mut() {
                Some((_, end)) if node.start < *end => *end = (*end).max(node.end()),
                _ => spans.push((node.start, node.end())),
            }
        }
        spans
    }

    pub fn apply_shift(&mut self, op: &ShiftOperation) {
        debug_assert_eq!(op.axis(), self.axis);
        self.nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .filter_map(|node| {
                op.adjust_span(node.start, node.count)
                    .map(|(start, count)| OutlineNode {
                        start,
                        count,
                        collapsed: node.collapsed,
                    })
            })
            .collect();
        self.normalize();
    }

    /// Record the nodes that `op` followed by its inverse would not return
    /// unchanged: anything clipped or dropped, plus any node that such an
    /// image would collide with and be de-duplicated into.
    pub fn capture_shift(&self, op: &ShiftOperation) -> OutlinePatch {
        let inverse = op.inverse();
        let mut original = Vec::new();
        let mut images = Vec::new();
        for node in &self.nodes {
            let back = op
                .adjust_span(node.start, node.count)
                .and_then(|(start, count)| inverse.adjust_span(start, count));
            if back != Some((node.start, node.count)) {
                original.push(*node);
                images.extend(back);
            }
        }
        for node in &self.nodes {
            if images.contains(&(node.start, node.count)) && !original.contains(node) {
                original.push(*node);
            }
        }
        OutlinePatch {
            axis: self.axis,
            original,
            images,
        }
    }

    /// Put back what [`capture_shift`](Self::capture_shift) recorded, once
    /// the shift and its inverse have both run.
    pub fn apply_patch(&mut self, patch: &OutlinePatch) {
        debug_assert_eq!(patch.axis, self.axis);
        if patch.is_empty() {
            return;
        }
        self.nodes
            .retain(|n| !patch.images.contains(&(n.start, n.count)));
        self.nodes.extend(patch.original.iter().copied());
        self.normalize();
    }

    pub fn assert_invariants(&self) {
        for pair in self.nodes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                (a.start, std::cmp::Reverse(a.count)) < (b.start, std::cmp::Reverse(b.count)),
                "{} outlines out of order or duplicated: {a:?}, {b:?}",
                self.axis
            );
        }
        for (i, a) in self.nodes.iter().enumerate() {
            assert!(a.count > 0, "{} outline {a:?} is empty", self.axis);
            for b in &self.nodes[i + 1..] {
                let nested = a.encloses(b.start, b.count) || b.encloses(a.start, a.count);
                assert!(
                    !a.overlaps(b.start, b.count) || nested,
                    "{} outlines {a:?} and {b:?} partially overlap",
                    self.axis
                );
            }
        }
    }

    fn depth_of(&self, node: &OutlineNode) -> usize {
        self.nodes
            .iter()
            .filter(|n| !n.same_interval(node.start, node.count) && n.encloses(node.start, node.count))
            .count()
    }

    fn find(&self, start: u32, count: u32) -> Result<usize, GridError> {
        self.nodes
            .iter()
            .position(|n| n.same_interval(start, count))
            .ok_or(GridError::OutlineNotFound {
                axis: self.axis,
                start,
                count,
            })
    }

    fn check_bounds(&self, start: u32, count: u32) -> Result<(), GridError> {
        let limit = self.axis.limit();
        if count == 0 {
            return Err(GridError::InvalidRange {
                reason: format!("{} outline at {start} has no lines", self.axis),
            });
        }
        let end = start as u64 + count as u64;
        if end > limit as u64 {
            return Err(GridError::OutOfBounds {
                axis: self.axis,
                index: end - 1,
                limit,
            });
        }
        Ok(())
    }

    /// Sort parents first and drop intervals made identical by a delete.
    fn normalize(&mut self) {
        self.nodes
            .sort_by_key(|n| (n.start, std::cmp::Reverse(n.count)));
        self.nodes
            .dedup_by(|later, earlier| earlier.same_interval(later.start, later.count));
    }
}

/// Outline groups for both axes of a sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineForest {
    rows: OutlineAxis,
    cols: OutlineAxis,
}

impl Default for OutlineForest {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineForest {
    pub fn new() -> Self {
        Self {
            rows: OutlineAxis::new(Axis::Row),
            cols: OutlineAxis::new(Axis::Column),
        }
    }

    pub fn axis(&self, axis: Axis) -> &OutlineAxis {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.cols,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut OutlineAxis {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        }
    }

    pub fn add_outline(&mut self, axis: Axis, start: u32, count: u32) -> Result<(), GridError> {
        self.axis_mut(axis).add(start, count)
    }

    pub fn remove_outline(
        &mut self,
        axis: Axis,
        start: u32,
        count: u32,
    ) -> Result<OutlineNode, GridError> {
        self.axis_mut(axis).remove(start, count)
    }

    pub fn collapse(&mut self, axis: Axis, start: u32, count: u32) -> Result<bool, GridError> {
        self.axis_mut(axis).collapse(start, count)
    }

    pub fn expand(&mut self, axis: Axis, start: u32, count: u32) -> Result<bool, GridError> {
        self.axis_mut(axis).expand(start, count)
    }

    pub fn get_outlines(&self, axis: Axis) -> Vec<Vec<OutlineNode>> {
        self.axis(axis).get_outlines()
    }

    pub fn is_hidden(&self, axis: Axis, line: u32) -> bool {
        self.axis(axis).is_hidden(line)
    }

    pub fn capture_shift(&self, op: &ShiftOperation) -> OutlinePatch {
        self.axis(op.axis()).capture_shift(op)
    }

    pub fn apply_patch(&mut self, patch: &OutlinePatch) {
        self.axis_mut(patch.axis).apply_patch(patch);
    }

    pub fn apply_shift(&mut self, op: &ShiftOperation) {
        self.axis_mut(op.axis()).apply_shift(op);
    }

    pub fn assert_invariants(&self) {
        self.rows.assert_invariants();
        self.cols.assert_invariants();
    }
}
