//! Disjoint merged regions.
//!
//! Regions are keyed by their anchor (top-left cell). A row-interval index
//! answers "which regions touch these rows" without scanning every region.

use rustc_hash::FxHashMap;

use sheetcore_common::{CellPosition, GridError, MAX_ROWS, RangePosition};

use crate::interval_tree::IntervalTree;
use crate::shift::ShiftOperation;

/// Regions dropped or moved by a structural edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeShift {
    /// Regions deleted outright or collapsed to a single cell.
    pub removed: Vec<RangePosition>,
    /// `(before, after)` for every surviving region whose geometry changed.
    pub changed: Vec<(RangePosition, RangePosition)>,
}

impl MergeShift {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.changed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergedRangeSet {
    regions: FxHashMap<CellPosition, RangePosition>,
    row_index: IntervalTree<CellPosition>,
}

impl MergedRangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions, ordered by anchor.
    pub fn regions(&self) -> Vec<RangePosition> {
        let mut out: Vec<RangePosition> = self.regions.values().copied().collect();
        out.sort_by_key(|r| r.top_left());
        out
    }

    /// Regions intersecting `range`, ordered by anchor.
    pub fn regions_in(&self, range: &RangePosition) -> Vec<RangePosition> {
        let (r0, r1) = (range.row(), range.last_row(MAX_ROWS));
        let mut out: Vec<RangePosition> = self
            .row_index
            .query(r0, r1)
            .filter_map(|anchor| self.regions.get(anchor))
            .filter(|region| region.intersects(range))
            .copied()
            .collect();
        out.sort_by_key(|r| r.top_left());
        out
    }

    /// The merged region covering `pos`, if any.
    pub fn region_at(&self, pos: CellPosition) -> Option<RangePosition> {
        self.row_index
            .stab(pos.row())
            .filter_map(|anchor| self.regions.get(anchor))
            .find(|region| region.contains(pos))
            .copied()
    }

    /// The merged region covering `pos`, or the 1×1 range at `pos`.
    pub fn region_containing(&self, pos: CellPosition) -> RangePosition {
        self.region_at(pos)
            .unwrap_or_else(|| RangePosition::cell(pos))
    }

    pub fn is_merged_anchor(&self, pos: CellPosition) -> bool {
        self.regions.contains_key(&pos)
    }

    /// True for every cell of a merged region, anchor included.
    pub fn is_merged_cell(&self, pos: CellPosition) -> bool {
        self.region_at(pos).is_some()
    }

    /// Merge `range`. Returns `Ok(false)` when nothing changed (the region
    /// already exists, or `range` is a single cell).
    pub fn merge(&mut self, range: RangePosition) -> Result<bool, GridError> {
        if !range.is_bounded() {
            return Err(GridError::InvalidRange {
                reason: format!("merged region {range} must be bounded"),
            });
        }
        if range.is_single_cell() {
            return Ok(false);
        }
        if let Some(existing) = self.regions_in(&range).into_iter().next() {
            if existing == range {
                return Ok(false);
            }
            return Err(GridError::IntersectedMerge {
                requested: range,
                existing,
            });
        }
        self.insert_region(range);
        Ok(true)
    }

    /// Remove every region intersecting `range`, returning them ordered by anchor.
    pub fn unmerge(&mut self, range: &RangePosition) -> Vec<RangePosition> {
        let hit = self.regions_in(range);
        for region in &hit {
            self.remove_region(region);
        }
        hit
    }

    /// Remove exactly `region`. Returns false if it was not present.
    pub fn remove_region(&mut self, region: &RangePosition) -> bool {
        let anchor = region.top_left();
        match self.regions.get(&anchor) {
            Some(existing) if existing == region => {}
            _ => return false,
        }
        self.regions.remove(&anchor);
        let (r0, r1) = row_span(region);
        self.row_index.remove(r0, r1, &anchor);
        true
    }

    /// Re-insert regions captured for undo. They must not intersect anything.
    pub(crate) fn restore<I>(&mut self, regions: I)
    where
        I: IntoIterator<Item = RangePosition>,
    {
        for region in regions {
            debug_assert!(self.regions_in(&region).is_empty());
            self.insert_region(region);
        }
    }

    fn insert_region(&mut self, region: RangePosition) {
        let anchor = region.top_left();
        let (r0, r1) = row_span(&region);
        self.regions.insert(anchor, region);
        self.row_index.insert(r0, r1, anchor);
    }

    /// Re-map every region through a structural edit.
    ///
    /// Regions wholly inside a deleted window, or clipped down to one cell,
    /// are dropped (auto-unmerge).
    pub fn apply_shift(&mut self, op: &ShiftOperation) -> MergeShift {
        let mut report = MergeShift::default();
        let old = std::mem::take(&mut self.regions);
        let mut next = FxHashMap::default();
        next.reserve(old.len());
        for region in old.into_values() {
            match op.adjust_range(&region) {
                Some(moved) if !moved.is_single_cell() => {
                    if moved != region {
                        report.changed.push((region, moved));
                    }
                    next.insert(moved.top_left(), moved);
                }
                _ => report.removed.push(region),
            }
        }
        self.regions = next;
        self.rebuild_index();
        report.removed.sort_by_key(|r| r.top_left());
        report.changed.sort_by_key(|(before, _)| before.top_left());
        report
    }

    fn rebuild_index(&mut self) {
        let items = self.regions.iter().map(|(anchor, region)| {
            let (r0, r1) = row_span(region);
            (r0, r1, *anchor)
        });
        let mut index = IntervalTree::new();
        index.rebuild(items);
        self.row_index = index;
    }

    /// Panics if two regions intersect, a region is a single cell, or the
    /// row index disagrees with the region map.
    pub fn assert_invariants(&self) {
        let all = self.regions();
        for (i, a) in all.iter().enumerate() {
            assert!(a.is_bounded(), "merged region {a} is unbounded");
            assert!(!a.is_single_cell(), "merged region {a} is a single cell");
            for b in &all[i + 1..] {
                assert!(!a.intersects(b), "merged regions {a} and {b} intersect");
            }
        }
        assert_eq!(self.row_index.len(), self.regions.len(), "row index out of sync");
        for (anchor, region) in &self.regions {
            assert_eq!(*anchor, region.top_left());
            assert!(
                self.row_index.stab(region.row()).any(|a| a == anchor),
                "region {region} missing from the row index"
            );
        }
    }
}

fn row_span(region: &RangePosition) -> (u32, u32) {
    (region.row(), region.last_row(MAX_ROWS))
}
