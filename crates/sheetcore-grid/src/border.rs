//! Cell borders stored as run-length spans.
//!
//! Borders live in four independent edge indices. Top and Bottom edges are
//! keyed by row and their runs extend along columns; Left and Right edges are
//! keyed by column and their runs extend along rows. Each line holds a sorted
//! list of non-overlapping runs, and adjacent runs never share a style.
//!
//! Ranges handed to this module are expected to be bounded; the worksheet clips
//! whole-row/whole-column requests to the sheet extent first.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use sheetcore_common::{Axis, MAX_COLS, MAX_ROWS, RangePosition};

use crate::shift::ShiftOperation;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineStyle {
    Hair,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

/// Line style plus a 0xRRGGBB colour.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BorderStyle {
    pub line: LineStyle,
    pub color: u32,
}

impl BorderStyle {
    pub const THIN_BLACK: BorderStyle = BorderStyle {
        line: LineStyle::Thin,
        color: 0x000000,
    };

    pub const fn new(line: LineStyle, color: u32) -> Self {
        Self { line, color }
    }
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self::THIN_BLACK
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BorderEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl BorderEdge {
    pub const ALL: [BorderEdge; 4] = [
        BorderEdge::Top,
        BorderEdge::Bottom,
        BorderEdge::Left,
        BorderEdge::Right,
    ];

    /// Axis the edge's lines are keyed by.
    #[inline]
    pub const fn line_axis(self) -> Axis {
        match self {
            BorderEdge::Top | BorderEdge::Bottom => Axis::Row,
            BorderEdge::Left | BorderEdge::Right => Axis::Column,
        }
    }

    /// Axis the edge's runs extend along.
    #[inline]
    pub const fn run_axis(self) -> Axis {
        self.line_axis().other()
    }

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

bitflags::bitflags! {
    /// Which edges of a range a border operation touches.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EdgeMask: u8 {
        const TOP = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        /// Horizontal lines between the rows of the range.
        const INSIDE_HORIZONTAL = 1 << 4;
        /// Vertical lines between the columns of the range.
        const INSIDE_VERTICAL = 1 << 5;

        const OUTSIDE = Self::TOP.bits() | Self::BOTTOM.bits() | Self::LEFT.bits() | Self::RIGHT.bits();
        const INSIDE = Self::INSIDE_HORIZONTAL.bits() | Self::INSIDE_VERTICAL.bits();
        const ALL = Self::OUTSIDE.bits() | Self::INSIDE.bits();
    }
}

/// A maximal stretch of one style on one line: `[start, start + len)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BorderRun {
    pub start: u32,
    pub len: u32,
    pub style: BorderStyle,
}

impl BorderRun {
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.len
    }
}

type Runs = SmallVec<[BorderRun; 4]>;

/// Per-edge summary returned by [`BorderSpanIndex::get_borders`].
///
/// A field is `Some` when every cell of that edge carries the same style. It is
/// `None` both when the edge is bare and when it is mixed; mixed edges are also
/// flagged in `non_uniform`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderInfoSet {
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
    pub inside_horizontal: Option<BorderStyle>,
    pub inside_vertical: Option<BorderStyle>,
    pub non_uniform: EdgeMask,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Coverage {
    Empty,
    Uniform(BorderStyle),
    Mixed,
}

impl Coverage {
    fn combine(self, other: Coverage) -> Coverage {
        match (self, other) {
            (Coverage::Mixed, _) | (_, Coverage::Mixed) => Coverage::Mixed,
            (a, b) if a == b => a,
            _ => Coverage::Mixed,
        }
    }
}

/// One touched span of one line plus the runs it held.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PatchEntry {
    edge: BorderEdge,
    line: u32,
    start: u32,
    end: u32,
    runs: Runs,
}

/// Snapshot of the border runs inside a set of spans, used to undo edits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderPatch {
    entries: Vec<PatchEntry>,
}

impl BorderPatch {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// All four edge indices of a sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BorderSpanIndex {
    edges: [BTreeMap<u32, Runs>; 4],
}

impl BorderSpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.iter().all(BTreeMap::is_empty)
    }

    /// Runs on one line of one edge, in ascending order.
    pub fn runs(&self, edge: BorderEdge, line: u32) -> &[BorderRun] {
        self.edges[edge.slot()]
            .get(&line)
            .map(|runs| runs.as_slice())
            .unwrap_or(&[])
    }

    /// Lines of `edge` that carry at least one run.
    pub fn lines(&self, edge: BorderEdge) -> impl Iterator<Item = (u32, &[BorderRun])> + '_ {
        self.edges[edge.slot()]
            .iter()
            .map(|(line, runs)| (*line, runs.as_slice()))
    }

    /// Style of the edge of a single cell, if any.
    pub fn style_at(&self, edge: BorderEdge, line: u32, offset: u32) -> Option<BorderStyle> {
        self.runs(edge, line)
            .iter()
            .find(|run| run.start <= offset && offset < run.end())
            .map(|run| run.style)
    }

    pub fn set_border(&mut self, range: &RangePosition, mask: EdgeMask, style: BorderStyle) {
        for (edge, line, start, end) in touched_spans(range, mask) {
            self.write_span(edge, line, start, end, Some(style));
        }
    }

    pub fn remove_border(&mut self, range: &RangePosition, mask: EdgeMask) {
        for (edge, line, start, end) in touched_spans(range, mask) {
            self.write_span(edge, line, start, end, None);
        }
    }

    /// Summarise the borders of `range`, edge direction by edge direction.
    pub fn get_borders(&self, range: &RangePosition) -> BorderInfoSet {
        let (r0, r1) = (range.row(), range.last_row(MAX_ROWS));
        let (c0, c1) = (range.col(), range.last_col(MAX_COLS));
        let mut info = BorderInfoSet::default();

        let mut record = |mask: EdgeMask, coverage: Coverage| -> Option<BorderStyle> {
            match coverage {
                Coverage::Uniform(style) => Some(style),
                Coverage::Mixed => {
                    info.non_uniform |= mask;
                    None
                }
                Coverage::Empty => None,
            }
        };

        let top = self.coverage(BorderEdge::Top, r0..=r0, c0, c1 + 1);
        let bottom = self.coverage(BorderEdge::Bottom, r1..=r1, c0, c1 + 1);
        let left = self.coverage(BorderEdge::Left, c0..=c0, r0, r1 + 1);
        let right = self.coverage(BorderEdge::Right, c1..=c1, r0, r1 + 1);
        let inside_h = if r1 > r0 {
            self.coverage(BorderEdge::Bottom, r0..=r1 - 1, c0, c1 + 1)
        } else {
            Coverage::Empty
        };
        let inside_v = if c1 > c0 {
            self.coverage(BorderEdge::Right, c0..=c1 - 1, r0, r1 + 1)
        } else {
            Coverage::Empty
        };

        let top = record(EdgeMask::TOP, top);
        let bottom = record(EdgeMask::BOTTOM, bottom);
        let left = record(EdgeMask::LEFT, left);
        let right = record(EdgeMask::RIGHT, right);
        let inside_horizontal = record(EdgeMask::INSIDE_HORIZONTAL, inside_h);
        let inside_vertical = record(EdgeMask::INSIDE_VERTICAL, inside_v);
        info.top = top;
        info.bottom = bottom;
        info.left = left;
        info.right = right;
        info.inside_horizontal = inside_horizontal;
        info.inside_vertical = inside_vertical;
        info
    }

    fn coverage(
        &self,
        edge: BorderEdge,
        lines: std::ops::RangeInclusive<u32>,
        start: u32,
        end: u32,
    ) -> Coverage {
        let mut acc: Option<Coverage> = None;
        for line in lines {
            let cov = line_coverage(self.runs(edge, line), start, end);
            acc = Some(match acc {
                Some(prev) => prev.combine(cov),
                None => cov,
            });
            if acc == Some(Coverage::Mixed) {
                break;
            }
        }
        acc.unwrap_or(Coverage::Empty)
    }

    /// Replace `[start, end)` on one line with `style`, or erase it for `None`.
    ///
    /// Straddling runs are split, the span is rewritten, and adjacent runs of
    /// equal style are re-merged.
    fn write_span(
        &mut self,
        edge: BorderEdge,
        line: u32,
        start: u32,
        end: u32,
        style: Option<BorderStyle>,
    ) {
        if start >= end {
            return;
        }
        let map = &mut self.edges[edge.slot()];
        let old = map.remove(&line).unwrap_or_default();
        let mut out: Runs = SmallVec::new();
        for run in old {
            let run_end = run.end();
            if run_end <= start || run.start >= end {
                out.push(run);
                continue;
            }
            if run.start < start {
                out.push(BorderRun {
                    start: run.start,
                    len: start - run.start,
                    style: run.style,
                });
            }
            if run_end > end {
                out.push(BorderRun {
                    start: end,
                    len: run_end - end,
                    style: run.style,
                });
            }
        }
        if let Some(style) = style {
            out.push(BorderRun {
                start,
                len: end - start,
                style,
            });
        }
        out.sort_by_key(|run| run.start);
        coalesce(&mut out);
        if !out.is_empty() {
            map.insert(line, out);
        }
    }

    /// Capture what a border write over `range`/`mask` would overwrite.
    pub fn capture(&self, range: &RangePosition, mask: EdgeMask) -> BorderPatch {
        let entries = touched_spans(range, mask)
            .into_iter()
            .map(|(edge, line, start, end)| PatchEntry {
                edge,
                line,
                start,
                end,
                runs: clip_runs(self.runs(edge, line), start, end),
            })
            .collect();
        BorderPatch { entries }
    }

    /// Capture everything a structural delete will drop or clip, so that
    /// re-inserting the lines and applying the patch restores the runs exactly.
    pub fn capture_delete(&self, axis: Axis, start: u32, count: u32) -> BorderPatch {
        let end = start.saturating_add(count);
        let mut entries = Vec::new();
        for edge in BorderEdge::ALL {
            let map = &self.edges[edge.slot()];
            if edge.line_axis() == axis {
                for (line, runs) in map.range(start..end) {
                    entries.push(PatchEntry {
                        edge,
                        line: *line,
                        start: 0,
                        end: edge.run_axis().limit(),
                        runs: runs.clone(),
                    });
                }
            } else {
                // Lines whose runs touch the window can be clipped or
                // coalesced across it.
                for (line, runs) in map {
                    let touches = runs
                        .iter()
                        .any(|run| run.start <= end && run.end() >= start);
                    if touches {
                        entries.push(PatchEntry {
                            edge,
                            line: *line,
                            start,
                            end,
                            runs: clip_runs(runs, start, end),
                        });
                    }
                }
            }
        }
        BorderPatch { entries }
    }

    /// Clear every captured span and re-write the runs it held.
    pub fn apply_patch(&mut self, patch: &BorderPatch) {
        for entry in patch.entries.iter().rev() {
            self.write_span(entry.edge, entry.line, entry.start, entry.end, None);
            for run in &entry.runs {
                self.write_span(entry.edge, entry.line, run.start, run.end(), Some(run.style));
            }
        }
    }

    /// Shift, clip or drop runs and lines for a structural edit.
    pub fn apply_shift(&mut self, op: &ShiftOperation) {
        for edge in BorderEdge::ALL {
            let map = &mut self.edges[edge.slot()];
            let old = std::mem::take(map);
            if edge.line_axis() == op.axis() {
                for (line, runs) in old {
                    if let Some(new_line) = op.adjust_line(line) {
                        map.insert(new_line, runs);
                    }
                }
            } else {
                for (line, runs) in old {
                    let mut shifted: Runs = runs
                        .into_iter()
                        .filter_map(|run| {
                            op.adjust_span(run.start, run.len)
                                .map(|(start, len)| BorderRun {
                                    start,
                                    len,
                                    style: run.style,
                                })
                        })
                        .collect();
                    coalesce(&mut shifted);
                    if !shifted.is_empty() {
                        map.insert(line, shifted);
                    }
                }
            }
        }
    }

    /// Panics if any line is empty, unsorted, overlapping or not coalesced.
    pub fn assert_invariants(&self) {
        for edge in BorderEdge::ALL {
            for (line, runs) in &self.edges[edge.slot()] {
                assert!(!runs.is_empty(), "{edge:?} line {line} is empty but stored");
                for run in runs {
                    assert!(run.len > 0, "{edge:?} line {line} has an empty run");
                }
                for pair in runs.windows(2) {
                    assert!(
                        pair[0].end() <= pair[1].start,
                        "{edge:?} line {line}: runs {:?} and {:?} overlap",
                        pair[0],
                        pair[1]
                    );
                    assert!(
                        !(pair[0].end() == pair[1].start && pair[0].style == pair[1].style),
                        "{edge:?} line {line}: adjacent runs {:?} and {:?} share a style",
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }
}

/// Every `(edge, line, start, end)` span a border write over `range` touches.
fn touched_spans(range: &RangePosition, mask: EdgeMask) -> Vec<(BorderEdge, u32, u32, u32)> {
    let (r0, r1) = (range.row(), range.last_row(MAX_ROWS));
    let (c0, c1) = (range.col(), range.last_col(MAX_COLS));
    let mut spans = Vec::new();
    if mask.contains(EdgeMask::TOP) {
        spans.push((BorderEdge::Top, r0, c0, c1 + 1));
    }
    if mask.contains(EdgeMask::BOTTOM) {
        spans.push((BorderEdge::Bottom, r1, c0, c1 + 1));
    }
    if mask.contains(EdgeMask::LEFT) {
        spans.push((BorderEdge::Left, c0, r0, r1 + 1));
    }
    if mask.contains(EdgeMask::RIGHT) {
        spans.push((BorderEdge::Right, c1, r0, r1 + 1));
    }
    if mask.contains(EdgeMask::INSIDE_HORIZONTAL) {
        for r in r0..r1 {
            spans.push((BorderEdge::Bottom, r, c0, c1 + 1));
            spans.push((BorderEdge::Top, r + 1, c0, c1 + 1));
        }
    }
    if mask.contains(EdgeMask::INSIDE_VERTICAL) {
        for c in c0..c1 {
            spans.push((BorderEdge::Right, c, r0, r1 + 1));
            spans.push((BorderEdge::Left, c + 1, r0, r1 + 1));
        }
    }
    spans
}

fn coalesce(runs: &mut Runs) {
    let mut out: Runs = SmallVec::with_capacity(runs.len());
    for run in runs.drain(..) {
        match out.last_mut() {
            Some(prev) if prev.end() == run.start && prev.style == run.style => {
                prev.len += run.len;
            }
            _ => out.push(run),
        }
    }
    *runs = out;
}

fn clip_runs(runs: &[BorderRun], start: u32, end: u32) -> Runs {
    runs.iter()
        .filter(|run| run.end() > start && run.start < end)
        .map(|run| {
            let s = run.start.max(start);
            let e = run.end().min(end);
            BorderRun {
                start: s,
                len: e - s,
                style: run.style,
            }
        })
        .collect()
}

fn line_coverage(runs: &[BorderRun], start: u32, end: u32) -> Coverage {
    let clipped = clip_runs(runs, start, end);
    if clipped.is_empty() {
        return Coverage::Empty;
    }
    let covered: u32 = clipped.iter().map(|run| run.len).sum();
    if covered == end - start && clipped.len() == 1 {
        Coverage::Uniform(clipped[0].style)
    } else {
        Coverage::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHED_RED: BorderStyle = BorderStyle::new(LineStyle::Dashed, 0xFF0000);

    fn range(a1: &str) -> RangePosition {
        RangePosition::from_a1(a1).unwrap()
    }

    fn spans(index: &BorderSpanIndex, edge: BorderEdge, line: u32) -> Vec<(u32, u32)> {
        index
            .runs(edge, line)
            .iter()
            .map(|r| (r.start, r.len))
            .collect()
    }

    #[test]
    fn outside_border_writes_four_edges() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("B2:D4"), EdgeMask::OUTSIDE, BorderStyle::THIN_BLACK);
        assert_eq!(spans(&index, BorderEdge::Top, 1), vec![(1, 3)]);
        assert_eq!(spans(&index, BorderEdge::Bottom, 3), vec![(1, 3)]);
        assert_eq!(spans(&index, BorderEdge::Left, 1), vec![(1, 3)]);
        assert_eq!(spans(&index, BorderEdge::Right, 3), vec![(1, 3)]);
        assert!(index.runs(BorderEdge::Top, 2).is_empty());
        index.assert_invariants();
    }

    #[test]
    fn inside_lines_write_both_neighbours() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("A1:B3"), EdgeMask::INSIDE, BorderStyle::THIN_BLACK);
        assert_eq!(spans(&index, BorderEdge::Bottom, 0), vec![(0, 2)]);
        assert_eq!(spans(&index, BorderEdge::Bottom, 1), vec![(0, 2)]);
        assert!(index.runs(BorderEdge::Bottom, 2).is_empty());
        assert_eq!(spans(&index, BorderEdge::Top, 1), vec![(0, 2)]);
        assert_eq!(spans(&index, BorderEdge::Top, 2), vec![(0, 2)]);
        assert_eq!(spans(&index, BorderEdge::Right, 0), vec![(0, 3)]);
        assert_eq!(spans(&index, BorderEdge::Left, 1), vec![(0, 3)]);
    }

    #[test]
    fn writes_split_and_recoalesce() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("A1:J1"), EdgeMask::TOP, BorderStyle::THIN_BLACK);
        index.set_border(&range("D1:E1"), EdgeMask::TOP, DASHED_RED);
        assert_eq!(spans(&index, BorderEdge::Top, 0), vec![(0, 3), (3, 2), (5, 5)]);
        index.assert_invariants();

        index.set_border(&range("D1:E1"), EdgeMask::TOP, BorderStyle::THIN_BLACK);
        assert_eq!(spans(&index, BorderEdge::Top, 0), vec![(0, 10)]);

        index.remove_border(&range("C1:C1"), EdgeMask::TOP);
        assert_eq!(spans(&index, BorderEdge::Top, 0), vec![(0, 2), (3, 7)]);
        index.remove_border(&range("A1:J1"), EdgeMask::TOP);
        assert!(index.is_empty());
    }

    #[test]
    fn get_borders_reports_uniform_and_mixed() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("B2:D4"), EdgeMask::ALL, BorderStyle::THIN_BLACK);
        index.set_border(&range("C3"), EdgeMask::RIGHT, DASHED_RED);

        let info = index.get_borders(&range("B2:D4"));
        assert_eq!(info.top, Some(BorderStyle::THIN_BLACK));
        assert_eq!(info.left, Some(BorderStyle::THIN_BLACK));
        assert_eq!(info.inside_horizontal, Some(BorderStyle::THIN_BLACK));
        assert_eq!(info.inside_vertical, None);
        assert_eq!(info.non_uniform, EdgeMask::INSIDE_VERTICAL);

        let bare = index.get_borders(&range("H8:J9"));
        assert_eq!(bare, BorderInfoSet::default());
    }

    #[test]
    fn delete_clips_and_merges_across_boundary() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("A1:C1"), EdgeMask::TOP, BorderStyle::THIN_BLACK);
        index.set_border(&range("D1:E1"), EdgeMask::TOP, DASHED_RED);
        index.set_border(&range("F1:H1"), EdgeMask::TOP, BorderStyle::THIN_BLACK);
        index.apply_shift(&ShiftOperation::delete(Axis::Column, 3, 2));
        assert_eq!(spans(&index, BorderEdge::Top, 0), vec![(0, 6)]);
        index.assert_invariants();
    }

    #[test]
    fn insert_widens_straddling_runs_and_shifts_lines() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("B2:B6"), EdgeMask::LEFT | EdgeMask::TOP, BorderStyle::THIN_BLACK);
        index.apply_shift(&ShiftOperation::insert(Axis::Row, 3, 2));
        assert_eq!(spans(&index, BorderEdge::Left, 1), vec![(1, 7)]);
        assert_eq!(spans(&index, BorderEdge::Top, 1), vec![(1, 1)]);

        index.apply_shift(&ShiftOperation::insert(Axis::Row, 0, 1));
        assert_eq!(spans(&index, BorderEdge::Top, 2), vec![(1, 1)]);
        assert!(index.runs(BorderEdge::Top, 1).is_empty());
    }

    #[test]
    fn patch_restores_a_delete() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("A1:A3"), EdgeMask::LEFT, BorderStyle::THIN_BLACK);
        index.set_border(&range("A8:A9"), EdgeMask::LEFT, BorderStyle::THIN_BLACK);
        index.set_border(&range("A4:E6"), EdgeMask::ALL, DASHED_RED);
        let before = index.clone();

        let op = ShiftOperation::delete(Axis::Row, 3, 4);
        let patch = index.capture_delete(Axis::Row, 3, 4);
        index.apply_shift(&op);
        assert_eq!(spans(&index, BorderEdge::Left, 0), vec![(0, 5)], "re-merged across the gap");

        index.apply_shift(&op.inverse());
        index.apply_patch(&patch);
        assert_eq!(index, before);
        index.assert_invariants();
    }

    #[test]
    fn patch_restores_a_write() {
        let mut index = BorderSpanIndex::new();
        index.set_border(&range("A1:F1"), EdgeMask::TOP, BorderStyle::THIN_BLACK);
        let before = index.clone();
        let target = range("C1:H2");
        let patch = index.capture(&target, EdgeMask::ALL);
        index.set_border(&target, EdgeMask::ALL, DASHED_RED);
        index.apply_patch(&patch);
        assert_eq!(index, before);
    }
}
