//! Centralized interval adjustment for structural edits.
//!
//! Every structure that tracks intervals along an axis (border runs, merged
//! regions, outlines, named ranges, line headers) shifts them with the same
//! straddle rules, defined once here:
//!
//! * insert `count` lines before `before`: spans starting at or after `before`
//!   move up by `count`; spans straddling `before` grow by `count`.
//! * delete `count` lines at `start`: spans inside the window disappear; spans
//!   straddling it shrink by the overlap; spans after it move down by `count`.

use sheetcore_common::{Axis, Extent, RangePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOperation {
    Insert { axis: Axis, before: u32, count: u32 },
    Delete { axis: Axis, start: u32, count: u32 },
}

impl ShiftOperation {
    pub fn insert(axis: Axis, before: u32, count: u32) -> Self {
        ShiftOperation::Insert {
            axis,
            before,
            count,
        }
    }

    pub fn delete(axis: Axis, start: u32, count: u32) -> Self {
        ShiftOperation::Delete { axis, start, count }
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        match self {
            ShiftOperation::Insert { axis, .. } | ShiftOperation::Delete { axis, .. } => *axis,
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        match self {
            ShiftOperation::Insert { before, .. } => *before,
            ShiftOperation::Delete { start, .. } => *start,
        }
    }

    #[inline]
    pub fn count(&self) -> u32 {
        match self {
            ShiftOperation::Insert { count, .. } | ShiftOperation::Delete { count, .. } => *count,
        }
    }

    /// The operation that undoes this one's line movement.
    pub fn inverse(&self) -> ShiftOperation {
        match *self {
            ShiftOperation::Insert {
                axis,
                before,
                count,
            } => ShiftOperation::delete(axis, before, count),
            ShiftOperation::Delete { axis, start, count } => {
                ShiftOperation::insert(axis, start, count)
            }
        }
    }

    /// Adjust a single line index. Returns `None` if the line is deleted.
    pub fn adjust_line(&self, line: u32) -> Option<u32> {
        match *self {
            ShiftOperation::Insert { before, count, .. } => {
                if line >= before {
                    line.checked_add(count)
                        .filter(|l| *l < self.axis().limit())
                } else {
                    Some(line)
                }
            }
            ShiftOperation::Delete { start, count, .. } => {
                let end = start as u64 + count as u64;
                if line < start {
                    Some(line)
                } else if (line as u64) < end {
                    None
                } else {
                    Some(line - count)
                }
            }
        }
    }

    /// Adjust the span `[start, start + len)`. Returns `None` if it vanishes.
    ///
    /// Spans pushed past the end of the axis are clipped to it.
    pub fn adjust_span(&self, start: u32, len: u32) -> Option<(u32, u32)> {
        debug_assert!(len > 0);
        let span_end = start as u64 + len as u64;
        match *self {
            ShiftOperation::Insert { before, count, .. } => {
                let limit = self.axis().limit() as u64;
                let (new_start, new_end) = if before <= start {
                    (start as u64 + count as u64, span_end + count as u64)
                } else if (before as u64) < span_end {
                    (start as u64, span_end + count as u64)
                } else {
                    (start as u64, span_end)
                };
                if new_start >= limit {
                    return None;
                }
                Some((new_start as u32, (new_end.min(limit) - new_start) as u32))
            }
            ShiftOperation::Delete {
                start: del_start,
                count,
                ..
            } => {
                let del_end = del_start as u64 + count as u64;
                if del_end <= start as u64 {
                    return Some((start - count, len));
                }
                if del_start as u64 >= span_end {
                    return Some((start, len));
                }
                let overlap = span_end.min(del_end) - (start as u64).max(del_start as u64);
                if overlap >= len as u64 {
                    return None;
                }
                Some((start.min(del_start), len - overlap as u32))
            }
        }
    }

    /// Adjust a range along this operation's axis. Unbounded spans never move.
    pub fn adjust_range(&self, range: &RangePosition) -> Option<RangePosition> {
        let axis = self.axis();
        match range.extent(axis) {
            Extent::Entire => Some(*range),
            Extent::Lines(len) => {
                let (start, len) = self.adjust_span(range.start(axis), len)?;
                range.with_span(axis, start, len).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_shifts_and_grows() {
        let op = ShiftOperation::insert(Axis::Row, 5, 2);
        assert_eq!(op.adjust_span(0, 5), Some((0, 5)), "ends at the insert point");
        assert_eq!(op.adjust_span(3, 4), Some((3, 6)), "straddles");
        assert_eq!(op.adjust_span(5, 3), Some((7, 3)), "starts at the insert point");
        assert_eq!(op.adjust_line(4), Some(4));
        assert_eq!(op.adjust_line(5), Some(7));
    }

    #[test]
    fn delete_clips_and_removes() {
        let op = ShiftOperation::delete(Axis::Column, 3, 3);
        assert_eq!(op.adjust_span(1, 10), Some((1, 7)));
        assert_eq!(op.adjust_span(3, 3), None);
        assert_eq!(op.adjust_span(4, 5), Some((3, 3)), "starts inside the window");
        assert_eq!(op.adjust_span(0, 4), Some((0, 3)), "ends inside the window");
        assert_eq!(op.adjust_span(8, 2), Some((5, 2)));
        assert_eq!(op.adjust_span(0, 3), Some((0, 3)));
        assert_eq!(op.adjust_line(4), None);
        assert_eq!(op.adjust_line(6), Some(3));
    }

    #[test]
    fn insert_then_delete_restores_spans() {
        let insert = ShiftOperation::insert(Axis::Row, 6, 4);
        let delete = insert.inverse();
        for (start, len) in [(0, 3), (2, 9), (6, 1), (7, 4), (0, 6)] {
            let (s, l) = insert.adjust_span(start, len).unwrap();
            assert_eq!(delete.adjust_span(s, l), Some((start, len)));
        }
    }

    #[test]
    fn insert_clips_at_axis_limit() {
        let limit = Axis::Row.limit();
        let op = ShiftOperation::insert(Axis::Row, 0, 10);
        assert_eq!(op.adjust_span(limit - 5, 5), None);
        assert_eq!(op.adjust_span(limit - 20, 15), Some((limit - 10, 10)));
        assert_eq!(op.adjust_line(limit - 1), None);
    }

    #[test]
    fn ranges_keep_unbounded_spans() {
        let whole_rows = RangePosition::entire_rows(2, 3).unwrap();
        let op = ShiftOperation::insert(Axis::Column, 0, 4);
        assert_eq!(op.adjust_range(&whole_rows), Some(whole_rows));
        let named = RangePosition::from_a1("C8:E11").unwrap();
        let shifted = ShiftOperation::insert(Axis::Row, 6, 2)
            .adjust_range(&named)
            .unwrap();
        assert_eq!(shifted.to_string(), "C10:E13");
    }
}
