use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coord::{Axis, CellPosition, column_to_letters};
use crate::error::GridError;

/// Number of lines a range spans along one axis.
///
/// `Entire` is the "whole column" (row extent) or "whole row" (column extent)
/// span; it always starts at line 0 and never shifts during structural edits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Extent {
    Lines(u32),
    Entire,
}

impl Extent {
    #[inline]
    pub const fn is_entire(self) -> bool {
        matches!(self, Extent::Entire)
    }

    /// Line count when the extent is resolved against `limit` lines.
    #[inline]
    pub fn count_within(self, limit: u32) -> u32 {
        match self {
            Extent::Lines(n) => n,
            Extent::Entire => limit,
        }
    }
}

/// Rectangular block of cells: a top-left position plus a row and column extent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RangePosition {
    row: u32,
    col: u32,
    rows: Extent,
    cols: Extent,
}

impl RangePosition {
    /// Bounded range of `rows` × `cols` cells anchored at (`row`, `col`).
    pub fn new(row: u32, col: u32, rows: u32, cols: u32) -> Result<Self, GridError> {
        Self::with_extents(row, col, Extent::Lines(rows), Extent::Lines(cols))
    }

    /// General constructor. `Entire` extents force their start to line 0.
    pub fn with_extents(
        row: u32,
        col: u32,
        rows: Extent,
        cols: Extent,
    ) -> Result<Self, GridError> {
        let row = check_axis(Axis::Row, row, rows)?;
        let col = check_axis(Axis::Column, col, cols)?;
        Ok(Self {
            row,
            col,
            rows,
            cols,
        })
    }

    /// Single-cell range.
    pub fn cell(pos: CellPosition) -> Self {
        Self {
            row: pos.row(),
            col: pos.col(),
            rows: Extent::Lines(1),
            cols: Extent::Lines(1),
        }
    }

    /// Bounded range spanning two corners given in any order.
    pub fn from_corners(a: CellPosition, b: CellPosition) -> Self {
        let (r0, r1) = (a.row().min(b.row()), a.row().max(b.row()));
        let (c0, c1) = (a.col().min(b.col()), a.col().max(b.col()));
        Self {
            row: r0,
            col: c0,
            rows: Extent::Lines(r1 - r0 + 1),
            cols: Extent::Lines(c1 - c0 + 1),
        }
    }

    /// `count` whole rows starting at `row`.
    pub fn entire_rows(row: u32, count: u32) -> Result<Self, GridError> {
        Self::with_extents(row, 0, Extent::Lines(count), Extent::Entire)
    }

    /// `count` whole columns starting at `col`.
    pub fn entire_columns(col: u32, count: u32) -> Result<Self, GridError> {
        Self::with_extents(0, col, Extent::Entire, Extent::Lines(count))
    }

    /// `count` whole lines along `axis` starting at `start`.
    pub fn entire_lines(axis: Axis, start: u32, count: u32) -> Result<Self, GridError> {
        match axis {
            Axis::Row => Self::entire_rows(start, count),
            Axis::Column => Self::entire_columns(start, count),
        }
    }

    #[inline]
    pub const fn row(&self) -> u32 {
        self.row
    }

    #[inline]
    pub const fn col(&self) -> u32 {
        self.col
    }

    #[inline]
    pub const fn rows(&self) -> Extent {
        self.rows
    }

    #[inline]
    pub const fn cols(&self) -> Extent {
        self.cols
    }

    #[inline]
    pub fn top_left(&self) -> CellPosition {
        CellPosition::new(self.row, self.col)
    }

    /// Last row, or `None` for an entire-column span.
    pub fn end_row(&self) -> Option<u32> {
        match self.rows {
            Extent::Lines(n) => Some(self.row + n - 1),
            Extent::Entire => None,
        }
    }

    /// Last column, or `None` for an entire-row span.
    pub fn end_col(&self) -> Option<u32> {
        match self.cols {
            Extent::Lines(n) => Some(self.col + n - 1),
            Extent::Entire => None,
        }
    }

    /// Last row when unbounded spans are resolved against `row_limit` rows.
    pub fn last_row(&self, row_limit: u32) -> u32 {
        self.end_row()
            .unwrap_or_else(|| row_limit.saturating_sub(1))
    }

    /// Last column when unbounded spans are resolved against `col_limit` columns.
    pub fn last_col(&self, col_limit: u32) -> u32 {
        self.end_col()
            .unwrap_or_else(|| col_limit.saturating_sub(1))
    }

    #[inline]
    pub fn start(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.col,
        }
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> Extent {
        match axis {
            Axis::Row => self.rows,
            Axis::Column => self.cols,
        }
    }

    pub fn end(&self, axis: Axis) -> Option<u32> {
        match axis {
            Axis::Row => self.end_row(),
            Axis::Column => self.end_col(),
        }
    }

    /// Returns a copy whose `axis` span is replaced by `start`/`count` lines.
    pub fn with_span(&self, axis: Axis, start: u32, count: u32) -> Result<Self, GridError> {
        match axis {
            Axis::Row => Self::with_extents(start, self.col, Extent::Lines(count), self.cols),
            Axis::Column => Self::with_extents(self.row, start, self.rows, Extent::Lines(count)),
        }
    }

    pub fn is_bounded(&self) -> bool {
        !self.rows.is_entire() && !self.cols.is_entire()
    }

    pub fn is_single_cell(&self) -> bool {
        self.rows == Extent::Lines(1) && self.cols == Extent::Lines(1)
    }

    /// Number of cells covered, resolving unbounded spans against the grid limits.
    pub fn cell_count(&self) -> u64 {
        self.rows.count_within(Axis::Row.limit()) as u64
            * self.cols.count_within(Axis::Column.limit()) as u64
    }

    pub fn contains(&self, pos: CellPosition) -> bool {
        span_contains(self.row, self.rows, pos.row()) && span_contains(self.col, self.cols, pos.col())
    }

    pub fn contains_range(&self, other: &RangePosition) -> bool {
        span_covers(self.row, self.rows, other.row, other.rows)
            && span_covers(self.col, self.cols, other.col, other.cols)
    }

    pub fn intersects(&self, other: &RangePosition) -> bool {
        spans_overlap(self.row, self.rows, other.row, other.rows)
            && spans_overlap(self.col, self.cols, other.col, other.cols)
    }

    /// Resolve unbounded spans against a sheet of `rows` × `cols` and clip to it.
    ///
    /// Returns `None` when the range lies entirely outside the sheet.
    pub fn clamp_to(&self, rows: u32, cols: u32) -> Option<RangePosition> {
        if self.row >= rows || self.col >= cols {
            return None;
        }
        let last_row = self.last_row(rows).min(rows - 1);
        let last_col = self.last_col(cols).min(cols - 1);
        Some(RangePosition {
            row: self.row,
            col: self.col,
            rows: Extent::Lines(last_row - self.row + 1),
            cols: Extent::Lines(last_col - self.col + 1),
        })
    }
}

impl From<CellPosition> for RangePosition {
    fn from(pos: CellPosition) -> Self {
        RangePosition::cell(pos)
    }
}

impl fmt::Display for RangePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.end_row(), self.end_col()) {
            (Some(_), Some(_)) if self.is_single_cell() => write!(f, "{}", self.top_left()),
            (Some(end_row), Some(end_col)) => write!(
                f,
                "{}:{}",
                self.top_left(),
                CellPosition::new(end_row, end_col)
            ),
            (None, Some(end_col)) => write!(
                f,
                "{}:{}",
                column_to_letters(self.col),
                column_to_letters(end_col)
            ),
            (Some(end_row), None) => write!(f, "{}:{}", self.row + 1, end_row + 1),
            (None, None) => write!(f, "1:{}", Axis::Row.limit()),
        }
    }
}

fn check_axis(axis: Axis, start: u32, extent: Extent) -> Result<u32, GridError> {
    let limit = axis.limit();
    match extent {
        Extent::Entire => Ok(0),
        Extent::Lines(0) => Err(GridError::InvalidRange {
            reason: format!("{axis} count must be at least 1"),
        }),
        Extent::Lines(n) => {
            let end = start as u64 + n as u64;
            if end > limit as u64 {
                return Err(GridError::OutOfBounds {
                    axis,
                    index: end - 1,
                    limit,
                });
            }
            Ok(start)
        }
    }
}

fn span_contains(start: u32, extent: Extent, line: u32) -> bool {
    match extent {
        Extent::Entire => true,
        Extent::Lines(n) => line >= start && (line as u64) < start as u64 + n as u64,
    }
}

fn span_covers(start: u32, extent: Extent, other_start: u32, other: Extent) -> bool {
    match (extent, other) {
        (Extent::Entire, _) => true,
        (Extent::Lines(_), Extent::Entire) => false,
        (Extent::Lines(n), Extent::Lines(m)) => {
            other_start >= start && other_start as u64 + m as u64 <= start as u64 + n as u64
        }
    }
}

fn spans_overlap(a: u32, a_ext: Extent, b: u32, b_ext: Extent) -> bool {
    match (a_ext, b_ext) {
        (Extent::Entire, _) | (_, Extent::Entire) => true,
        (Extent::Lines(n), Extent::Lines(m)) => {
            (a as u64) < b as u64 + m as u64 && (b as u64) < a as u64 + n as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::MAX_ROWS;

    #[test]
    fn bounded_ends_and_display() {
        let r = RangePosition::new(2, 1, 3, 2).unwrap();
        assert_eq!(r.end_row(), Some(4));
        assert_eq!(r.end_col(), Some(2));
        assert_eq!(r.to_string(), "B3:C5");
        assert_eq!(RangePosition::cell(CellPosition::new(2, 1)).to_string(), "B3");
    }

    #[test]
    fn entire_spans_start_at_zero() {
        let cols = RangePosition::with_extents(7, 2, Extent::Entire, Extent::Lines(3)).unwrap();
        assert_eq!(cols.row(), 0);
        assert_eq!(cols.end_row(), None);
        assert_eq!(cols.last_row(20), 19);
        assert_eq!(cols.to_string(), "C:E");
        let rows = RangePosition::entire_rows(2, 4).unwrap();
        assert_eq!(rows.to_string(), "3:6");
        assert!(rows.contains(CellPosition::new(5, 16_000)));
    }

    #[test]
    fn rejects_zero_counts_and_overflow() {
        assert!(matches!(
            RangePosition::new(0, 0, 0, 1),
            Err(GridError::InvalidRange { .. })
        ));
        assert!(matches!(
            RangePosition::new(MAX_ROWS - 1, 0, 2, 1),
            Err(GridError::OutOfBounds { axis: Axis::Row, .. })
        ));
    }

    #[test]
    fn intersection_and_containment() {
        let a = RangePosition::new(1, 1, 10, 10).unwrap();
        let b = RangePosition::new(10, 10, 2, 2).unwrap();
        let c = RangePosition::new(11, 1, 1, 1).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_range(&RangePosition::new(2, 2, 3, 3).unwrap()));
        assert!(!a.contains_range(&b));
        let whole_col = RangePosition::entire_columns(1, 1).unwrap();
        assert!(whole_col.intersects(&c));
        assert!(!a.contains_range(&whole_col));
    }

    #[test]
    fn clamp_to_sheet_extent() {
        let whole = RangePosition::entire_columns(0, 3).unwrap();
        let clamped = whole.clamp_to(20, 20).unwrap();
        assert_eq!(clamped, RangePosition::new(0, 0, 20, 3).unwrap());
        assert!(RangePosition::new(30, 0, 1, 1).unwrap().clamp_to(20, 20).is_none());
    }
}
