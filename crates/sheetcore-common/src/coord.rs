//! Cell positions and the limits of the addressable grid.
//!
//! `CellPosition` is a zero-based (row, column) pair bounded the same way Excel
//! bounds a worksheet: 1,048,576 rows × 16,384 columns. Positions order
//! row-major, which is also the order the sparse store iterates in.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GridError;

pub const ROW_BITS: u32 = 20;
pub const COL_BITS: u32 = 14;

/// Number of addressable rows.
pub const MAX_ROWS: u32 = 1 << ROW_BITS;
/// Number of addressable columns.
pub const MAX_COLS: u32 = 1 << COL_BITS;

/// One of the two structural axes of a sheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// Number of addressable lines along this axis.
    #[inline]
    pub const fn limit(self) -> u32 {
        match self {
            Axis::Row => MAX_ROWS,
            Axis::Column => MAX_COLS,
        }
    }

    #[inline]
    pub const fn other(self) -> Axis {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Row => "row",
            Axis::Column => "column",
        })
    }
}

/// Zero-based grid coordinate (row, column).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellPosition {
    row: u32,
    col: u32,
}

impl CellPosition {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    /// Construct a position, panicking if values exceed the grid limits.
    pub fn new(row: u32, col: u32) -> Self {
        assert!(row < MAX_ROWS, "Row {row} exceeds {ROW_BITS} bits");
        assert!(col < MAX_COLS, "Col {col} exceeds {COL_BITS} bits");
        Self { row, col }
    }

    /// Fallible constructor that reports the offending axis rather than panicking.
    pub fn try_new(row: u32, col: u32) -> Result<Self, GridError> {
        if row >= MAX_ROWS {
            return Err(GridError::OutOfBounds {
                axis: Axis::Row,
                index: row as u64,
                limit: MAX_ROWS,
            });
        }
        if col >= MAX_COLS {
            return Err(GridError::OutOfBounds {
                axis: Axis::Column,
                index: col as u64,
                limit: MAX_COLS,
            });
        }
        Ok(Self { row, col })
    }

    /// Construct from Excel 1-based coordinates.
    #[inline]
    pub fn from_excel(row: u32, col: u32) -> Self {
        Self::new(row.saturating_sub(1), col.saturating_sub(1))
    }

    #[inline(always)]
    pub const fn row(self) -> u32 {
        self.row
    }

    #[inline(always)]
    pub const fn col(self) -> u32 {
        self.col
    }

    /// Index of this position along `axis`.
    #[inline]
    pub const fn along(self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.col,
        }
    }

    /// Returns a copy with the `axis` component replaced.
    #[inline]
    pub fn with_along(self, axis: Axis, index: u32) -> Self {
        match axis {
            Axis::Row => Self::new(index, self.col),
            Axis::Column => Self::new(self.row, index),
        }
    }

    pub fn col_to_letters(col: u32) -> String {
        column_to_letters(col)
    }

    pub fn letters_to_col(s: &str) -> Option<u32> {
        letters_to_column_index(s)
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl From<CellPosition> for (u32, u32) {
    fn from(pos: CellPosition) -> Self {
        (pos.row, pos.col)
    }
}

impl TryFrom<(u32, u32)> for CellPosition {
    type Error = GridError;

    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::try_new(value.0, value.1)
    }
}

pub(crate) fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

pub(crate) fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        let ch = ch.to_ascii_uppercase();
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}
