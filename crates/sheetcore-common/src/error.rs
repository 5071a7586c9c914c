//! Error taxonomy for grid operations.
//!
//! Every variant is a local, recoverable condition returned to the direct
//! caller. An operation that fails leaves the sheet untouched.

use thiserror::Error;

use crate::address::AddressError;
use crate::coord::{Axis, CellPosition};
use crate::range::RangePosition;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum GridError {
    /// Address or range outside the addressable grid (writes only; reads default).
    #[error("{axis} {index} is outside the grid (limit {limit})")]
    OutOfBounds { axis: Axis, index: u64, limit: u32 },

    /// Requested merge overlaps an existing, non-identical merged region.
    #[error("range {requested} intersects merged region {existing}")]
    IntersectedMerge {
        requested: RangePosition,
        existing: RangePosition,
    },

    /// A destructive operation touched a read-only cell without `force`.
    #[error("cell {cell} is locked")]
    LockedCellViolation { cell: CellPosition },

    /// Outline interval partially overlaps an existing outline on the same axis.
    #[error(
        "{axis} outline {start}+{count} partially overlaps outline {other_start}+{other_count}"
    )]
    AmbiguousOutlineNesting {
        axis: Axis,
        start: u32,
        count: u32,
        other_start: u32,
        other_count: u32,
    },

    #[error("{axis} outline {start}+{count} already exists")]
    OutlineExists { axis: Axis, start: u32, count: u32 },

    #[error("no {axis} outline at {start}+{count}")]
    OutlineNotFound { axis: Axis, start: u32, count: u32 },

    /// Write to a non-anchor cell of a merged region.
    #[error("cell {cell} is covered by the merged region anchored at {anchor}")]
    CoveredByMerge {
        cell: CellPosition,
        anchor: CellPosition,
    },

    #[error("named range '{0}' does not exist")]
    NameNotFound(String),

    #[error("named range '{0}' is already defined")]
    DuplicateName(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Every line the named range covered has been deleted.
    #[error("named range '{0}' refers to deleted cells")]
    DanglingName(String),

    #[error("invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error(transparent)]
    Address(#[from] AddressError),
}
