pub mod action;
pub mod border;
pub mod cell;
pub mod config;
pub mod headers;
pub mod hooks;
pub mod interval_tree;
pub mod merge;
pub mod mutator;
pub mod named_range;
pub mod outline;
pub mod shift;
pub mod sparse;
pub mod style;
pub mod worksheet;

mod sheet;
mod undo;

pub use action::Action;
pub use border::{
    BorderEdge, BorderInfoSet, BorderPatch, BorderRun, BorderSpanIndex, BorderStyle, EdgeMask,
    LineStyle,
};
pub use cell::Cell;
pub use config::GridConfig;
pub use headers::LineHeaders;
pub use hooks::{ChangeEvent, ChangeListener, EditKind, ListenerId, LockPredicate};
pub use merge::{MergeShift, MergedRangeSet};
pub use mutator::ShiftSummary;
pub use named_range::{NamedRange, NamedRangeTable};
pub use outline::{OutlineAxis, OutlineForest, OutlineNode};
pub use shift::ShiftOperation;
pub use sparse::SparseGrid;
pub use style::{HorizontalAlignment, StyleFlags, StyleLayer, VerticalAlignment};
pub use worksheet::Worksheet;

pub use sheetcore_common::{
    AddressError, Axis, CellPosition, CellValue, Extent, GridError, MAX_COLS, MAX_ROWS,
    RangePosition,
};
