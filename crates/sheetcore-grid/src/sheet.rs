//! Shared state behind a [`Worksheet`](crate::Worksheet).
//!
//! `SheetState` owns the cell store and every line-indexed structure, plus
//! the extent and content bookkeeping that structural edits update. It also
//! answers the questions edits ask of the whole sheet: how far a range
//! reaches, which style layers apply to a cell and whether a cell is locked.

use sheetcore_common::{Axis, CellPosition, Extent, GridError, RangePosition};

use crate::border::BorderSpanIndex;
use crate::cell::Cell;
use crate::config::GridConfig;
use crate::headers::LineHeaders;
use crate::hooks::{ChangeEvent, Listeners, LockPredicate};
use crate::merge::MergedRangeSet;
use crate::named_range::NamedRangeTable;
use crate::outline::OutlineForest;
use crate::sparse::SparseGrid;
use crate::style::StyleLayer;

/// Every structure of one sheet, owned together so that structural edits
/// can keep them consistent.
pub(crate) struct SheetState<V> {
    pub(crate) config: GridConfig,
    pub(crate) cells: SparseGrid<Cell<V>>,
    pub(crate) borders: BorderSpanIndex,
    pub(crate) merges: MergedRangeSet,
    pub(crate) outlines: OutlineForest,
    pub(crate) names: NamedRangeTable,
    pub(crate) row_headers: LineHeaders,
    pub(crate) col_headers: LineHeaders,
    pub(crate) sheet_style: StyleLayer,
    pub(crate) row_count: u32,
    pub(crate) col_count: u32,
    pub(crate) max_content_row: Option<u32>,
    pub(crate) max_content_col: Option<u32>,
    pub(crate) listeners: Listeners,
    pub(crate) lock: Option<Box<dyn LockPredicate>>,
}

impl<V> SheetState<V> {
    pub(crate) fn new(config: GridConfig) -> Self {
        let config = config.normalized();
        Self {
            cells: SparseGrid::new(),
            borders: BorderSpanIndex::new(),
            merges: MergedRangeSet::new(),
            outlines: OutlineForest::new(),
            names: NamedRangeTable::new(),
            row_headers: LineHeaders::new(Axis::Row, config.default_row_height),
            col_headers: LineHeaders::new(Axis::Column, config.default_col_width),
            sheet_style: StyleLayer::default(),
            row_count: config.initial_rows,
            col_count: config.initial_cols,
            max_content_row: None,
            max_content_col: None,
            listeners: Listeners::default(),
            lock: None,
            config,
        }
    }

    /// Drop all content, keeping configuration, listeners and the lock predicate.
    pub(crate) fn reset(&mut self) {
        let listeners = std::mem::take(&mut self.listeners);
        let lock = self.lock.take();
        *self = Self::new(self.config.clone());
        self.listeners = listeners;
        self.lock = lock;
    }

    pub(crate) fn extent(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.row_count,
            Axis::Column => self.col_count,
        }
    }

    pub(crate) fn set_extent(&mut self, axis: Axis, value: u32) {
        match axis {
            Axis::Row => self.row_count = value,
            Axis::Column => self.col_count = value,
        }
    }

    pub(crate) fn extents(&self) -> (u32, u32) {
        (self.row_count, self.col_count)
    }

    pub(crate) fn set_extents(&mut self, (rows, cols): (u32, u32)) {
        self.row_count = rows;
        self.col_count = cols;
    }

    /// Configured maximum extent along `axis`.
    pub(crate) fn limit(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Row => self.config.max_rows,
            Axis::Column => self.config.max_cols,
        }
    }

    pub(crate) fn headers(&self, axis: Axis) -> &LineHeaders {
        match axis {
            Axis::Row => &self.row_headers,
            Axis::Column => &self.col_headers,
        }
    }

    pub(crate) fn headers_mut(&mut self, axis: Axis) -> &mut LineHeaders {
        match axis {
            Axis::Row => &mut self.row_headers,
            Axis::Column => &mut self.col_headers,
        }
    }

    pub(crate) fn check_line(&self, axis: Axis, line: u32) -> Result<(), GridError> {
        let limit = self.limit(axis);
        if line >= limit {
            return Err(GridError::OutOfBounds {
                axis,
                index: line as u64,
                limit,
            });
        }
        Ok(())
    }

    pub(crate) fn check_position(&self, pos: CellPosition) -> Result<(), GridError> {
        self.check_line(Axis::Row, pos.row())?;
        self.check_line(Axis::Column, pos.col())
    }

    /// Resolve `Entire` spans against the current extent and reject ranges
    /// reaching past the configured maximum.
    pub(crate) fn bounded(&self, range: &RangePosition) -> Result<RangePosition, GridError> {
        let mut resolved = *range;
        for axis in [Axis::Row, Axis::Column] {
            let start = range.start(axis);
            let count = match range.extent(axis) {
                Extent::Lines(n) => n,
                Extent::Entire => self.extent(axis).saturating_sub(start),
            };
            let last = start as u64 + count.max(1) as u64 - 1;
            let limit = self.limit(axis);
            if last >= limit as u64 {
                return Err(GridError::OutOfBounds {
                    axis,
                    index: last,
                    limit,
                });
            }
            resolved = resolved.with_span(axis, start, count.max(1))?;
        }
        Ok(resolved)
    }

    /// Grow the extent so that `range` lies inside the sheet.
    pub(crate) fn grow_to(&mut self, range: &RangePosition) {
        if let Some(end) = range.end_row() {
            self.row_count = self.row_count.max(end + 1);
        }
        if let Some(end) = range.end_col() {
            self.col_count = self.col_count.max(end + 1);
        }
    }

    pub(crate) fn note_content(&mut self, pos: CellPosition) {
        self.max_content_row = self.max_content_row.max(Some(pos.row()));
        self.max_content_col = self.max_content_col.max(Some(pos.col()));
    }

    pub(crate) fn refresh_content_bounds(&mut self) {
        self.max_content_row = self.cells.max_row();
        self.max_content_col = self.cells.max_col();
    }

    pub(crate) fn set_lock_predicate(&mut self, predicate: Box<dyn LockPredicate>) {
        self.lock = Some(predicate);
    }

    /// Sheet, row, column and cell layers merged from least to most specific.
    pub(crate) fn resolve_style(&self, pos: CellPosition) -> StyleLayer {
        StyleLayer::resolve([
            Some(&self.sheet_style),
            self.row_headers.style(pos.row()),
            self.col_headers.style(pos.col()),
            self.cells.get(pos).map(|cell| &cell.style),
        ])
    }

    /// A custom predicate wins; otherwise the most specific style layer that
    /// sets `locked` decides.
    pub(crate) fn is_locked(&self, pos: CellPosition) -> bool {
        match &self.lock {
            Some(predicate) => predicate.is_locked(pos),
            None => self
                .cells
                .get(pos)
                .and_then(|cell| cell.style.locked)
                .or_else(|| self.col_headers.style(pos.col()).and_then(|s| s.locked))
                .or_else(|| self.row_headers.style(pos.row()).and_then(|s| s.locked))
                .or(self.sheet_style.locked)
                .unwrap_or(false),
        }
    }

    /// False when only a cell's own style can lock it, so empty cells never are.
    pub(crate) fn empty_cells_lockable(&self) -> bool {
        self.lock.is_some()
            || self.sheet_style.locked == Some(true)
            || self.row_headers.locks_any_line()
            || self.col_headers.locks_any_line()
    }

    pub(crate) fn notify(&mut self, event: ChangeEvent) {
        #[cfg(feature = "tracing")]
        tracing::trace!(range = %event.range, kind = ?event.kind, "change event");
        self.listeners.notify(&event);
    }
}
