//! The owning façade over one sheet.
//!
//! Every write goes through an [`Action`], so it can be undone; reads are
//! plain borrows of the underlying structures.

use sheetcore_common::{Axis, CellPosition, CellValue, GridError, RangePosition};

use crate::action::{Action, Outcome, Performed};
use crate::border::{BorderInfoSet, BorderSpanIndex, BorderStyle, EdgeMask};
use crate::cell::Cell;
use crate::config::GridConfig;
use crate::headers::LineHeaders;
use crate::hooks::{ChangeListener, ListenerId, LockPredicate};
use crate::mutator::{ShiftSummary, StructuralMutator};
use crate::named_range::NamedRange;
use crate::outline::{OutlineAxis, OutlineNode};
use crate::sheet::SheetState;
use crate::style::StyleLayer;
use crate::undo::{UndoEntry, UndoStack};

pub struct Worksheet<V = CellValue> {
    state: SheetState<V>,
    undo: UndoStack<V>,
}

impl<V: Clone> Default for Worksheet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Worksheet<V> {
    pub fn new() -> Self {
        Self::with_config(GridConfig::default())
    }

    pub fn with_config(config: GridConfig) -> Self {
        let state = SheetState::new(config);
        let undo = UndoStack::new(state.config.undo_limit);
        Self { state, undo }
    }

    pub fn config(&self) -> &GridConfig {
        &self.state.config
    }

    /* ───────────────────────────── reads ───────────────────────────── */

    pub fn cell(&self, pos: CellPosition) -> Option<&Cell<V>> {
        self.state.cells.get(pos)
    }

    pub fn value(&self, pos: CellPosition) -> Option<&V> {
        self.cell(pos).map(|cell| &cell.value)
    }

    /// Populated cells inside `range`, row-major.
    pub fn cells_in(
        &self,
        range: &RangePosition,
    ) -> impl Iterator<Item = (CellPosition, &Cell<V>)> + '_ {
        self.state.cells.iter_range(range)
    }

    pub fn iterate_range(
        &self,
        range: &RangePosition,
        skip_empty: bool,
    ) -> Box<dyn Iterator<Item = (CellPosition, Option<&Cell<V>>)> + '_> {
        self.state.cells.iterate_range(range, skip_empty)
    }

    /// Border summary of `range`, clipped to the sheet. Ranges outside the
    /// sheet report no borders.
    pub fn borders(&self, range: &RangePosition) -> BorderInfoSet {
        let (rows, cols) = self.state.extents();
        match range.clamp_to(rows, cols) {
            Some(clamped) => self.state.borders.get_borders(&clamped),
            None => BorderInfoSet::default(),
        }
    }

    pub fn border_index(&self) -> &BorderSpanIndex {
        &self.state.borders
    }

    pub fn merged_region(&self, pos: CellPosition) -> Option<RangePosition> {
        self.state.merges.region_at(pos)
    }

    pub fn is_merged_cell(&self, pos: CellPosition) -> bool {
        self.state.merges.is_merged_cell(pos)
    }

    pub fn is_merged_anchor(&self, pos: CellPosition) -> bool {
        self.state.merges.is_merged_anchor(pos)
    }

    pub fn merged_regions(&self) -> Vec<RangePosition> {
        self.state.merges.regions()
    }

    pub fn outlines(&self, axis: Axis) -> Vec<Vec<OutlineNode>> {
        self.state.outlines.get_outlines(axis)
    }

    pub fn outline_axis(&self, axis: Axis) -> &OutlineAxis {
        self.state.outlines.axis(axis)
    }

    pub fn is_line_hidden(&self, axis: Axis, line: u32) -> bool {
        self.state.outlines.is_hidden(axis, line)
    }

    pub fn resolve_name(&self, name: &str) -> Result<RangePosition, GridError> {
        self.state.names.resolve(name)
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.state.names.get(name)
    }

    pub fn named_ranges(&self) -> impl Iterator<Item = &NamedRange> + '_ {
        self.state.names.iter()
    }

    pub fn row_count(&self) -> u32 {
        self.state.row_count
    }

    pub fn col_count(&self) -> u32 {
        self.state.col_count
    }

    pub fn max_content_row(&self) -> Option<u32> {
        self.state.max_content_row
    }

    pub fn max_content_col(&self) -> Option<u32> {
        self.state.max_content_col
    }

    /// Displayed size of a line: zero while an outline hides it.
    pub fn line_size(&self, axis: Axis, line: u32) -> u32 {
        if self.is_line_hidden(axis, line) {
            0
        } else {
            self.state.headers(axis).size(line)
        }
    }

    /// Intrinsic size, unaffected by outlines.
    pub fn intrinsic_line_size(&self, axis: Axis, line: u32) -> u32 {
        self.state.headers(axis).size(line)
    }

    /// Distance from the sheet origin to the leading edge of `line`.
    pub fn line_offset(&self, axis: Axis, line: u32) -> u64 {
        let headers = self.state.headers(axis);
        let hidden: u64 = self
            .state
            .outlines
            .axis(axis)
            .hidden_spans()
            .into_iter()
            .take_while(|(start, _)| *start < line)
            .map(|(start, end)| headers.span_size(start, end.min(line)))
            .sum();
        headers.span_size(0, line) - hidden
    }

    pub fn resolve_style(&self, pos: CellPosition) -> StyleLayer {
        self.state.resolve_style(pos)
    }

    pub fn sheet_style(&self) -> &StyleLayer {
        &self.state.sheet_style
    }

    pub fn line_style(&self, axis: Axis, line: u32) -> Option<&StyleLayer> {
        self.state.headers(axis).style(line)
    }

    pub fn line_headers(&self, axis: Axis) -> &LineHeaders {
        self.state.headers(axis)
    }

    /* ───────────────────────────── writes ──────────────────────────── */

    pub fn set_cell(&mut self, pos: CellPosition, cell: Cell<V>) -> Result<(), GridError> {
        self.apply(Action::SetCell {
            pos,
            cell: Some(cell),
        })
    }

    /// Replace the value at `pos`, keeping the cell's own style.
    pub fn set_value(&mut self, pos: CellPosition, value: V) -> Result<(), GridError> {
        let style = self
            .cell(pos)
            .map(|cell| cell.style.clone())
            .unwrap_or_default();
        self.set_cell(pos, Cell::styled(value, style))
    }

    pub fn clear_cell(&mut self, pos: CellPosition) -> Result<(), GridError> {
        self.apply(Action::SetCell { pos, cell: None })
    }

    pub fn insert_rows(&mut self, index: u32, count: u32) -> Result<ShiftSummary, GridError> {
        self.insert_lines(Axis::Row, index, count)
    }

    pub fn insert_columns(&mut self, index: u32, count: u32) -> Result<ShiftSummary, GridError> {
        self.insert_lines(Axis::Column, index, count)
    }

    pub fn delete_rows(&mut self, index: u32, count: u32) -> Result<ShiftSummary, GridError> {
        self.delete_lines(Axis::Row, index, count, false)
    }

    pub fn delete_columns(&mut self, index: u32, count: u32) -> Result<ShiftSummary, GridError> {
        self.delete_lines(Axis::Column, index, count, false)
    }

    pub fn insert_lines(
        &mut self,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<ShiftSummary, GridError> {
        match self.run(Action::InsertLines { axis, index, count })? {
            Outcome::Shifted(summary) => Ok(summary),
            _ => Ok(ShiftSummary::default()),
        }
    }

    /// Delete lines; `force` skips the lock check.
    pub fn delete_lines(
        &mut self,
        axis: Axis,
        index: u32,
        count: u32,
        force: bool,
    ) -> Result<ShiftSummary, GridError> {
        let action = Action::DeleteLines {
            axis,
            index,
            count,
            force,
        };
        match self.run(action)? {
            Outcome::Shifted(summary) => Ok(summary),
            _ => Ok(ShiftSummary::default()),
        }
    }

    /// Merge `range`. Returns `false` when nothing changed (1×1 or already merged).
    pub fn merge_range(&mut self, range: RangePosition, force: bool) -> Result<bool, GridError> {
        match self.run(Action::Merge { range, force })? {
            Outcome::Merged(merged) => Ok(merged),
            _ => Ok(false),
        }
    }

    /// Remove every merged region intersecting `range`, returning them.
    pub fn unmerge_range(&mut self, range: RangePosition) -> Result<Vec<RangePosition>, GridError> {
        match self.run(Action::Unmerge { range })? {
            Outcome::Unmerged(regions) => Ok(regions),
            _ => Ok(Vec::new()),
        }
    }

    pub fn set_border(
        &mut self,
        range: RangePosition,
        mask: EdgeMask,
        style: BorderStyle,
    ) -> Result<(), GridError> {
        self.apply(Action::SetBorder {
            range,
            mask,
            style: Some(style),
        })
    }

    pub fn remove_border(&mut self, range: RangePosition, mask: EdgeMask) -> Result<(), GridError> {
        self.apply(Action::SetBorder {
            range,
            mask,
            style: None,
        })
    }

    pub fn define_name(&mut self, name: &str, range: RangePosition) -> Result<(), GridError> {
        self.define_name_with(name, range, true)
    }

    pub fn define_name_with(
        &mut self,
        name: &str,
        range: RangePosition,
        auto_adjust: bool,
    ) -> Result<(), GridError> {
        self.apply(Action::DefineName {
            name: name.to_string(),
            range,
            auto_adjust,
        })
    }

    pub fn remove_name(&mut self, name: &str) -> Result<(), GridError> {
        self.apply(Action::RemoveName {
            name: name.to_string(),
        })
    }

    pub fn add_outline(&mut self, axis: Axis, start: u32, count: u32) -> Result<(), GridError> {
        self.apply(Action::AddOutline { axis, start, count })
    }

    pub fn remove_outline(&mut self, axis: Axis, start: u32, count: u32) -> Result<(), GridError> {
        self.apply(Action::RemoveOutline { axis, start, count })
    }

    pub fn collapse_outline(&mut self, axis: Axis, start: u32, count: u32) -> Result<(), GridError> {
        self.apply(Action::SetOutlineCollapsed {
            axis,
            start,
            count,
            collapsed: true,
        })
    }

    pub fn expand_outline(&mut self, axis: Axis, start: u32, count: u32) -> Result<(), GridError> {
        self.apply(Action::SetOutlineCollapsed {
            axis,
            start,
            count,
            collapsed: false,
        })
    }

    /// Set (`Some`) or reset (`None`) the intrinsic size of a line.
    pub fn set_line_size(
        &mut self,
        axis: Axis,
        line: u32,
        size: Option<u32>,
    ) -> Result<(), GridError> {
        self.apply(Action::SetLineSize { axis, line, size })
    }

    pub fn set_line_style(
        &mut self,
        axis: Axis,
        line: u32,
        style: Option<StyleLayer>,
    ) -> Result<(), GridError> {
        self.apply(Action::SetLineStyle { axis, line, style })
    }

    /// Sheet-wide default style. Not recorded in the undo history.
    pub fn set_sheet_style(&mut self, style: StyleLayer) {
        self.state.sheet_style = style;
    }

    /* ────────────────────────────── undo ───────────────────────────── */

    /// Perform `action` and record it for undo.
    pub fn apply(&mut self, action: Action<V>) -> Result<(), GridError> {
        self.run(action).map(|_| ())
    }

    fn run(&mut self, action: Action<V>) -> Result<Outcome, GridError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("apply", action = %action.describe()).entered();

        let extents = self.state.extents();
        let Performed { outcome, revert } = action.perform(&mut self.state)?;
        if !revert.is_nothing() {
            self.undo.push(UndoEntry {
                action,
                revert,
                extents,
            });
        }
        Ok(outcome)
    }

    /// Revert the most recent action. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, GridError> {
        let Some(UndoEntry {
            action,
            revert,
            extents,
        }) = self.undo.pop_done()
        else {
            return Ok(false);
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("undo", action = %action.describe()).entered();

        StructuralMutator::new(&mut self.state).revert(revert)?;
        self.state.set_extents(extents);
        self.state.refresh_content_bounds();
        self.undo.push_undone(action);
        Ok(true)
    }

    /// Perform the most recently undone action again.
    pub fn redo(&mut self) -> Result<bool, GridError> {
        let Some(action) = self.undo.pop_undone() else {
            return Ok(false);
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("redo", action = %action.describe()).entered();

        let extents = self.state.extents();
        match action.perform(&mut self.state) {
            Ok(Performed { revert, .. }) => {
                if !revert.is_nothing() {
                    self.undo.push_done(UndoEntry {
                        action,
                        revert,
                        extents,
                    });
                }
                Ok(true)
            }
            Err(err) => {
                self.undo.push_undone(action);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.undo.undo_label()
    }

    pub fn redo_label(&self) -> Option<String> {
        self.undo.redo_label()
    }

    /// Forget every undo and redo entry, keeping the sheet as it is.
    pub fn clear_history(&mut self) {
        self.undo.clear();
    }

    /// Empty the sheet and its history. Listeners and the lock predicate stay.
    pub fn reset(&mut self) {
        self.state.reset();
        self.undo.clear();
    }

    /* ─────────────────────────── bulk load ─────────────────────────── */

    /// Write a cell without undo tracking, hooks or bookkeeping. Call
    /// [`finish_load`](Self::finish_load) after the last one.
    pub fn load_cell(&mut self, pos: CellPosition, cell: Cell<V>) -> Result<(), GridError> {
        self.state.check_position(pos)?;
        self.state.cells.set(pos, cell);
        Ok(())
    }

    pub fn finish_load(&mut self) {
        self.state.refresh_content_bounds();
        if let Some(row) = self.state.max_content_row {
            self.state.row_count = self.state.row_count.max(row + 1);
        }
        if let Some(col) = self.state.max_content_col {
            self.state.col_count = self.state.col_count.max(col + 1);
        }
    }

    /* ───────────────────────────── hooks ───────────────────────────── */

    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: ChangeListener + 'static,
    {
        self.state.listeners.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.state.listeners.unsubscribe(id)
    }

    /// Replace the default style-based lock check.
    pub fn set_lock_predicate<P>(&mut self, predicate: P)
    where
        P: LockPredicate + 'static,
    {
        self.state.set_lock_predicate(Box::new(predicate));
    }

    pub fn clear_lock_predicate(&mut self) {
        self.state.lock = None;
    }

    /// Panics if any structure or cross-structure invariant is broken.
    pub fn assert_invariants(&self) {
        self.state.borders.assert_invariants();
        self.state.merges.assert_invariants();
        self.state.outlines.assert_invariants();
        for (pos, _) in self.state.cells.iter() {
            assert!(
                pos.row() < self.state.row_count && pos.col() < self.state.col_count,
                "cell {pos} lies outside the {}x{} sheet",
                self.state.row_count,
                self.state.col_count
            );
            if let Some(region) = self.state.merges.region_at(pos) {
                assert_eq!(
                    region.top_left(),
                    pos,
                    "covered cell {pos} of {region} holds a payload"
                );
            }
        }
        assert_eq!(self.state.max_content_row, self.state.cells.max_row());
        assert_eq!(self.state.max_content_col, self.state.cells.max_col());
    }
}

impl<V> std::fmt::Debug for Worksheet<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worksheet")
            .field("rows", &self.state.row_count)
            .field("cols", &self.state.col_count)
            .field("cells", &self.state.cells.len())
            .field("merges", &self.state.merges.len())
            .field("names", &self.state.names.len())
            .field("listeners", &self.state.listeners)
            .finish()
    }
}
