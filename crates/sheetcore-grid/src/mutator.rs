//! Structural editing of a sheet.
//!
//! Every operation runs in the same order: clamp and validate, shift cell
//! payloads, re-map borders, merged regions, outlines and line headers, then
//! named ranges, notify listeners, and finally update the extent and content
//! bookkeeping. Validation happens before the first mutation, so a failed
//! operation leaves the sheet untouched.
//!
//! Each mutating call returns a [`Revert`] holding the minimal state needed to
//! restore the sheet exactly.

use sheetcore_common::{Axis, CellPosition, GridError, RangePosition};

use crate::border::{BorderPatch, BorderStyle, EdgeMask};
use crate::cell::Cell;
use crate::headers::HeaderWindow;
use crate::hooks::{ChangeEvent, EditKind};
use crate::merge::MergeShift;
use crate::named_range::NamedRange;
use crate::outline::{OutlineNode, OutlinePatch};
use crate::sheet::SheetState;
use crate::shift::ShiftOperation;
use crate::style::StyleLayer;

/// What a row/column insert or delete did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftSummary {
    /// Effective first line after clamping.
    pub index: u32,
    /// Effective line count after clamping; zero for a no-op.
    pub count: u32,
    pub cells_removed: usize,
    pub merges_removed: Vec<RangePosition>,
    pub merges_resized: Vec<(RangePosition, RangePosition)>,
    pub names_adjusted: Vec<String>,
}

/// Line-indexed state that a shift's inverse would not give back.
#[derive(Debug, Clone)]
pub(crate) struct ShiftCapture {
    outlines: OutlinePatch,
    headers: HeaderWindow,
    names: Vec<NamedRange>,
}

/// Everything a delete destroyed or clipped.
#[derive(Debug, Clone)]
pub(crate) struct DeletedWindow<V> {
    axis: Axis,
    index: u32,
    count: u32,
    cells: Vec<(CellPosition, Cell<V>)>,
    borders: BorderPatch,
    merges: MergeShift,
    lost: ShiftCapture,
}

/// Undo payload of one performed operation.
#[derive(Debug, Clone)]
pub(crate) enum Revert<V> {
    Nothing,
    Inserted {
        axis: Axis,
        index: u32,
        count: u32,
        lost: Box<ShiftCapture>,
    },
    Deleted(Box<DeletedWindow<V>>),
    Merged {
        region: RangePosition,
        cleared: Vec<(CellPosition, Cell<V>)>,
    },
    Unmerged {
        regions: Vec<RangePosition>,
    },
    Borders {
        region: RangePosition,
        patch: BorderPatch,
    },
    Cell {
        pos: CellPosition,
        previous: Option<Cell<V>>,
    },
    NameDefined {
        name: String,
    },
    NameRemoved {
        entry: NamedRange,
    },
    OutlineAdded {
        axis: Axis,
        start: u32,
        count: u32,
    },
    OutlineRemoved {
        axis: Axis,
        node: OutlineNode,
    },
    OutlineCollapsed {
        axis: Axis,
        start: u32,
        count: u32,
        previous: bool,
    },
    LineSize {
        axis: Axis,
        line: u32,
        previous: Option<u32>,
    },
    LineStyle {
        axis: Axis,
        line: u32,
        previous: Option<StyleLayer>,
    },
    Batch(Vec<Revert<V>>),
}

impl<V> Revert<V> {
    pub(crate) fn is_nothing(&self) -> bool {
        match self {
            Revert::Nothing => true,
            Revert::Batch(items) => items.iter().all(Revert::is_nothing),
            _ => false,
        }
    }
}

struct Shifted<V> {
    cells: Vec<(CellPosition, Cell<V>)>,
    merges: MergeShift,
    names: Vec<NamedRange>,
}

pub(crate) struct StructuralMutator<'a, V> {
    state: &'a mut SheetState<V>,
}

impl<'a, V> StructuralMutator<'a, V> {
    pub(crate) fn new(state: &'a mut SheetState<V>) -> Self {
        Self { state }
    }

    /// Insert `count` empty lines before `index`.
    pub(crate) fn insert_lines(
        &mut self,
        axis: Axis,
        index: u32,
        count: u32,
    ) -> Result<(ShiftSummary, Revert<V>), GridError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("insert_lines", %axis, index, count).entered();

        // 1. Clamp the insert point to the current extent
        if count == 0 {
            return Ok((ShiftSummary::default(), Revert::Nothing));
        }
        let extent = self.state.extent(axis);
        let index = index.min(extent);
        let limit = self.state.limit(axis);
        let new_extent = extent as u64 + count as u64;
        if new_extent > limit as u64 {
            return Err(GridError::OutOfBounds {
                axis,
                index: new_extent - 1,
                limit,
            });
        }
        let lines = RangePosition::entire_lines(axis, index, count)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(index, count, extent, "insert clamped");

        // Capture what falls off the far end of the axis
        let op = ShiftOperation::insert(axis, index, count);
        let outlines = self.state.outlines.capture_shift(&op);
        let headers = self.state.headers(axis).capture_shift(&op);

        // 2-6. Shift payloads and every auxiliary structure
        let shifted = self.shift_all(&op);
        debug_assert!(shifted.cells.is_empty(), "insert pushed cells off the grid");

        // 7. Notify
        self.state
            .notify(ChangeEvent::new(lines, EditKind::Insert));

        // 8. Bookkeeping
        self.state.set_extent(axis, new_extent as u32);
        self.state.refresh_content_bounds();

        let summary = ShiftSummary {
            index,
            count,
            cells_removed: 0,
            merges_removed: shifted.merges.removed,
            merges_resized: shifted.merges.changed,
            names_adjusted: shifted.names.iter().map(|n| n.name().to_string()).collect(),
        };
        let lost = ShiftCapture {
            outlines,
            headers,
            names: shifted.names,
        };
        Ok((
            summary,
            Revert::Inserted {
                axis,
                index,
                count,
                lost: Box::new(lost),
            },
        ))
    }

    /// Delete `count` lines starting at `index`.
    ///
    /// Populated cells in the window are checked against the lock predicate
    /// unless `force` is set.
    pub(crate) fn delete_lines(
        &mut self,
        axis: Axis,
        index: u32,
        count: u32,
        force: bool,
    ) -> Result<(ShiftSummary, Revert<V>), GridError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("delete_lines", %axis, index, count, force).entered();

        // 1. Clamp the window to the current extent
        let extent = self.state.extent(axis);
        if count == 0 || index >= extent {
            return Ok((ShiftSummary::default(), Revert::Nothing));
        }
        let count = count.min(extent - index);
        if count == extent {
            return Err(GridError::InvalidRange {
                reason: format!("cannot delete every {axis} of the sheet"),
            });
        }
        let window = RangePosition::entire_lines(axis, index, count)?;
        if !force {
            self.check_unlocked(&window, None, false)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(index, count, extent, "delete clamped");

        let op = ShiftOperation::delete(axis, index, count);
        let borders = self.state.borders.capture_delete(axis, index, count);
        let outlines = self.state.outlines.capture_shift(&op);
        let headers = self.state.headers(axis).capture_shift(&op);

        // 2-6. Shift payloads and every auxiliary structure
        let shifted = self.shift_all(&op);

        // 7. Notify
        self.state
            .notify(ChangeEvent::new(window, EditKind::Delete));

        // 8. Bookkeeping
        self.state.set_extent(axis, extent - count);
        self.state.refresh_content_bounds();

        let summary = ShiftSummary {
            index,
            count,
            cells_removed: shifted.cells.len(),
            merges_removed: shifted.merges.removed.clone(),
            merges_resized: shifted.merges.changed.clone(),
            names_adjusted: shifted.names.iter().map(|n| n.name().to_string()).collect(),
        };
        let deleted = DeletedWindow {
            axis,
            index,
            count,
            cells: shifted.cells,
            borders,
            merges: shifted.merges,
            lost: ShiftCapture {
                outlines,
                headers,
                names: shifted.names,
            },
        };
        Ok((summary, Revert::Deleted(Box::new(deleted))))
    }

    /// Merge `range` into one region, clearing every non-anchor payload.
    pub(crate) fn merge_range(
        &mut self,
        range: &RangePosition,
        force: bool,
    ) -> Result<(bool, Revert<V>), GridError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("merge_range", %range, force).entered();

        let region = self.state.bounded(range)?;
        let anchor = region.top_left();
        if !force {
            self.check_unlocked(&region, Some(anchor), true)?;
        }
        if !self.state.merges.merge(region)? {
            return Ok((false, Revert::Nothing));
        }

        let covered: Vec<CellPosition> = self
            .state
            .cells
            .iter_range(&region)
            .map(|(pos, _)| pos)
            .filter(|pos| *pos != anchor)
            .collect();
        let mut cleared = Vec::with_capacity(covered.len());
        for pos in covered {
            if let Some(cell) = self.state.cells.clear(pos) {
                cleared.push((pos, cell));
            }
        }

        self.state.grow_to(&region);
        self.state
            .notify(ChangeEvent::new(region, EditKind::Merge));
        self.state.refresh_content_bounds();
        Ok((true, Revert::Merged { region, cleared }))
    }

    /// Remove every merged region intersecting `range`.
    pub(crate) fn unmerge_range(
        &mut self,
        range: &RangePosition,
    ) -> (Vec<RangePosition>, Revert<V>) {
        let regions = self.state.merges.unmerge(range);
        if regions.is_empty() {
            return (regions, Revert::Nothing);
        }
        for region in &regions {
            self.state
                .notify(ChangeEvent::new(*region, EditKind::Unmerge));
        }
        (
            regions.clone(),
            Revert::Unmerged { regions },
        )
    }

    /// Set (`Some`) or remove (`None`) borders on the edges of `range` selected by `mask`.
    pub(crate) fn set_border(
        &mut self,
        range: &RangePosition,
        mask: EdgeMask,
        style: Option<BorderStyle>,
    ) -> Result<Revert<V>, GridError> {
        let region = self.state.bounded(range)?;
        if mask.is_empty() {
            return Ok(Revert::Nothing);
        }
        let patch = self.state.borders.capture(&region, mask);
        match style {
            Some(style) => self.state.borders.set_border(&region, mask, style),
            None => self.state.borders.remove_border(&region, mask),
        }
        self.state.grow_to(&region);
        self.state
            .notify(ChangeEvent::new(region, EditKind::BorderChange));
        Ok(Revert::Borders { region, patch })
    }

    /// Store or clear one cell. Covered cells of a merged region reject writes.
    pub(crate) fn set_cell(
        &mut self,
        pos: CellPosition,
        cell: Option<Cell<V>>,
    ) -> Result<Revert<V>, GridError> {
        self.state.check_position(pos)?;
        let previous = match cell {
            Some(cell) => {
                if let Some(region) = self.state.merges.region_at(pos) {
                    if region.top_left() != pos {
                        return Err(GridError::CoveredByMerge {
                            cell: pos,
                            anchor: region.top_left(),
                        });
                    }
                }
                self.state.grow_to(&RangePosition::cell(pos));
                let previous = self.state.cells.set(pos, cell);
                self.state.note_content(pos);
                previous
            }
            None => {
                let previous = self.state.cells.clear(pos);
                if previous.is_some() {
                    self.state.refresh_content_bounds();
                }
                previous
            }
        };
        Ok(Revert::Cell { pos, previous })
    }

    pub(crate) fn define_name(
        &mut self,
        name: &str,
        range: RangePosition,
        auto_adjust: bool,
    ) -> Result<Revert<V>, GridError> {
        self.state.names.define_with(name, range, auto_adjust)?;
        Ok(Revert::NameDefined {
            name: name.to_string(),
        })
    }

    pub(crate) fn remove_name(&mut self, name: &str) -> Result<Revert<V>, GridError> {
        let entry = self.state.names.remove(name)?;
        Ok(Revert::NameRemoved { entry })
    }

    pub(crate) fn add_outline(
        &mut self,
        axis: Axis,
        start: u32,
        count: u32,
    ) -> Result<Revert<V>, GridError> {
        self.state.outlines.add_outline(axis, start, count)?;
        Ok(Revert::OutlineAdded { axis, start, count })
    }

    pub(crate) fn remove_outline(
        &mut self,
        axis: Axis,
        start: u32,
        count: u32,
    ) -> Result<Revert<V>, GridError> {
        let node = self.state.outlines.remove_outline(axis, start, count)?;
        Ok(Revert::OutlineRemoved { axis, node })
    }

    pub(crate) fn set_outline_collapsed(
        &mut self,
        axis: Axis,
        start: u32,
        count: u32,
        collapsed: bool,
    ) -> Result<Revert<V>, GridError> {
        let previous = self
            .state
            .outlines
            .axis_mut(axis)
            .set_collapsed(start, count, collapsed)?;
        if previous == collapsed {
            return Ok(Revert::Nothing);
        }
        Ok(Revert::OutlineCollapsed {
            axis,
            start,
            count,
            previous,
        })
    }

    pub(crate) fn set_line_size(
        &mut self,
        axis: Axis,
        line: u32,
        size: Option<u32>,
    ) -> Result<Revert<V>, GridError> {
        self.state.check_line(axis, line)?;
        let previous = self.state.headers_mut(axis).set_size(line, size);
        Ok(Revert::LineSize {
            axis,
            line,
            previous,
        })
    }

    pub(crate) fn set_line_style(
        &mut self,
        axis: Axis,
        line: u32,
        style: Option<StyleLayer>,
    ) -> Result<Revert<V>, GridError> {
        self.state.check_line(axis, line)?;
        let previous = self.state.headers_mut(axis).set_style(line, style);
        Ok(Revert::LineStyle {
            axis,
            line,
            previous,
        })
    }

    /// Restore the state captured by `revert`.
    pub(crate) fn revert(&mut self, revert: Revert<V>) -> Result<(), GridError> {
        match revert {
            Revert::Nothing => {}
            Revert::Inserted {
                axis,
                index,
                count,
                lost,
            } => {
                let op = ShiftOperation::delete(axis, index, count);
                self.shift_all(&op);
                self.restore_lost(axis, *lost);
                let extent = self.state.extent(axis);
                self.state.set_extent(axis, extent.saturating_sub(count));
                self.state.notify(ChangeEvent::new(
                    RangePosition::entire_lines(axis, index, count)?,
                    EditKind::Delete,
                ));
                self.state.refresh_content_bounds();
            }
            Revert::Deleted(window) => self.restore_deleted(*window)?,
            Revert::Merged { region, cleared } => {
                self.state.merges.remove_region(&region);
                for (pos, cell) in cleared {
                    self.state.cells.set(pos, cell);
                }
                self.state
                    .notify(ChangeEvent::new(region, EditKind::Unmerge));
                self.state.refresh_content_bounds();
            }
            Revert::Unmerged { regions } => {
                self.state.merges.restore(regions.iter().copied());
                for region in regions {
                    self.state
                        .notify(ChangeEvent::new(region, EditKind::Merge));
                }
            }
            Revert::Borders { region, patch } => {
                self.state.borders.apply_patch(&patch);
                self.state
                    .notify(ChangeEvent::new(region, EditKind::BorderChange));
            }
            Revert::Cell { pos, previous } => {
                match previous {
                    Some(cell) => {
                        self.state.cells.set(pos, cell);
                    }
                    None => {
                        self.state.cells.clear(pos);
                    }
                }
                self.state.refresh_content_bounds();
            }
            Revert::NameDefined { name } => {
                self.state.names.remove(&name)?;
            }
            Revert::NameRemoved { entry } => self.state.names.restore(entry),
            Revert::OutlineAdded { axis, start, count } => {
                self.state.outlines.remove_outline(axis, start, count)?;
            }
            Revert::OutlineRemoved { axis, node } => {
                self.state.outlines.add_outline(axis, node.start, node.count)?;
                if node.collapsed {
                    self.state.outlines.collapse(axis, node.start, node.count)?;
                }
            }
            Revert::OutlineCollapsed {
                axis,
                start,
                count,
                previous,
            } => {
                self.state
                    .outlines
                    .axis_mut(axis)
                    .set_collapsed(start, count, previous)?;
            }
            Revert::LineSize {
                axis,
                line,
                previous,
            } => {
                self.state.headers_mut(axis).set_size(line, previous);
            }
            Revert::LineStyle {
                axis,
                line,
                previous,
            } => {
                self.state.headers_mut(axis).set_style(line, previous);
            }
            Revert::Batch(items) => {
                for item in items.into_iter().rev() {
                    self.revert(item)?;
                }
            }
        }
        Ok(())
    }

    fn restore_deleted(&mut self, window: DeletedWindow<V>) -> Result<(), GridError> {
        let DeletedWindow {
            axis,
            index,
            count,
            cells,
            borders,
            merges,
            lost,
        } = window;

        // Re-open the gap, then put back exactly what the delete removed or clipped.
        let op = ShiftOperation::insert(axis, index, count);
        self.shift_all(&op);

        for (_, clipped) in &merges.changed {
            if let Some(image) = op.adjust_range(clipped) {
                self.state.merges.remove_region(&image);
            }
        }
        let originals = merges
            .changed
            .iter()
            .map(|(before, _)| *before)
            .chain(merges.removed.iter().copied());
        self.state.merges.restore(originals);

        self.restore_lost(axis, lost);
        self.state.borders.apply_patch(&borders);
        for (pos, cell) in cells {
            self.state.cells.set(pos, cell);
        }

        let extent = self.state.extent(axis);
        self.state.set_extent(axis, extent + count);
        self.state.notify(ChangeEvent::new(
            RangePosition::entire_lines(axis, index, count)?,
            EditKind::Insert,
        ));
        self.state.refresh_content_bounds();
        Ok(())
    }

    /// Run after a shift's inverse, putting back what it could not.
    fn restore_lost(&mut self, axis: Axis, lost: ShiftCapture) {
        for entry in lost.names {
            self.state.names.restore(entry);
        }
        self.state.outlines.apply_patch(&lost.outlines);
        self.state.headers_mut(axis).restore_window(&lost.headers);
    }

    /// Steps 2-6 of every structural edit.
    fn shift_all(&mut self, op: &ShiftOperation) -> Shifted<V> {
        let axis = op.axis();
        let cells = match *op {
            ShiftOperation::Insert { before, count, .. } => {
                self.state.cells.insert_lines(axis, before, count)
            }
            ShiftOperation::Delete { start, count, .. } => {
                self.state.cells.delete_lines(axis, start, count)
            }
        };
        self.state.borders.apply_shift(op);
        let merges = self.state.merges.apply_shift(op);
        self.state.outlines.apply_shift(op);
        self.state.headers_mut(axis).apply_shift(op);
        let names = self.state.names.apply_shift(op);
        Shifted {
            cells,
            merges,
            names,
        }
    }

    /// Reject the edit if a cell of `range` other than `skip` is locked.
    /// Empty cells are checked only with `include_empty`, and only when
    /// something other than a cell's own style could lock them.
    fn check_unlocked(
        &self,
        range: &RangePosition,
        skip: Option<CellPosition>,
        include_empty: bool,
    ) -> Result<(), GridError> {
        let populated_only = !(include_empty && self.state.empty_cells_lockable());
        let locked = self
            .state
            .cells
            .iterate_range(range, populated_only)
            .map(|(pos, _)| pos)
            .find(|pos| Some(*pos) != skip && self.state.is_locked(*pos));
        match locked {
            Some(cell) => Err(GridError::LockedCellViolation { cell }),
            None => Ok(()),
        }
    }
}
