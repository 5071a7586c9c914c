//! Undoable edits.
//!
//! An [`Action`] only carries the parameters of an edit. Performing it
//! against a sheet yields the revert payload that the undo stack keeps
//! alongside it; redo simply performs the action again.

use sheetcore_common::{Axis, CellPosition, GridError, RangePosition};

use crate::border::{BorderStyle, EdgeMask};
use crate::cell::Cell;
use crate::mutator::{Revert, ShiftSummary, StructuralMutator};
use crate::sheet::SheetState;
use crate::style::StyleLayer;

#[derive(Debug, Clone, PartialEq)]
pub enum Action<V> {
    InsertLines {
        axis: Axis,
        index: u32,
        count: u32,
    },
    DeleteLines {
        axis: Axis,
        index: u32,
        count: u32,
        force: bool,
    },
    Merge {
        range: RangePosition,
        force: bool,
    },
    Unmerge {
        range: RangePosition,
    },
    /// `style: None` removes the selected edges.
    SetBorder {
        range: RangePosition,
        mask: EdgeMask,
        style: Option<BorderStyle>,
    },
    /// `cell: None` clears the position.
    SetCell {
        pos: CellPosition,
        cell: Option<Cell<V>>,
    },
    DefineName {
        name: String,
        range: RangePosition,
        auto_adjust: bool,
    },
    RemoveName {
        name: String,
    },
    AddOutline {
        axis: Axis,
        start: u32,
        count: u32,
    },
    RemoveOutline {
        axis: Axis,
        start: u32,
        count: u32,
    },
    SetOutlineCollapsed {
        axis: Axis,
        start: u32,
        count: u32,
        collapsed: bool,
    },
    SetLineSize {
        axis: Axis,
        line: u32,
        size: Option<u32>,
    },
    SetLineStyle {
        axis: Axis,
        line: u32,
        style: Option<StyleLayer>,
    },
    /// Several actions applied, undone and redone as one unit.
    Batch {
        label: String,
        actions: Vec<Action<V>>,
    },
}

/// Result of performing an action: what it reports plus how to revert it.
pub(crate) struct Performed<V> {
    pub(crate) outcome: Outcome,
    pub(crate) revert: Revert<V>,
}

/// What a performed action reports to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Outcome {
    #[default]
    Done,
    Shifted(ShiftSummary),
    Merged(bool),
    Unmerged(Vec<RangePosition>),
}

impl<V> Action<V> {
    pub fn insert_rows(index: u32, count: u32) -> Self {
        Action::InsertLines {
            axis: Axis::Row,
            index,
            count,
        }
    }

    pub fn insert_columns(index: u32, count: u32) -> Self {
        Action::InsertLines {
            axis: Axis::Column,
            index,
            count,
        }
    }

    pub fn delete_rows(index: u32, count: u32) -> Self {
        Action::DeleteLines {
            axis: Axis::Row,
            index,
            count,
            force: false,
        }
    }

    pub fn delete_columns(index: u32, count: u32) -> Self {
        Action::DeleteLines {
            axis: Axis::Column,
            index,
            count,
            force: false,
        }
    }

    pub fn batch<S: Into<String>>(label: S, actions: Vec<Action<V>>) -> Self {
        Action::Batch {
            label: label.into(),
            actions,
        }
    }

    /// Short label for undo/redo menus.
    pub fn describe(&self) -> String {
        fn lines(axis: Axis) -> &'static str {
            match axis {
                Axis::Row => "Rows",
                Axis::Column => "Columns",
            }
        }
        match self {
            Action::InsertLines { axis, index, count } => {
                format!("Insert{}(index={index}, count={count})", lines(*axis))
            }
            Action::DeleteLines {
                axis, index, count, ..
            } => format!("Delete{}(index={index}, count={count})", lines(*axis)),
            Action::Merge { range, .. } => format!("Merge({range})"),
            Action::Unmerge { range } => format!("Unmerge({range})"),
            Action::SetBorder {
                range,
                style: Some(_),
                ..
            } => format!("SetBorder({range})"),
            Action::SetBorder { range, .. } => format!("RemoveBorder({range})"),
            Action::SetCell { pos, cell: Some(_) } => format!("SetCell({pos})"),
            Action::SetCell { pos, .. } => format!("ClearCell({pos})"),
            Action::DefineName { name, .. } => format!("DefineName({name})"),
            Action::RemoveName { name } => format!("RemoveName({name})"),
            Action::AddOutline { axis, start, count } => {
                format!("AddOutline({axis}, start={start}, count={count})")
            }
            Action::RemoveOutline { axis, start, count } => {
                format!("RemoveOutline({axis}, start={start}, count={count})")
            }
            Action::SetOutlineCollapsed {
                axis,
                start,
                collapsed,
                ..
            } => {
                let verb = if *collapsed { "Collapse" } else { "Expand" };
                format!("{verb}Outline({axis}, start={start})")
            }
            Action::SetLineSize { axis, line, .. } => format!("SetSize({axis} {line})"),
            Action::SetLineStyle { axis, line, .. } => format!("SetStyle({axis} {line})"),
            Action::Batch { label, .. } => label.clone(),
        }
    }
}

impl<V: Clone> Action<V> {
    pub(crate) fn perform(&self, state: &mut SheetState<V>) -> Result<Performed<V>, GridError> {
        let mut mutator = StructuralMutator::new(state);
        let (outcome, revert) = match self {
            Action::InsertLines { axis, index, count } => {
                let (summary, revert) = mutator.insert_lines(*axis, *index, *count)?;
                (Outcome::Shifted(summary), revert)
            }
            Action::DeleteLines {
                axis,
                index,
                count,
                force,
            } => {
                let (summary, revert) = mutator.delete_lines(*axis, *index, *count, *force)?;
                (Outcome::Shifted(summary), revert)
            }
            Action::Merge { range, force } => {
                let (merged, revert) = mutator.merge_range(range, *force)?;
                (Outcome::Merged(merged), revert)
            }
            Action::Unmerge { range } => {
                let (regions, revert) = mutator.unmerge_range(range);
                (Outcome::Unmerged(regions), revert)
            }
            Action::SetBorder { range, mask, style } => {
                (Outcome::Done, mutator.set_border(range, *mask, *style)?)
            }
            Action::SetCell { pos, cell } => (Outcome::Done, mutator.set_cell(*pos, cell.clone())?),
            Action::DefineName {
                name,
                range,
                auto_adjust,
            } => (Outcome::Done, mutator.define_name(name, *range, *auto_adjust)?),
            Action::RemoveName { name } => (Outcome::Done, mutator.remove_name(name)?),
            Action::AddOutline { axis, start, count } => {
                (Outcome::Done, mutator.add_outline(*axis, *start, *count)?)
            }
            Action::RemoveOutline { axis, start, count } => {
                (Outcome::Done, mutator.remove_outline(*axis, *start, *count)?)
            }
            Action::SetOutlineCollapsed {
                axis,
                start,
                count,
                collapsed,
            } => (
                Outcome::Done,
                mutator.set_outline_collapsed(*axis, *start, *count, *collapsed)?,
            ),
            Action::SetLineSize { axis, line, size } => {
                (Outcome::Done, mutator.set_line_size(*axis, *line, *size)?)
            }
            Action::SetLineStyle { axis, line, style } => (
                Outcome::Done,
                mutator.set_line_style(*axis, *line, style.clone())?,
            ),
            Action::Batch { label, actions } => {
                return perform_batch(label, actions, state);
            }
        };
        Ok(Performed { outcome, revert })
    }
}

/// All-or-nothing: a failing step reverts the steps before it.
fn perform_batch<V: Clone>(
    label: &str,
    actions: &[Action<V>],
    state: &mut SheetState<V>,
) -> Result<Performed<V>, GridError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("batch", label, steps = actions.len()).entered();
    #[cfg(not(feature = "tracing"))]
    let _ = label;

    let extents = state.extents();
    let mut done = Vec::with_capacity(actions.len());
    for action in actions {
        match action.perform(state) {
            Ok(performed) => done.push(performed.revert),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%err, completed = done.len(), "batch step failed, rolling back");
                StructuralMutator::new(state).revert(Revert::Batch(done))?;
                state.set_extents(extents);
                state.refresh_content_bounds();
                return Err(err);
            }
        }
    }
    let revert = if done.iter().all(Revert::is_nothing) {
        Revert::Nothing
    } else {
        Revert::Batch(done)
    };
    Ok(Performed {
        outcome: Outcome::Done,
        revert,
    })
}
