use std::cell::RefCell;
use std::rc::Rc;

use sheetcore_grid::{
    Axis, BorderEdge, BorderStyle, CellPosition, CellValue, ChangeEvent, EdgeMask, EditKind,
    Extent, GridConfig, GridError, RangePosition, Worksheet,
};

fn sheet(rows: u32, cols: u32) -> Worksheet {
    Worksheet::with_config(GridConfig::default().with_initial_size(rows, cols))
}

fn range(a1: &str) -> RangePosition {
    RangePosition::from_a1(a1).unwrap()
}

#[test]
fn delete_columns_through_merge_shrinks_region() {
    let mut ws = sheet(20, 20);
    ws.merge_range(RangePosition::new(1, 1, 10, 10).unwrap(), false)
        .unwrap();

    let summary = ws.delete_columns(3, 3).unwrap();

    assert_eq!(ws.col_count(), 17);
    assert_eq!(
        ws.merged_regions(),
        vec![RangePosition::new(1, 1, 10, 7).unwrap()]
    );
    assert_eq!(summary.merges_resized.len(), 1);
    assert!(ws.is_merged_anchor(CellPosition::new(1, 1)));
    assert!(ws.is_merged_cell(CellPosition::new(10, 7)));
    assert!(!ws.is_merged_cell(CellPosition::new(10, 8)));
    ws.assert_invariants();
}

#[test]
fn overlapping_outside_borders_stay_canonical() {
    let mut ws = sheet(20, 20);
    let thin = BorderStyle::THIN_BLACK;
    ws.set_border(RangePosition::new(1, 1, 2, 10).unwrap(), EdgeMask::OUTSIDE, thin)
        .unwrap();
    ws.set_border(RangePosition::new(1, 5, 10, 2).unwrap(), EdgeMask::OUTSIDE, thin)
        .unwrap();
    ws.assert_invariants();

    let index = ws.border_index();
    // Row 1 top edge: one run across both boxes.
    assert_eq!(index.runs(BorderEdge::Top, 1).len(), 1);
    assert_eq!(index.runs(BorderEdge::Top, 1)[0].start, 1);
    assert_eq!(index.runs(BorderEdge::Top, 1)[0].len, 10);
    // Left edge of column 5 covers the second box's rows.
    assert_eq!(index.style_at(BorderEdge::Left, 5, 8), Some(thin));
    assert_eq!(index.style_at(BorderEdge::Left, 5, 11), None);

    let info = ws.borders(&RangePosition::new(1, 1, 2, 10).unwrap());
    assert_eq!(info.top, Some(thin));
    assert_eq!(info.left, Some(thin));
}

/// Floating shape anchored by top row plus a row span, kept in sync through
/// the change hook the way a drawing layer would.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Shape {
    top_row: u32,
    rows: u32,
}

impl Shape {
    fn on_change(&mut self, event: &ChangeEvent) {
        let Extent::Lines(count) = event.range.rows() else {
            return;
        };
        if event.kind != EditKind::Insert || !event.range.cols().is_entire() {
            return;
        }
        let index = event.range.row();
        if index < self.top_row {
            self.top_row += count;
        } else if index < self.top_row + self.rows {
            self.rows += count;
        }
    }
}

#[test]
fn shape_layer_follows_row_inserts() {
    let mut ws = sheet(20, 10);
    let shape = Rc::new(RefCell::new(Shape { top_row: 2, rows: 2 }));
    let listener = Rc::clone(&shape);
    ws.subscribe(move |event: &ChangeEvent| listener.borrow_mut().on_change(event));

    let height = ws.config().default_row_height as u64;
    let top_offset = |ws: &Worksheet, s: Shape| ws.line_offset(Axis::Row, s.top_row);
    let span = |ws: &Worksheet, s: Shape| {
        ws.line_offset(Axis::Row, s.top_row + s.rows) - ws.line_offset(Axis::Row, s.top_row)
    };

    let before = *shape.borrow();
    let (top0, height0) = (top_offset(&ws, before), span(&ws, before));

    ws.insert_rows(0, 2).unwrap();
    let moved = *shape.borrow();
    assert_eq!(top_offset(&ws, moved), top0 + 2 * height);
    assert_eq!(span(&ws, moved), height0);

    ws.insert_rows(4, 2).unwrap();
    let grown = *shape.borrow();
    assert_eq!(top_offset(&ws, grown), top0 + 2 * height);
    assert_eq!(span(&ws, grown), height0 + 2 * height);
}

#[test]
fn deleting_exactly_a_merged_region_removes_it() {
    let mut ws = sheet(30, 20);
    let region = RangePosition::new(5, 1, 10, 10).unwrap();
    ws.merge_range(region, false).unwrap();

    let summary = ws.delete_rows(5, 10).unwrap();

    assert_eq!(summary.merges_removed, vec![region]);
    assert!(ws.merged_regions().is_empty());
    assert!(!ws.is_merged_cell(CellPosition::new(6, 1)));
    assert_eq!(ws.row_count(), 20);
    ws.assert_invariants();
}

#[test]
fn named_ranges_track_row_inserts() {
    let mut ws = sheet(20, 10);
    ws.define_name("r1", range("B3:C5")).unwrap();
    ws.define_name("r2", range("C8:E11")).unwrap();

    let summary = ws.insert_rows(6, 2).unwrap();

    assert_eq!(ws.resolve_name("r1"), Ok(range("B3:C5")));
    assert_eq!(ws.resolve_name("r2"), Ok(range("C10:E13")));
    assert_eq!(summary.names_adjusted, vec!["r2".to_string()]);
}

#[test]
fn name_over_deleted_rows_dangles_until_undo() {
    let mut ws = sheet(20, 10);
    ws.define_name("block", range("A4:D6")).unwrap();
    ws.delete_rows(2, 6).unwrap();
    assert_eq!(
        ws.resolve_name("block"),
        Err(GridError::DanglingName("block".into()))
    );
    ws.undo().unwrap();
    assert_eq!(ws.resolve_name("block"), Ok(range("A4:D6")));
}

#[test]
fn payloads_follow_their_address() {
    let mut ws = sheet(20, 10);
    let b3 = CellPosition::from_a1("B3").unwrap();
    ws.set_value(b3, CellValue::Text("anchor".into())).unwrap();
    ws.merge_range(range("B3:C4"), false).unwrap();

    ws.insert_rows(0, 3).unwrap();
    ws.insert_columns(1, 1).unwrap();

    let moved = CellPosition::from_a1("C6").unwrap();
    assert_eq!(ws.value(moved), Some(&CellValue::Text("anchor".into())));
    assert_eq!(ws.merged_region(moved), Some(range("C6:D7")));
    assert_eq!(ws.value(b3), None);
    ws.assert_invariants();
}

#[test]
fn outline_groups_shift_and_clip() {
    let mut ws = sheet(40, 10);
    ws.add_outline(Axis::Row, 5, 10).unwrap();
    ws.add_outline(Axis::Row, 7, 2).unwrap();
    assert_eq!(
        ws.add_outline(Axis::Row, 12, 6),
        Err(GridError::AmbiguousOutlineNesting {
            axis: Axis::Row,
            start: 12,
            count: 6,
            other_start: 5,
            other_count: 10,
        })
    );

    ws.delete_rows(3, 5).unwrap();
    let levels = ws.outlines(Axis::Row);
    assert_eq!(levels.len(), 2);
    assert_eq!((levels[0][0].start, levels[0][0].count), (3, 7));
    assert_eq!((levels[1][0].start, levels[1][0].count), (3, 1));

    ws.collapse_outline(Axis::Row, 3, 7).unwrap();
    assert!(ws.is_line_hidden(Axis::Row, 9));
    assert!(!ws.is_line_hidden(Axis::Row, 10));
    ws.assert_invariants();
}

#[test]
fn merge_refuses_a_locked_empty_cell() {
    let mut ws = sheet(20, 20);
    let locked = CellPosition::from_a1("C5").unwrap();
    ws.set_lock_predicate(move |p: CellPosition| p == locked);
    ws.set_value(CellPosition::from_a1("A5").unwrap(), CellValue::Number(1.0))
        .unwrap();
    ws.clear_history();

    assert_eq!(
        ws.merge_range(range("A5:D5"), false),
        Err(GridError::LockedCellViolation { cell: locked })
    );
    assert!(ws.merged_regions().is_empty());
    assert!(!ws.can_undo());

    assert_eq!(ws.merge_range(range("A5:D5"), true), Ok(true));
    assert_eq!(ws.merged_regions(), vec![range("A5:D5")]);
}
