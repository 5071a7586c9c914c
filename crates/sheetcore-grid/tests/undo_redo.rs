use sheetcore_grid::{
    Action, Axis, BorderSpanIndex, BorderStyle, Cell, CellPosition, CellValue, EdgeMask, Extent,
    GridConfig, GridError, LineHeaders, LineStyle, NamedRange, OutlineAxis, RangePosition,
    StyleLayer, Worksheet,
};

/// Everything undo must restore, captured through the public read API.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    cells: Vec<(CellPosition, Cell<CellValue>)>,
    borders: BorderSpanIndex,
    merges: Vec<RangePosition>,
    row_outlines: OutlineAxis,
    col_outlines: OutlineAxis,
    names: Vec<NamedRange>,
    row_headers: LineHeaders,
    col_headers: LineHeaders,
    extent: (u32, u32),
}

fn snapshot(ws: &Worksheet) -> Snapshot {
    let everything = RangePosition::with_extents(0, 0, Extent::Entire, Extent::Entire).unwrap();
    Snapshot {
        cells: ws
            .cells_in(&everything)
            .map(|(pos, cell)| (pos, cell.clone()))
            .collect(),
        borders: ws.border_index().clone(),
        merges: ws.merged_regions(),
        row_outlines: ws.outline_axis(Axis::Row).clone(),
        col_outlines: ws.outline_axis(Axis::Column).clone(),
        names: ws.named_ranges().cloned().collect(),
        row_headers: ws.line_headers(Axis::Row).clone(),
        col_headers: ws.line_headers(Axis::Column).clone(),
        extent: (ws.row_count(), ws.col_count()),
    }
}

fn range(a1: &str) -> RangePosition {
    RangePosition::from_a1(a1).unwrap()
}

fn pos(a1: &str) -> CellPosition {
    CellPosition::from_a1(a1).unwrap()
}

fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

/// A sheet with a bit of everything in it.
fn populated() -> Worksheet {
    let mut ws = Worksheet::with_config(GridConfig::default().with_initial_size(30, 15));
    for r in 0..25 {
        for c in [0, 2, 5, 9] {
            ws.load_cell(CellPosition::new(r, c), Cell::new(num((r * 100 + c) as f64)))
                .unwrap();
        }
    }
    ws.finish_load();
    ws.merge_range(range("C3:E6"), true).unwrap();
    ws.merge_range(range("G10:H20"), true).unwrap();
    ws.set_border(range("B2:F8"), EdgeMask::ALL, BorderStyle::THIN_BLACK)
        .unwrap();
    ws.set_border(
        range("D5:J12"),
        EdgeMask::OUTSIDE,
        BorderStyle::new(LineStyle::Double, 0xFF0000),
    )
    .unwrap();
    ws.add_outline(Axis::Row, 4, 12).unwrap();
    ws.add_outline(Axis::Row, 6, 3).unwrap();
    ws.add_outline(Axis::Column, 2, 4).unwrap();
    ws.collapse_outline(Axis::Row, 6, 3).unwrap();
    ws.define_name("top", range("A1:C2")).unwrap();
    ws.define_name("middle", range("B6:D9")).unwrap();
    ws.define_name_with("pinned", range("E7"), false).unwrap();
    ws.set_line_size(Axis::Row, 7, Some(33)).unwrap();
    ws.set_line_size(Axis::Column, 3, Some(120)).unwrap();
    ws.set_line_style(Axis::Row, 8, Some(StyleLayer::new().with_fill(0x00FF00)))
        .unwrap();
    ws.clear_history();
    ws
}

/// Apply `action`, undo it, redo it, and check both directions are exact.
fn check_round_trip(ws: &mut Worksheet, action: Action<CellValue>) {
    let label = action.describe();
    let before = snapshot(ws);
    ws.apply(action).unwrap_or_else(|e| panic!("{label} failed: {e}"));
    let after = snapshot(ws);
    ws.assert_invariants();

    assert!(ws.undo().unwrap(), "{label} left nothing to undo");
    assert_eq!(snapshot(ws), before, "undo of {label} is not exact");
    ws.assert_invariants();

    assert!(ws.redo().unwrap(), "{label} left nothing to redo");
    assert_eq!(snapshot(ws), after, "redo of {label} diverged");
    ws.assert_invariants();
}

#[test]
fn every_action_undoes_exactly() {
    let actions: Vec<Action<CellValue>> = vec![
        Action::insert_rows(5, 3),
        Action::insert_rows(0, 1),
        Action::insert_columns(3, 2),
        Action::delete_rows(4, 3),
        Action::delete_rows(9, 6),
        Action::delete_columns(2, 2),
        Action::delete_columns(6, 3),
        Action::DeleteLines {
            axis: Axis::Row,
            index: 0,
            count: 12,
            force: false,
        },
        Action::Merge {
            range: range("J1:K2"),
            force: false,
        },
        Action::Unmerge {
            range: range("A1:Z30"),
        },
        Action::SetBorder {
            range: range("A1:L20"),
            mask: EdgeMask::INSIDE,
            style: Some(BorderStyle::THIN_BLACK),
        },
        Action::SetBorder {
            range: range("C3:E10"),
            mask: EdgeMask::ALL,
            style: None,
        },
        Action::SetCell {
            pos: pos("A1"),
            cell: Some(Cell::new(CellValue::Text("hello".into()))),
        },
        Action::SetCell {
            pos: pos("C3"),
            cell: None,
        },
        Action::DefineName {
            name: "fresh".into(),
            range: range("A10:A12"),
            auto_adjust: true,
        },
        Action::RemoveName {
            name: "middle".into(),
        },
        Action::AddOutline {
            axis: Axis::Column,
            start: 8,
            count: 2,
        },
        Action::RemoveOutline {
            axis: Axis::Row,
            start: 4,
            count: 12,
        },
        Action::SetOutlineCollapsed {
            axis: Axis::Row,
            start: 4,
            count: 12,
            collapsed: true,
        },
        Action::SetLineSize {
            axis: Axis::Row,
            line: 7,
            size: None,
        },
        Action::SetLineStyle {
            axis: Axis::Column,
            line: 0,
            style: Some(StyleLayer::new().with_italic(true)),
        },
    ];

    for action in actions {
        let mut ws = populated();
        check_round_trip(&mut ws, action);
    }
}

#[test]
fn undo_walks_back_a_long_history() {
    let mut ws = populated();
    let start = snapshot(&ws);
    let mut history = vec![start.clone()];

    ws.insert_rows(10, 4).unwrap();
    history.push(snapshot(&ws));
    ws.delete_columns(1, 3).unwrap();
    history.push(snapshot(&ws));
    ws.merge_range(range("A20:B25"), false).unwrap();
    history.push(snapshot(&ws));
    ws.delete_rows(2, 9).unwrap();
    history.push(snapshot(&ws));
    ws.insert_columns(0, 5).unwrap();

    while let Some(expected) = history.pop() {
        assert!(ws.undo().unwrap());
        assert_eq!(snapshot(&ws), expected);
    }
    assert!(!ws.can_undo());
    assert!(!ws.undo().unwrap());
    assert_eq!(snapshot(&ws), start);
}

#[test]
fn new_action_discards_redo_tail() {
    let mut ws = populated();
    ws.insert_rows(0, 2).unwrap();
    ws.insert_rows(0, 3).unwrap();
    ws.undo().unwrap();
    ws.undo().unwrap();
    assert!(ws.can_redo());
    assert_eq!(ws.redo_label().as_deref(), Some("InsertRows(index=0, count=2)"));

    ws.set_value(pos("A1"), num(7.0)).unwrap();
    assert!(!ws.can_redo());
    assert!(!ws.redo().unwrap());
}

#[test]
fn undo_limit_drops_oldest_entries() {
    let mut ws: Worksheet =
        Worksheet::with_config(GridConfig::default().with_initial_size(10, 10).with_undo_limit(3));
    for i in 0..5 {
        ws.set_value(CellPosition::new(i, 0), num(i as f64)).unwrap();
    }
    let mut undone = 0;
    while ws.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(ws.value(CellPosition::new(1, 0)), Some(&num(1.0)));
    assert_eq!(ws.value(CellPosition::new(2, 0)), None);
}

#[test]
fn batch_is_one_history_entry() {
    let mut ws = populated();
    let before = snapshot(&ws);
    ws.apply(Action::batch(
        "Insert table",
        vec![
            Action::insert_rows(2, 5),
            Action::Merge {
                range: range("A3:B3"),
                force: false,
            },
            Action::SetBorder {
                range: range("A3:D7"),
                mask: EdgeMask::OUTSIDE,
                style: Some(BorderStyle::THIN_BLACK),
            },
            Action::DefineName {
                name: "table".into(),
                range: range("A3:D7"),
                auto_adjust: true,
            },
        ],
    ))
    .unwrap();
    assert_eq!(ws.undo_label().as_deref(), Some("Insert table"));
    assert_eq!(ws.resolve_name("table"), Ok(range("A3:D7")));

    ws.undo().unwrap();
    assert_eq!(snapshot(&ws), before);
    assert!(!ws.can_undo());
    assert_eq!(ws.redo_label().as_deref(), Some("Insert table"));
}

#[test]
fn failing_action_changes_nothing() {
    let mut ws = populated();
    let before = snapshot(&ws);
    let undo_label = ws.undo_label();

    assert!(matches!(
        ws.merge_range(range("D5:H12"), false),
        Err(GridError::IntersectedMerge { .. })
    ));
    assert!(matches!(
        ws.set_value(pos("D4"), num(1.0)),
        Err(GridError::CoveredByMerge { .. })
    ));
    assert_eq!(
        ws.define_name("TOP", range("A1")),
        Err(GridError::DuplicateName("TOP".into()))
    );
    assert!(matches!(
        ws.apply(Action::batch(
            "half done",
            vec![
                Action::insert_columns(0, 2),
                Action::RemoveName {
                    name: "nope".into(),
                },
            ],
        )),
        Err(GridError::NameNotFound(_))
    ));

    assert_eq!(snapshot(&ws), before);
    assert_eq!(ws.undo_label(), undo_label);
    assert!(!ws.can_undo());
}

#[test]
fn insert_then_delete_restores_structure() {
    for (axis, index, count) in [(Axis::Row, 5, 4), (Axis::Row, 0, 2), (Axis::Column, 3, 3)] {
        let mut ws = populated();
        let before = snapshot(&ws);
        let max_row = ws.max_content_row();
        let inserted = ws.insert_lines(axis, index, count).unwrap();
        ws.delete_lines(axis, inserted.index, inserted.count, false)
            .unwrap();
        let after = snapshot(&ws);
        assert_eq!(after.borders, before.borders, "{axis} {index}+{count}");
        assert_eq!(after.merges, before.merges);
        assert_eq!(after.row_outlines, before.row_outlines);
        assert_eq!(after.col_outlines, before.col_outlines);
        assert_eq!(after.cells, before.cells);
        assert_eq!(ws.max_content_row(), max_row);
    }
}

#[test]
fn undoing_an_insert_restores_lines_pushed_off_the_grid() {
    for axis in [Axis::Row, Axis::Column] {
        let last = axis.limit() - 1;
        let far = match axis {
            Axis::Row => CellPosition::new(last, 0),
            Axis::Column => CellPosition::new(0, last),
        };
        let mut ws: Worksheet = Worksheet::new();
        ws.define_name("far", RangePosition::cell(far)).unwrap();
        ws.add_outline(axis, last - 1, 2).unwrap();
        ws.collapse_outline(axis, last - 1, 2).unwrap();
        ws.set_line_size(axis, last, Some(55)).unwrap();
        ws.set_line_style(axis, last - 1, Some(StyleLayer::new().with_bold(true)))
            .unwrap();
        let before = snapshot(&ws);

        ws.insert_lines(axis, 0, 1).unwrap();
        assert_eq!(
            ws.resolve_name("far"),
            Err(GridError::DanglingName("far".into())),
            "{axis}"
        );
        assert_eq!(ws.line_headers(axis).size_override(last), None);
        assert!(ws.outline_axis(axis).get(last - 1, 2).is_none());

        assert!(ws.undo().unwrap());
        assert_eq!(snapshot(&ws), before, "undo of an insert along {axis}");
        assert!(ws.is_line_hidden(axis, last));
        ws.assert_invariants();

        assert!(ws.redo().unwrap());
        assert!(ws.named_range("far").unwrap().is_dangling());
        assert!(ws.undo().unwrap());
        assert_eq!(snapshot(&ws), before, "second undo along {axis}");
    }
}

#[test]
fn undoing_a_delete_keeps_untouched_outlines() {
    let mut ws = populated();
    ws.add_outline(Axis::Column, 11, 2).unwrap();
    let before = snapshot(&ws);

    ws.delete_columns(1, 2).unwrap();
    // Edited after the delete; undo must only touch the nodes the delete disturbed.
    ws.collapse_outline(Axis::Column, 9, 2).unwrap();
    assert!(ws.undo().unwrap());
    assert!(ws.undo().unwrap());
    assert_eq!(snapshot(&ws), before);
}
