use std::collections::BTreeMap;

use proptest::prelude::*;

use sheetcore_grid::sparse::RadixTree;
use sheetcore_grid::{
    Action, Axis, BorderSpanIndex, BorderStyle, Cell, CellPosition, CellValue, EdgeMask, Extent,
    GridConfig, LineStyle, MergedRangeSet, OutlineNode, RangePosition, ShiftOperation, Worksheet,
};

const ROWS: u32 = 24;
const COLS: u32 = 16;

fn arb_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::Row), Just(Axis::Column)]
}

fn arb_range() -> impl Strategy<Value = RangePosition> {
    (0..ROWS - 1, 0..COLS - 1, 1..5u32, 1..5u32)
        .prop_map(|(r, c, h, w)| RangePosition::new(r, c, h, w).unwrap())
}

fn arb_style() -> impl Strategy<Value = BorderStyle> {
    prop_oneof![
        Just(BorderStyle::THIN_BLACK),
        Just(BorderStyle::new(LineStyle::Thick, 0x000000)),
        Just(BorderStyle::new(LineStyle::Dashed, 0x3366FF)),
    ]
}

fn arb_mask() -> impl Strategy<Value = EdgeMask> {
    prop_oneof![
        Just(EdgeMask::ALL),
        Just(EdgeMask::OUTSIDE),
        Just(EdgeMask::INSIDE),
        Just(EdgeMask::TOP | EdgeMask::LEFT),
        Just(EdgeMask::BOTTOM),
    ]
}

fn arb_action() -> impl Strategy<Value = Action<CellValue>> {
    prop_oneof![
        (arb_axis(), 0..ROWS, 1..4u32)
            .prop_map(|(axis, index, count)| Action::InsertLines { axis, index, count }),
        (arb_axis(), 0..ROWS, 1..4u32).prop_map(|(axis, index, count)| Action::DeleteLines {
            axis,
            index,
            count,
            force: true,
        }),
        arb_range().prop_map(|range| Action::Merge { range, force: true }),
        arb_range().prop_map(|range| Action::Unmerge { range }),
        (arb_range(), arb_mask(), proptest::option::of(arb_style()))
            .prop_map(|(range, mask, style)| Action::SetBorder { range, mask, style }),
        (0..ROWS, 0..COLS, -50i32..50).prop_map(|(r, c, v)| Action::SetCell {
            pos: CellPosition::new(r, c),
            cell: Some(Cell::new(CellValue::Number(v as f64))),
        }),
        (0..ROWS, 0..COLS).prop_map(|(r, c)| Action::SetCell {
            pos: CellPosition::new(r, c),
            cell: None,
        }),
        (arb_axis(), 0..ROWS, 1..8u32)
            .prop_map(|(axis, start, count)| Action::AddOutline { axis, start, count }),
        (arb_axis(), 0..ROWS, 1..8u32, any::<bool>()).prop_map(
            |(axis, start, count, collapsed)| Action::SetOutlineCollapsed {
                axis,
                start,
                count,
                collapsed,
            }
        ),
        (0..4usize, arb_range()).prop_map(|(i, range)| Action::DefineName {
            name: format!("name_{i}"),
            range,
            auto_adjust: i != 3,
        }),
        (arb_axis(), 0..ROWS, proptest::option::of(5..60u32))
            .prop_map(|(axis, line, size)| Action::SetLineSize { axis, line, size }),
    ]
}

#[derive(Debug, PartialEq)]
struct Snapshot {
    cells: Vec<(CellPosition, Cell<CellValue>)>,
    borders: BorderSpanIndex,
    merges: Vec<RangePosition>,
    outlines: Vec<(Axis, Vec<Vec<OutlineNode>>)>,
    names: Vec<(String, Option<RangePosition>)>,
    sizes: Vec<u32>,
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
        outlines: [Axis::Row, Axis::Column]
            .into_iter()
            .map(|axis| (axis, ws.outlines(axis)))
            .collect(),
        names: ws
            .named_ranges()
            .map(|n| (n.name().to_string(), n.target()))
            .collect(),
        sizes: (0..40)
            .flat_map(|i| {
                [
                    ws.intrinsic_line_size(Axis::Row, i),
                    ws.intrinsic_line_size(Axis::Column, i),
                ]
            })
            .collect(),
        extent: (ws.row_count(), ws.col_count()),
    }
}

fn fresh() -> Worksheet {
    Worksheet::with_config(
        GridConfig::default()
            .with_initial_size(ROWS, COLS)
            .with_max_size(64, 48),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_edits_keep_invariants_and_undo_exactly(
        actions in proptest::collection::vec(arb_action(), 1..30)
    ) {
        let mut ws = fresh();
        let initial = snapshot(&ws);

        for action in actions {
            // Rejected actions must leave no trace; accepted ones keep invariants.
            let before = snapshot(&ws);
            if ws.apply(action).is_err() {
                prop_assert_eq!(snapshot(&ws), before);
            }
            ws.assert_invariants();
        }
        let last = snapshot(&ws);

        while ws.undo().unwrap() {
            ws.assert_invariants();
        }
        prop_assert_eq!(snapshot(&ws), initial);

        while ws.redo().unwrap() {}
        prop_assert_eq!(snapshot(&ws), last);
    }

    #[test]
    fn merged_regions_stay_disjoint(
        ranges in proptest::collection::vec(arb_range(), 1..20),
        shifts in proptest::collection::vec((arb_axis(), 0..ROWS, 1..4u32, any::<bool>()), 0..6),
    ) {
        let mut set = MergedRangeSet::new();
        for range in ranges {
            let _ = set.merge(range);
        }
        set.assert_invariants();
        for (axis, index, count, insert) in shifts {
            let op = if insert {
                ShiftOperation::insert(axis, index, count)
            } else {
                ShiftOperation::delete(axis, index, count)
            };
            set.apply_shift(&op);
            set.assert_invariants();
        }
        let regions = set.regions();
        for (i, a) in regions.iter().enumerate() {
            prop_assert!(!a.is_single_cell());
            for b in &regions[i + 1..] {
                prop_assert!(!a.intersects(b), "{} intersects {}", a, b);
            }
        }
    }

    #[test]
    fn border_writes_stay_canonical(
        writes in proptest::collection::vec(
            (arb_range(), arb_mask(), proptest::option::of(arb_style())),
            1..25,
        ),
        shift in (arb_axis(), 0..ROWS, 1..4u32, any::<bool>()),
    ) {
        let mut index = BorderSpanIndex::new();
        for (range, mask, style) in &writes {
            match style {
                Some(style) => index.set_border(range, *mask, *style),
                None => index.remove_border(range, *mask),
            }
            index.assert_invariants();
        }
        let (axis, at, count, insert) = shift;
        let op = if insert {
            ShiftOperation::insert(axis, at, count)
        } else {
            ShiftOperation::delete(axis, at, count)
        };
        index.apply_shift(&op);
        index.assert_invariants();
    }

    #[test]
    fn insert_then_delete_is_identity(
        actions in proptest::collection::vec(arb_action(), 1..20),
        axis in arb_axis(),
        index in 0..ROWS,
        count in 1..6u32,
    ) {
        let mut ws = fresh();
        for action in actions {
            let _ = ws.apply(action);
        }
        let before = snapshot(&ws);
        let max_row = ws.max_content_row();

        // The sheet may already sit at its configured maximum.
        let Ok(inserted) = ws.insert_lines(axis, index, count) else {
            return Ok(());
        };
        ws.delete_lines(axis, inserted.index, inserted.count, false).unwrap();

        let after = snapshot(&ws);
        prop_assert_eq!(&after.cells, &before.cells);
        prop_assert_eq!(&after.borders, &before.borders);
        prop_assert_eq!(&after.merges, &before.merges);
        prop_assert_eq!(&after.outlines, &before.outlines);
        prop_assert_eq!(ws.max_content_row(), max_row);
    }
}

#[derive(Debug, Clone, Copy)]
enum Gap {
    Open(u32, u32),
    Close(u32, u32),
}

fn arb_gap() -> impl Strategy<Value = Gap> {
    // Multiples of 16 and 256 exercise whole-subtree moves.
    let count = prop_oneof![1..20u32, Just(16u32), (1..4u32).prop_map(|k| k * 256)];
    (any::<bool>(), 0..4096u32, count).prop_map(|(open, at, count)| {
        if open {
            Gap::Open(at, count)
        } else {
            Gap::Close(at, count)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn radix_gaps_match_an_ordered_map(
        keys in proptest::collection::btree_set(0..4000u32, 0..200),
        gaps in proptest::collection::vec(arb_gap(), 1..12),
    ) {
        const LIMIT: u32 = 4000;
        let mut tree = RadixTree::new(3);
        let mut model = BTreeMap::new();
        for key in keys {
            tree.insert(key, key);
            model.insert(key, key);
        }
        for gap in gaps {
            let mut next = BTreeMap::new();
            let mut taken = Vec::new();
            match gap {
                Gap::Open(at, count) => {
                    for (&k, &v) in &model {
                        if k < at {
                            next.insert(k, v);
                        } else if (k as u64 + count as u64) < LIMIT as u64 {
                            next.insert(k + count, v);
                        } else {
                            taken.push((k, v));
                        }
                    }
                    prop_assert_eq!(tree.open_gap(at, count, LIMIT), taken, "{:?}", gap);
                }
                Gap::Close(at, count) => {
                    let end = at as u64 + count as u64;
                    for (&k, &v) in &model {
                        if k < at {
                            next.insert(k, v);
                        } else if (k as u64) < end {
                            taken.push((k, v));
                        } else {
                            next.insert(k - count, v);
                        }
                    }
                    prop_assert_eq!(tree.close_gap(at, count), taken, "{:?}", gap);
                }
            }
            model = next;
            let entries: Vec<(u32, u32)> = tree.iter().map(|(k, v)| (k, *v)).collect();
            let expected: Vec<(u32, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(entries, expected, "after {:?}", gap);
            prop_assert_eq!(tree.is_empty(), model.is_empty());
        }
    }
}
