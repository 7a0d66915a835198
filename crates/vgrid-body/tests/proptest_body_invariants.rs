//! Property-based invariant tests for the grid body.
//!
//! 1. The height estimate never shrinks as the row range grows.
//! 2. A sorted row index map is a permutation of the logical rows, and its
//!    inverse round-trips.
//! 3. Sorting is stable: rows with equal keys keep their original order.
//!    Comparators are a total order even when numeric and non-numeric
//!    values share a column.
//! 4. Without sorting, corrected indices are the identity up to the page
//!    offset.
//! 5. Column classification partitions the flat column range.
//! 6. Window cell areas agree with the sum of the sizes before them.

use std::cmp::Ordering;
use std::collections::HashSet;

use proptest::prelude::*;
use vgrid_body::columns::ColumnKind;
use vgrid_body::schema::{Comparator, TYPE_NUMERIC, default_detectors};
use vgrid_body::{
    ColumnDefinition, ColumnLayout, ControlColumn, Density, EstimateInputs, InMemoryValues,
    Pagination, RowHeightOption, RowHeightRegistry, RowHeightsOptions, RowIndexMap,
    RowIndexMapper, Schema, SizeEstimator, SortDescriptor, SortDirection, VariableSizeGrid,
    WindowingPrimitive,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn option_strategy() -> impl Strategy<Value = RowHeightOption> {
    prop_oneof![
        (0u32..200).prop_map(RowHeightOption::Pixels),
        (0u32..6).prop_map(RowHeightOption::LineCount),
        proptest::option::of(0u32..120).prop_map(|min| RowHeightOption::Auto { min }),
    ]
}

fn options_strategy() -> impl Strategy<Value = RowHeightsOptions> {
    (
        proptest::option::of(option_strategy()),
        proptest::collection::hash_map(0usize..100, option_strategy(), 0..30),
    )
        .prop_map(|(default_height, row_heights)| RowHeightsOptions {
            default_height,
            row_heights,
        })
}

fn values_from(scores: &[u8]) -> InMemoryValues {
    let mut mem = InMemoryValues::new();
    for (row, score) in scores.iter().enumerate() {
        mem.set(row, "score", score.to_string());
    }
    mem
}

/// Mostly numbers, with some text that looks numeric at first glance.
fn mixed_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (0u32..200).prop_map(|n| n.to_string()),
        1 => "[0-9]{1,2}[a-z]",
        1 => "[a-z]{0,3}",
    ]
}

fn direction_strategy() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn control(id: usize) -> ControlColumn {
    ControlColumn::new(format!("control-{id}"), 30, |_| String::new())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Estimate monotonicity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn estimate_is_monotonic(
        options in options_strategy(),
        a in 0usize..100,
        b in 0usize..100,
        header in 0u32..80,
    ) {
        let registry = RowHeightRegistry::new(Density::Normal, 20);
        let mapper = RowIndexMapper::new();
        let inputs = EstimateInputs {
            registry: &registry,
            mapper: &mapper,
            options: Some(&options),
            default_height: 34,
            header_height: header,
            footer_height: 0,
            scroll_metrics: None,
        };
        let (short, long) = (a.min(b), a.max(b));
        let smaller = SizeEstimator.estimate_height(0..short, &inputs);
        let larger = SizeEstimator.estimate_height(0..long, &inputs);
        prop_assert!(
            smaller <= larger,
            "estimate shrank: 0..{} = {}, 0..{} = {}",
            short, smaller, long, larger
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Row index map is a bijection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn row_index_map_is_permutation(
        scores in proptest::collection::vec(any::<u8>(), 1..200),
        direction in direction_strategy(),
    ) {
        let mem = values_from(&scores);
        let sort = SortDescriptor::new().then_by("score", direction);
        let schema = Schema::new().with("score", TYPE_NUMERIC);
        let map = RowIndexMap::build(&sort, &mem, &schema, &default_detectors());

        prop_assert_eq!(map.len(), scores.len());
        let rows: HashSet<usize> = (0..map.len()).filter_map(|p| map.get(p)).collect();
        prop_assert_eq!(rows, (0..scores.len()).collect::<HashSet<_>>());

        let inverse = map.inverse();
        for row in 0..scores.len() {
            prop_assert_eq!(map.get(inverse[&row]), Some(row));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Sorting is stable
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sort_is_stable(
        scores in proptest::collection::vec(0u8..4, 1..120),
        direction in direction_strategy(),
    ) {
        let mem = values_from(&scores);
        let sort = SortDescriptor::new().then_by("score", direction);
        let schema = Schema::new().with("score", TYPE_NUMERIC);
        let map = RowIndexMap::build(&sort, &mem, &schema, &default_detectors());

        let order: Vec<usize> = (0..map.len()).filter_map(|p| map.get(p)).collect();
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if scores[a] == scores[b] {
                prop_assert!(a < b, "tie reordered: row {} before row {}", a, b);
            } else if direction == SortDirection::Asc {
                prop_assert!(scores[a] < scores[b]);
            } else {
                prop_assert!(scores[a] > scores[b]);
            }
        }
    }

    #[test]
    fn mixed_values_sort_consistently(
        values in proptest::collection::vec(mixed_value_strategy(), 1..60),
        direction in direction_strategy(),
    ) {
        let mut mem = InMemoryValues::new();
        for (row, value) in values.iter().enumerate() {
            mem.set(row, "score", value.clone());
        }
        let sort = SortDescriptor::new().then_by("score", direction);
        let schema = Schema::new().with("score", TYPE_NUMERIC);
        let map = RowIndexMap::build(&sort, &mem, &schema, &default_detectors());
        let order: Vec<usize> = (0..map.len()).filter_map(|p| map.get(p)).collect();

        let cmp = |a: usize, b: usize| {
            Comparator::Numeric.compare(Some(&values[a]), Some(&values[b]), direction)
        };
        // No pair anywhere in the output is out of order.
        for (i, &a) in order.iter().enumerate() {
            for &b in &order[i + 1..] {
                let ord = cmp(a, b);
                prop_assert!(ord != Ordering::Greater, "{:?} placed before {:?}", values[a], values[b]);
                if ord == Ordering::Equal {
                    prop_assert!(a < b, "tie reordered: row {} before row {}", a, b);
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Unsorted lookups are the identity up to the page offset
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unsorted_lookup_is_identity(
        page_index in 0usize..20,
        page_size in 0usize..50,
        position in 0usize..2000,
    ) {
        let mut mapper = RowIndexMapper::new();
        prop_assert_eq!(mapper.corrected_index(position), position);

        let pagination = Pagination::new(page_index, page_size);
        mapper.set_pagination(Some(pagination));
        let start = pagination.start_row();
        let expected = if position < start { position + start } else { position };
        prop_assert_eq!(mapper.corrected_index(position), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Column classification partitions the flat range
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn classification_partitions_columns(
        leading in 0usize..4,
        data in 0usize..8,
        trailing in 0usize..4,
    ) {
        let layout = ColumnLayout::new(
            (0..data).map(|i| ColumnDefinition::new(format!("c{i}"))).collect(),
            100,
        )
        .with_leading((0..leading).map(control).collect())
        .with_trailing((0..trailing).map(control).collect());

        let total = leading + data + trailing;
        prop_assert_eq!(layout.column_count(), total);
        for i in 0..total {
            match layout.classify(i) {
                Some(ColumnKind::LeadingControl(_)) => prop_assert!(i < leading),
                Some(ColumnKind::TrailingControl(_)) => prop_assert!(i >= leading + data),
                Some(ColumnKind::Data { data_index, .. }) => {
                    prop_assert!(i >= leading && i < leading + data);
                    prop_assert_eq!(data_index, i - leading);
                }
                None => prop_assert!(false, "column {} unclassified", i),
            }
        }
        prop_assert!(layout.classify(total).is_none());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Window offsets agree with size sums
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cell_area_matches_prefix_sums(
        heights in proptest::collection::vec(1u32..100, 1..80),
        widths in proptest::collection::vec(1u32..300, 1..12),
        pick in any::<proptest::sample::Index>(),
    ) {
        let mut grid = VariableSizeGrid::new();
        grid.sync_sizes(heights.len(), widths.len(), &|r| heights[r], &|c| widths[c]);
        let row = pick.index(heights.len());
        let column = pick.index(widths.len());
        let area = grid.cell_area(row, column);
        prop_assert_eq!(area.y, heights[..row].iter().sum::<u32>());
        prop_assert_eq!(area.x, widths[..column].iter().sum::<u32>());
        prop_assert_eq!(area.height, heights[row]);
        prop_assert_eq!(area.width, widths[column]);
    }
}
