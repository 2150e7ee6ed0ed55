//! Greedy rectangle cover for sparse coordinate maps.
//!
//! Collapses a coordinate→value map into axis-aligned rectangles whose
//! cells all share one value. Row-major and deterministic: each uncovered
//! coordinate becomes a rectangle's top-left, extended right while the
//! next column holds an equal uncovered value, then down one row at a time
//! while the whole column span still matches. Not minimum-rectangle
//! optimal; good enough to bound payload size.

use rustc_hash::{FxHashMap, FxHashSet};

/// One rectangle of the cover, inclusive coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRect<V> {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub value: V,
}

impl<V> ValueRect<V> {
    pub fn cell_count(&self) -> u64 {
        (self.end_row - self.start_row + 1) as u64 * (self.end_col - self.start_col + 1) as u64
    }
}

/// Cover every coordinate of `map` exactly once.
pub fn compact_rectangles<V: Eq + Clone>(map: &FxHashMap<(u32, u32), V>) -> Vec<ValueRect<V>> {
    let mut coords: Vec<(u32, u32)> = map.keys().copied().collect();
    coords.sort_unstable();

    let mut used: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut rects = Vec::new();

    for (row, col) in coords {
        if used.contains(&(row, col)) {
            continue;
        }
        let value = &map[&(row, col)];

        // Extend right along the starting row.
        let mut end_col = col;
        loop {
            let next = (row, end_col + 1);
            if used.contains(&next) || map.get(&next) != Some(value) {
                break;
            }
            end_col += 1;
        }

        // Extend down while the whole column span matches.
        let mut end_row = row;
        'down: loop {
            let candidate = end_row + 1;
            for c in col..=end_col {
                let probe = (candidate, c);
                if used.contains(&probe) || map.get(&probe) != Some(value) {
                    break 'down;
                }
            }
            end_row = candidate;
        }

        for r in row..=end_row {
            for c in col..=end_col {
                used.insert((r, c));
            }
        }

        rects.push(ValueRect {
            start_row: row,
            end_row,
            start_col: col,
            end_col,
            value: value.clone(),
        });
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(entries: &[((u32, u32), i32)]) -> FxHashMap<(u32, u32), i32> {
        entries.iter().copied().collect()
    }

    fn assert_exact_partition(map: &FxHashMap<(u32, u32), i32>, rects: &[ValueRect<i32>]) {
        let mut seen = FxHashSet::default();
        for rect in rects {
            for r in rect.start_row..=rect.end_row {
                for c in rect.start_col..=rect.end_col {
                    assert_eq!(map.get(&(r, c)), Some(&rect.value), "cell outside its value");
                    assert!(seen.insert((r, c)), "overlapping rectangles at ({r},{c})");
                }
            }
        }
        assert_eq!(seen.len(), map.len(), "cover misses coordinates");
    }

    #[test]
    fn full_block_becomes_one_rect() {
        let mut entries = Vec::new();
        for r in 2..5 {
            for c in 1..4 {
                entries.push(((r, c), 7));
            }
        }
        let map = map_of(&entries);
        let rects = compact_rectangles(&map);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0], ValueRect { start_row: 2, end_row: 4, start_col: 1, end_col: 3, value: 7 });
    }

    #[test]
    fn distinct_values_split() {
        let map = map_of(&[((0, 0), 1), ((0, 1), 2), ((1, 0), 1), ((1, 1), 2)]);
        let rects = compact_rectangles(&map);
        assert_eq!(rects.len(), 2);
        assert_exact_partition(&map, &rects);
    }

    #[test]
    fn l_shape_partitions_without_overlap() {
        // Row 0: cols 0..=2; rows 1..=2: col 0 only.
        let map = map_of(&[
            ((0, 0), 9), ((0, 1), 9), ((0, 2), 9),
            ((1, 0), 9),
            ((2, 0), 9),
        ]);
        let rects = compact_rectangles(&map);
        assert_exact_partition(&map, &rects);
        // Greedy from (0,0): extends right to (0,2), can't extend down.
        assert_eq!(rects[0], ValueRect { start_row: 0, end_row: 0, start_col: 0, end_col: 2, value: 9 });
        assert_eq!(rects.len(), 2);
    }

    #[test]
    fn scattered_cells_each_get_a_rect() {
        let map = map_of(&[((0, 0), 1), ((5, 9), 1), ((3, 3), 2)]);
        let rects = compact_rectangles(&map);
        assert_eq!(rects.len(), 3);
        assert_exact_partition(&map, &rects);
    }

    #[test]
    fn deterministic_row_major_order() {
        let map = map_of(&[((2, 2), 1), ((0, 5), 1), ((0, 1), 1)]);
        let rects = compact_rectangles(&map);
        let starts: Vec<_> = rects.iter().map(|r| (r.start_row, r.start_col)).collect();
        assert_eq!(starts, vec![(0, 1), (0, 5), (2, 2)]);
    }

    #[test]
    fn empty_input_empty_output() {
        let map: FxHashMap<(u32, u32), i32> = FxHashMap::default();
        assert!(compact_rectangles(&map).is_empty());
    }
}
