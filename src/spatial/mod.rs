use std::collections::HashMap;

use crate::types::Vec2;

/// Uniform grid bucketing body slots by centre position.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Empties every bucket. Buckets left unused since the previous clear are
    /// dropped, so the map tracks only recently occupied cells.
    pub fn clear(&mut self) {
        self.cells.retain(|_, bucket| {
            let occupied = !bucket.is_empty();
            bucket.clear();
            occupied
        });
    }

    pub fn insert(&mut self, slot: usize, pos: Vec2) {
        let key = self.cell_key(pos);
        self.cells.entry(key).or_default().push(slot);
    }

    pub fn query_neighbors_range(&self, pos: Vec2, range: i32, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_key(pos);
        let range = range.max(0);
        for dy in -range..=range {
            for dx in -range..=range {
                let key = (cx + dx, cy + dy);
                if let Some(slots) = self.cells.get(&key) {
                    out.extend_from_slice(slots);
                }
            }
        }
    }

    /// Cells needed around a query so that bodies reaching `reach` are found.
    pub fn range_for(&self, reach: f32) -> i32 {
        ((reach / self.cell_size).ceil() as i32).max(1)
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod spatial_hash_new {
        use super::*;

        #[test]
        fn creates_with_valid_cell_size() {
            let hash = SpatialHash::new(10.0);
            assert_eq!(hash.cell_size, 10.0);
        }

        #[test]
        #[should_panic(expected = "cell_size must be positive and finite")]
        fn panics_with_zero_cell_size() {
            SpatialHash::new(0.0);
        }

        #[test]
        #[should_panic(expected = "cell_size must be positive and finite")]
        fn panics_with_nan_cell_size() {
            SpatialHash::new(f32::NAN);
        }
    }

    mod spatial_hash_insert {
        use super::*;

        #[test]
        fn groups_slots_in_same_cell() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(4, Vec2::new(1.0, 1.0));
            hash.insert(9, Vec2::new(2.0, 2.0));
            let cell = hash.cells.get(&(0, 0)).expect("Cell (0,0) should exist");
            assert_eq!(cell, &vec![4, 9]);
        }

        #[test]
        fn negative_positions_land_in_negative_cells() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(0, Vec2::new(-0.5, -15.0));
            assert!(hash.cells.contains_key(&(-1, -2)));
        }
    }

    mod spatial_hash_clear {
        use super::*;

        #[test]
        fn empties_buckets() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(0, Vec2::new(5.0, 5.0));
            hash.clear();
            let mut out = Vec::new();
            hash.query_neighbors_range(Vec2::new(5.0, 5.0), 1, &mut out);
            assert!(out.is_empty());
        }

        #[test]
        fn drops_cells_left_idle_for_a_frame() {
            let mut hash = SpatialHash::new(10.0);
            for step in 0..100 {
                hash.clear();
                hash.insert(0, Vec2::new(0.0, step as f32 * 25.0));
            }
            assert_eq!(hash.cells.len(), 2);
            hash.clear();
            assert_eq!(hash.cells.len(), 1);
            hash.clear();
            assert!(hash.cells.is_empty());
        }
    }

    mod spatial_hash_query_neighbors {
        use super::*;

        #[test]
        fn finds_slots_in_adjacent_cells() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(0, Vec2::new(5.0, 5.0));
            hash.insert(1, Vec2::new(15.0, 5.0));
            hash.insert(2, Vec2::new(5.0, 15.0));
            let mut out = Vec::new();
            hash.query_neighbors_range(Vec2::new(9.0, 9.0), 1, &mut out);
            assert!(out.contains(&0));
            assert!(out.contains(&1));
            assert!(out.contains(&2));
        }

        #[test]
        fn returns_empty_for_isolated_query() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(0, Vec2::new(5.0, 5.0));
            let mut out = Vec::new();
            hash.query_neighbors_range(Vec2::new(100.0, 100.0), 1, &mut out);
            assert!(out.is_empty());
        }

        #[test]
        fn range_zero_queries_only_current_cell() {
            let mut hash = SpatialHash::new(10.0);
            hash.insert(0, Vec2::new(5.0, 5.0));
            hash.insert(1, Vec2::new(15.0, 5.0));
            let mut out = Vec::new();
            hash.query_neighbors_range(Vec2::new(5.0, 5.0), 0, &mut out);
            assert_eq!(out, vec![0]);
        }
    }

    mod range_for {
        use super::*;

        #[test]
        fn never_below_one() {
            let hash = SpatialHash::new(10.0);
            assert_eq!(hash.range_for(0.0), 1);
            assert_eq!(hash.range_for(4.0), 1);
        }

        #[test]
        fn grows_with_reach() {
            let hash = SpatialHash::new(10.0);
            assert_eq!(hash.range_for(25.0), 3);
        }
    }
}
