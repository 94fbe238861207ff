//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::Vec2;

/// Sparse hash grid over source indices for O(1) neighborhood queries
///
/// Payloads are indices into whatever table the caller built the grid
/// from (the scheduler uses percept-source indices), paired with their
/// positions so radius queries are self-contained.
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(usize, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((index, pos));
    }

    /// Rebuild grid from an index/position stream
    pub fn rebuild(&mut self, entries: impl Iterator<Item = (usize, Vec2)>) {
        self.clear();
        for (index, pos) in entries {
            self.insert(index, pos);
        }
    }

    /// Indices of all entries within `radius` of `center`, in insertion
    /// order within each visited cell
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<usize> {
        let min = self.cell_coord(Vec2::new(center.x - radius, center.y - radius));
        let max = self.cell_coord(Vec2::new(center.x + radius, center.y + radius));

        let mut hits = Vec::new();
        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    for &(index, pos) in cell {
                        if center.distance(&pos) <= radius {
                            hits.push(index);
                        }
                    }
                }
            }
        }
        // Cell iteration order is hash-dependent; sort so callers get a
        // stable input ordering for tie-breaking downstream.
        hits.sort_unstable();
        hits
    }
}
