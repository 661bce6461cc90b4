//! Uniform-grid broad phase
//!
//! Buckets body positions into square cells so that pairwise queries with a
//! bounded interaction range only visit neighbouring cells instead of every
//! pair. Candidate pairs are always returned as `(i, j)` with `i < j`, sorted
//! ascending, so results never depend on hash iteration order.

use std::collections::HashMap;

use glam::DVec2;

/// Below this many points a plain O(n²) scan is cheaper than building cells
const BRUTE_FORCE_LIMIT: usize = 24;

/// Spatial hash of point indices
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, p: DVec2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Rebuild the grid from `points`; indices refer into that slice
    pub fn rebuild(&mut self, points: impl IntoIterator<Item = DVec2>) {
        self.cells.clear();
        for (i, p) in points.into_iter().enumerate() {
            let cell = self.cell_of(p);
            self.cells.entry(cell).or_default().push(i);
        }
    }

    /// All pairs `(i, j)`, `i < j`, whose points share or neighbour a cell
    pub fn candidate_pairs(&self, points: &[DVec2]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, &p) in points.iter().enumerate() {
            let (cx, cy) = self.cell_of(p);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                        pairs.extend(bucket.iter().filter(|&&j| j > i).map(|&j| (i, j)));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

/// Pairs `(i, j)`, `i < j`, with `|p_i - p_j| < range`, in ascending order
///
/// Uses a grid with `cell_size = range` once there are enough points to make
/// it worthwhile. A non-positive or non-finite range yields no pairs.
pub fn pairs_within(points: &[DVec2], range: f64) -> Vec<(usize, usize)> {
    if !(range > 0.0 && range.is_finite()) {
        return Vec::new();
    }
    let range_sq = range * range;
    let close = |&(i, j): &(usize, usize)| points[i].distance_squared(points[j]) < range_sq;

    if points.len() <= BRUTE_FORCE_LIMIT {
        let mut pairs = Vec::new();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                if close(&(i, j)) {
                    pairs.push((i, j));
                }
            }
        }
        return pairs;
    }

    let mut grid = SpatialGrid::new(range);
    grid.rebuild(points.iter().copied());
    let mut pairs = grid.candidate_pairs(points);
    pairs.retain(close);
    pairs
}
