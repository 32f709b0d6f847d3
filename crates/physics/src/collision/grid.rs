//! Broad-phase collision detection using an unbounded bucket grid.
//!
//! Bodies are inserted into every bucket their bounds overlap. The grid keeps
//! a reference count per body pair (the number of buckets they share) so that
//! moving a body only touches the buckets it entered or left.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId, BodySet};
use crate::types::Bounds;
use super::PairId;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    pub bucket_width: f32,
    pub bucket_height: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self { bucket_width: 48.0, bucket_height: 48.0 }
    }
}

/// Inclusive bucket range covered by a body
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Region {
    start_col: i32,
    end_col: i32,
    start_row: i32,
    end_row: i32,
}

impl Region {
    fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.start_col && col <= self.end_col && row >= self.start_row && row <= self.end_row
    }

    fn union(&self, other: &Region) -> Region {
        Region {
            start_col: self.start_col.min(other.start_col),
            end_col: self.end_col.max(other.end_col),
            start_row: self.start_row.min(other.start_row),
            end_row: self.end_row.max(other.end_row),
        }
    }
}

/// Statistics about the grid
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GridStats {
    pub occupied_buckets: usize,
    pub total_entries: usize,
    pub candidate_pairs: usize,
}

#[derive(Debug, Clone)]
pub struct Grid {
    pub options: GridOptions,
    buckets: HashMap<(i32, i32), Vec<BodyId>>,
    regions: HashMap<BodyId, Region>,
    pair_counts: HashMap<PairId, u32>,
    pairs_list: Vec<PairId>,
    full_rebuilds: u64,
}

impl Grid {
    pub fn new(options: GridOptions) -> Self {
        Self {
            options,
            buckets: HashMap::new(),
            regions: HashMap::new(),
            pair_counts: HashMap::new(),
            pairs_list: Vec::new(),
            full_rebuilds: 0,
        }
    }

    /// Drop every bucket, region and pair
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.regions.clear();
        self.pair_counts.clear();
        self.pairs_list.clear();
        self.full_rebuilds += 1;
    }

    /// Number of times the grid has been flushed
    pub fn full_rebuilds(&self) -> u64 {
        self.full_rebuilds
    }

    /// Re-bucket bodies whose region changed. With `force_update` every body is
    /// re-bucketed, sleeping ones included. Returns the number of bodies moved.
    pub fn update(&mut self, bodies: &BodySet<'_>, world_bounds: &Bounds, force_update: bool) -> usize {
        let mut moved = 0;

        for body in bodies.as_slice() {
            if body.is_sleeping && !force_update {
                continue;
            }
            // Bodies outside the world are not tracked
            if !body.bounds.overlaps(world_bounds) {
                continue;
            }

            let new_region = self.region_for(body);
            let old_region = self.regions.get(&body.id).copied();

            if old_region == Some(new_region) && !force_update {
                continue;
            }

            let union = old_region.map_or(new_region, |old| old.union(&new_region));
            for col in union.start_col..=union.end_col {
                for row in union.start_row..=union.end_row {
                    let in_new = new_region.contains(col, row);
                    let in_old = old_region.is_some_and(|old| old.contains(col, row));

                    if !in_new && in_old {
                        self.bucket_remove(col, row, body.id);
                    }
                    if in_new && (!in_old || force_update) {
                        if in_old {
                            self.bucket_remove(col, row, body.id);
                        }
                        self.bucket_add(col, row, body.id);
                    }
                }
            }

            self.regions.insert(body.id, new_region);
            moved += 1;
        }

        if moved > 0 {
            self.rebuild_pairs_list();
        }
        moved
    }

    /// Candidate pairs sharing at least one bucket, in id order
    pub fn pairs(&self) -> &[PairId] {
        &self.pairs_list
    }

    pub fn stats(&self) -> GridStats {
        let occupied = self.buckets.values().filter(|b| !b.is_empty()).count();
        let entries = self.buckets.values().map(Vec::len).sum();
        GridStats {
            occupied_buckets: occupied,
            total_entries: entries,
            candidate_pairs: self.pairs_list.len(),
        }
    }

    fn region_for(&self, body: &Body) -> Region {
        let w = self.options.bucket_width;
        let h = self.options.bucket_height;
        #[allow(clippy::cast_possible_truncation)]
        Region {
            start_col: (body.bounds.min.x / w).floor() as i32,
            end_col: (body.bounds.max.x / w).floor() as i32,
            start_row: (body.bounds.min.y / h).floor() as i32,
            end_row: (body.bounds.max.y / h).floor() as i32,
        }
    }

    fn bucket_add(&mut self, col: i32, row: i32, id: BodyId) {
        let bucket = self.buckets.entry((col, row)).or_default();
        for &other in bucket.iter() {
            if other != id {
                *self.pair_counts.entry(PairId::new(id, other)).or_insert(0) += 1;
            }
        }
        bucket.push(id);
    }

    fn bucket_remove(&mut self, col: i32, row: i32, id: BodyId) {
        let Some(bucket) = self.buckets.get_mut(&(col, row)) else {
            return;
        };
        bucket.retain(|&b| b != id);
        for &other in bucket.iter() {
            let pair = PairId::new(id, other);
            if let Some(count) = self.pair_counts.get_mut(&pair) {
                *count = count.saturating_sub(1);
            }
        }
        if bucket.is_empty() {
            self.buckets.remove(&(col, row));
        }
    }

    fn rebuild_pairs_list(&mut self) {
        self.pair_counts.retain(|_, count| *count > 0);
        self.pairs_list = self.pair_counts.keys().copied().collect();
        // Deterministic solver order
        self.pairs_list.sort_unstable();
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    #[test]
    fn close_bodies_become_candidates() {
        let mut a = Body::circle(Vec2::new(10.0, 10.0), 5.0);
        let mut b = Body::circle(Vec2::new(16.0, 10.0), 5.0);
        let mut c = Body::circle(Vec2::new(500.0, 500.0), 5.0);
        let (ida, idb) = (a.id, b.id);
        let set = BodySet::new(vec![&mut a, &mut b, &mut c]);

        let mut grid = Grid::default();
        grid.update(&set, &Bounds::UNBOUNDED, true);
        assert_eq!(grid.pairs(), &[PairId::new(ida, idb)]);
    }

    #[test]
    fn pair_count_survives_shared_buckets() {
        // Both bodies straddle the same two buckets
        let mut a = Body::circle(Vec2::new(48.0, 10.0), 5.0);
        let mut b = Body::circle(Vec2::new(50.0, 12.0), 5.0);
        let mut set = BodySet::new(vec![&mut a, &mut b]);
        let mut grid = Grid::default();
        grid.update(&set, &Bounds::UNBOUNDED, true);
        assert_eq!(grid.pairs().len(), 1);

        // Moving one body out of one shared bucket keeps the pair alive
        let id = set.as_slice()[1].id;
        set.get_mut(id).unwrap().set_position(Vec2::new(60.0, 12.0));
        grid.update(&set, &Bounds::UNBOUNDED, false);
        assert_eq!(grid.pairs().len(), 1);

        // Moving it far away drops the pair
        set.get_mut(id).unwrap().set_position(Vec2::new(900.0, 12.0));
        grid.update(&set, &Bounds::UNBOUNDED, false);
        assert!(grid.pairs().is_empty());
    }

    #[test]
    fn forced_update_is_idempotent() {
        let mut a = Body::circle(Vec2::new(10.0, 10.0), 5.0);
        let mut b = Body::circle(Vec2::new(16.0, 10.0), 5.0);
        let set = BodySet::new(vec![&mut a, &mut b]);
        let mut grid = Grid::default();
        grid.clear();
        grid.update(&set, &Bounds::UNBOUNDED, true);
        let before = grid.stats();
        grid.update(&set, &Bounds::UNBOUNDED, true);
        assert_eq!(grid.stats(), before);
        assert_eq!(grid.full_rebuilds(), 1);
        assert_eq!(grid.update(&set, &Bounds::UNBOUNDED, false), 0);
    }
}
