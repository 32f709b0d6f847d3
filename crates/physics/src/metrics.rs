//! Per-step counters. Advisory only: nothing in the pipeline reads them back.

use serde::Serialize;

use crate::collision::{Broadphase, Pairs};
use crate::composite::World;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Collect the scene-wide counts in `update`
    pub extended: bool,
    pub broadphase_tests: usize,
    pub narrowphase_tests: usize,
    pub narrow_detections: usize,
    pub collisions: usize,
    pub pairs: usize,
    pub bodies: usize,
    pub constraints: usize,
    pub composites: usize,
    pub buckets: usize,
    pub steps: u64,
}

impl Metrics {
    pub fn new(extended: bool) -> Self {
        Self { extended, ..Self::default() }
    }

    /// Zero the counters accumulated during a step
    pub fn reset(&mut self) {
        self.broadphase_tests = 0;
        self.narrowphase_tests = 0;
        self.narrow_detections = 0;
        self.collisions = 0;
    }

    pub fn update(&mut self, world: &World, pairs: &Pairs, broadphase: &Broadphase) {
        self.steps += 1;
        self.pairs = pairs.len();
        if !self.extended {
            return;
        }
        self.bodies = world.all_bodies().len();
        self.constraints = world.all_constraints().len();
        self.composites = world.all_composites().len() + 1;
        self.buckets = broadphase.grid().map_or(0, |grid| grid.stats().occupied_buckets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::composite::{Composite, Gravity};
    use crate::types::{Bounds, Vec2};

    #[test]
    fn reset_keeps_scene_counts() {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        world.add_body(Body::circle(Vec2::ZERO, 1.0));
        let mut metrics = Metrics::new(true);
        metrics.collisions = 3;
        metrics.update(&world, &Pairs::new(), &Broadphase::default());
        metrics.reset();
        assert_eq!(metrics.collisions, 0);
        assert_eq!(metrics.bodies, 1);
        assert_eq!(metrics.composites, 1);
        assert_eq!(metrics.steps, 1);
    }
}
