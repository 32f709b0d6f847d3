//! Narrowphase dispatch over broadphase candidates

use crate::body::{Body, BodySet};
use crate::metrics::Metrics;
use super::{detect_circle_circle_collision, Collision, PairId};

/// Resting bodies cannot start a new contact between themselves
pub(crate) fn can_collide(a: &Body, b: &Body) -> bool {
    let a_idle = a.is_static || a.is_sleeping;
    let b_idle = b.is_static || b.is_sleeping;
    !(a_idle && b_idle)
}

fn test_pair(a: &Body, b: &Body, metrics: &mut Metrics) -> Option<Collision> {
    if !can_collide(a, b) || !a.bounds.overlaps(&b.bounds) {
        return None;
    }
    metrics.narrowphase_tests += 1;
    let collision = detect_circle_circle_collision(a, b)?;
    metrics.narrow_detections += 1;
    Some(collision)
}

/// Confirm collisions among pairs proposed by a spatial index
pub fn detect_candidate_pairs(candidates: &[PairId], bodies: &BodySet<'_>, metrics: &mut Metrics) -> Vec<Collision> {
    let mut collisions = Vec::new();
    for pair in candidates {
        let (id_a, id_b) = pair.bodies();
        // The index may briefly hold ids of bodies removed out of band
        let (Some(a), Some(b)) = (bodies.get(id_a), bodies.get(id_b)) else {
            continue;
        };
        if let Some(collision) = test_pair(a, b, metrics) {
            collisions.push(collision);
        }
    }
    metrics.collisions += collisions.len();
    collisions
}

/// Test every pair of bodies
pub fn detect_all_pairs(bodies: &BodySet<'_>, metrics: &mut Metrics) -> Vec<Collision> {
    let list = bodies.as_slice();
    let mut collisions = Vec::new();
    for i in 0..list.len() {
        for j in (i + 1)..list.len() {
            metrics.broadphase_tests += 1;
            if let Some(collision) = test_pair(list[i], list[j], metrics) {
                collisions.push(collision);
            }
        }
    }
    metrics.collisions += collisions.len();
    collisions
}
