//! Contact resolver
//!
//! Sequential impulses on the velocity level followed by iterative position
//! correction. Velocities are implicit (`position - position_prev`), so an
//! impulse is applied by moving `position_prev` and a position correction is
//! applied by translating both positions together.

use crate::body::{Body, BodySet};
use crate::types::Vec2;
use super::Pair;

/// Approach speed below which contacts do not bounce
const RESTING_THRESHOLD: f32 = 2.0;
/// Fraction of the remaining overlap removed per position iteration
const POSITION_DAMPEN: f32 = 0.9;
/// Fraction of the position impulse carried into the next step
const POSITION_WARMING: f32 = 0.8;

fn inverse_mass(body: &Body) -> f32 {
    if body.is_static || body.is_sleeping {
        0.0
    } else {
        body.inverse_mass
    }
}

fn velocity(body: &Body) -> Vec2 {
    body.position - body.position_prev
}

/// Push `impulse` into B and its opposite into A
fn apply_impulse(body_a: &mut Body, body_b: &mut Body, impulse: Vec2) {
    let inv_a = inverse_mass(body_a);
    let inv_b = inverse_mass(body_b);
    body_a.position_prev += impulse * inv_a;
    body_b.position_prev -= impulse * inv_b;
}

/// Prepare active pairs for the velocity iterations and warm start them with
/// the impulses accumulated in the previous step.
pub fn pre_solve_velocity(pairs: &mut [Pair], bodies: &mut BodySet<'_>) {
    for pair in pairs.iter_mut().filter(|p| p.is_active) {
        let Some((body_a, body_b)) = bodies.pair_mut(pair.body_a, pair.body_b) else {
            continue;
        };
        body_a.total_contacts += 1;
        body_b.total_contacts += 1;

        let normal = pair.collision.normal;
        let tangent = pair.collision.tangent;
        let approach = (velocity(body_b) - velocity(body_a)).dot(normal);
        pair.restitution_bias = if approach < -RESTING_THRESHOLD {
            -pair.restitution * approach
        } else {
            0.0
        };

        if pair.normal_impulse != 0.0 || pair.tangent_impulse != 0.0 {
            let impulse = normal * pair.normal_impulse + tangent * pair.tangent_impulse;
            apply_impulse(body_a, body_b, impulse);
        }
    }
}

/// One velocity iteration over every active pair
pub fn solve_velocity(pairs: &mut [Pair], bodies: &mut BodySet<'_>) {
    for pair in pairs.iter_mut().filter(|p| p.is_active) {
        let Some((body_a, body_b)) = bodies.pair_mut(pair.body_a, pair.body_b) else {
            continue;
        };
        let share = inverse_mass(body_a) + inverse_mass(body_b);
        if share == 0.0 {
            continue;
        }

        let normal = pair.collision.normal;
        let tangent = pair.collision.tangent;

        // Normal impulse, accumulated and kept non-negative
        let normal_velocity = (velocity(body_b) - velocity(body_a)).dot(normal);
        let mut impulse = (pair.restitution_bias - normal_velocity) / share;
        let accumulated = (pair.normal_impulse + impulse).max(0.0);
        impulse = accumulated - pair.normal_impulse;
        pair.normal_impulse = accumulated;
        apply_impulse(body_a, body_b, normal * impulse);

        // Coulomb friction bounded by the normal impulse
        let tangent_velocity = (velocity(body_b) - velocity(body_a)).dot(tangent);
        let limit = pair.friction * pair.normal_impulse;
        let mut friction = -tangent_velocity / share;
        let accumulated = (pair.tangent_impulse + friction).clamp(-limit, limit);
        friction = accumulated - pair.tangent_impulse;
        pair.tangent_impulse = accumulated;
        apply_impulse(body_a, body_b, tangent * friction);
    }
}

/// One position iteration: accumulate overlap corrections into each body's
/// `position_impulse`
pub fn solve_position(pairs: &mut [Pair], bodies: &mut BodySet<'_>) {
    for pair in pairs.iter_mut().filter(|p| p.is_active) {
        let Some((body_a, body_b)) = bodies.pair_mut(pair.body_a, pair.body_b) else {
            continue;
        };
        let inv_a = inverse_mass(body_a);
        let inv_b = inverse_mass(body_b);
        let share = inv_a + inv_b;
        if share == 0.0 {
            continue;
        }

        let normal = pair.collision.normal;
        let corrected = (body_b.position_impulse - body_a.position_impulse).dot(normal);
        pair.separation = pair.collision.depth - corrected;
        if pair.separation <= pair.slop {
            continue;
        }

        let correction = normal * ((pair.separation - pair.slop) * POSITION_DAMPEN / share);
        body_a.position_impulse -= correction * inv_a;
        body_b.position_impulse += correction * inv_b;
    }
}

/// Apply accumulated position impulses and reset per-step contact state
pub fn post_solve_position<'a>(bodies: impl IntoIterator<Item = &'a mut Body>) {
    for body in bodies {
        body.total_contacts = 0;
        if body.position_impulse.is_zero() {
            continue;
        }

        // Translate both positions so the correction adds no velocity
        body.position += body.position_impulse;
        body.position_prev += body.position_impulse;
        body.update_bounds();

        if body.position_impulse.dot(velocity(body)) < 0.0 {
            body.position_impulse = Vec2::ZERO;
        } else {
            body.position_impulse *= POSITION_WARMING;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::detect_circle_circle_collision;

    #[test]
    fn approaching_bodies_stop_approaching() {
        let mut a = Body::circle(Vec2::new(0.0, 0.0), 5.0);
        let mut b = Body::circle(Vec2::new(9.0, 0.0), 5.0);
        a.set_velocity(Vec2::new(1.0, 0.0));
        b.set_velocity(Vec2::new(-1.0, 0.0));
        let mut pairs = vec![Pair::new(detect_circle_circle_collision(&a, &b).unwrap(), 0.0)];
        let mut set = BodySet::new(vec![&mut a, &mut b]);

        pre_solve_velocity(&mut pairs, &mut set);
        for _ in 0..4 {
            solve_velocity(&mut pairs, &mut set);
        }
        let va = set.as_slice()[0].position - set.as_slice()[0].position_prev;
        let vb = set.as_slice()[1].position - set.as_slice()[1].position_prev;
        assert!((vb - va).x >= -1e-5);
        assert!(pairs[0].normal_impulse > 0.0);
    }

    #[test]
    fn static_bodies_are_never_moved() {
        let mut ground = Body::fixed(Vec2::new(0.0, 0.0), 5.0);
        let mut ball = Body::circle(Vec2::new(0.0, -8.0), 5.0);
        let mut pairs = vec![Pair::new(detect_circle_circle_collision(&ball, &ground).unwrap(), 0.0)];
        let mut set = BodySet::new(vec![&mut ball, &mut ground]);

        for _ in 0..6 {
            solve_position(&mut pairs, &mut set);
        }
        assert_eq!(set.as_slice()[1].position_impulse, Vec2::ZERO);
        assert!(set.as_slice()[0].position_impulse.y < 0.0);

        post_solve_position(set.as_mut_slice().iter_mut().map(|b| &mut **b));
        assert_eq!(set.as_slice()[1].position, Vec2::ZERO);
        assert!(set.as_slice()[0].position.y < -8.0);
        // Position correction does not inject velocity
        let ball = &set.as_slice()[0];
        assert_eq!(ball.position - ball.position_prev, Vec2::ZERO);
    }

    #[test]
    fn overlap_within_slop_is_left_alone() {
        let mut a = Body::circle(Vec2::new(0.0, 0.0), 5.0);
        let mut b = Body::circle(Vec2::new(9.99, 0.0), 5.0);
        let mut pairs = vec![Pair::new(detect_circle_circle_collision(&a, &b).unwrap(), 0.0)];
        let mut set = BodySet::new(vec![&mut a, &mut b]);
        solve_position(&mut pairs, &mut set);
        assert_eq!(set.as_slice()[0].position_impulse, Vec2::ZERO);
    }
}
