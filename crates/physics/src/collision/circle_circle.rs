//! Circle-circle narrowphase test

use crate::body::Body;
use crate::types::Vec2;
use super::{combine_friction, combine_restitution, Collision};

/// Detect overlap between two circles
pub fn detect_circle_circle_collision(body_a: &Body, body_b: &Body) -> Option<Collision> {
    let delta = body_b.position - body_a.position;
    let distance_squared = delta.dot(delta);
    let min_distance = body_a.radius + body_b.radius;

    if distance_squared >= min_distance * min_distance {
        return None;
    }

    let distance = distance_squared.sqrt();

    // Coincident centres have no meaningful direction
    let normal = if distance > 0.0001 {
        delta / distance
    } else {
        Vec2::new(0.0, 1.0)
    };

    Some(Collision {
        body_a: body_a.id,
        body_b: body_b.id,
        normal,
        tangent: normal.perp(),
        depth: min_distance - distance,
        support: body_a.position + normal * body_a.radius,
        friction: combine_friction(body_a.friction, body_b.friction),
        restitution: combine_restitution(body_a.restitution, body_b.restitution),
    })
}
