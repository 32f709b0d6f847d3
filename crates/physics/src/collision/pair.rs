//! Collision pairs: the persistent record of two bodies in contact

use std::fmt;

use crate::body::BodyId;
use super::Collision;

/// Allowed penetration before position correction kicks in
pub const DEFAULT_SLOP: f32 = 0.05;

/// Order-independent identity of two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(BodyId, BodyId);

impl PairId {
    #[must_use]
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a < b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.0, self.1)
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}B{}", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub id: PairId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Latest confirmed collision
    pub collision: Collision,
    /// Confirmed by the narrowphase in the latest step
    pub is_active: bool,
    /// Local simulation time of creation
    pub time_created: f64,
    /// Local simulation time of the latest confirmation
    pub time_updated: f64,
    pub separation: f32,
    pub friction: f32,
    pub restitution: f32,
    pub slop: f32,

    // Solver state carried across steps for warm starting
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub(crate) restitution_bias: f32,
}

impl Pair {
    pub fn new(collision: Collision, timestamp: f64) -> Self {
        Self {
            id: PairId::new(collision.body_a, collision.body_b),
            body_a: collision.body_a,
            body_b: collision.body_b,
            collision,
            is_active: true,
            time_created: timestamp,
            time_updated: timestamp,
            separation: collision.depth,
            friction: collision.friction,
            restitution: collision.restitution,
            slop: DEFAULT_SLOP,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            restitution_bias: 0.0,
        }
    }

    /// Refresh with this step's collision
    pub fn update(&mut self, collision: Collision, timestamp: f64) {
        // Keep the body order stable so warm-started impulses keep their sign
        let collision = if collision.body_a == self.body_a {
            collision
        } else {
            Collision {
                body_a: collision.body_b,
                body_b: collision.body_a,
                normal: -collision.normal,
                tangent: -collision.tangent,
                ..collision
            }
        };
        self.collision = collision;
        self.separation = collision.depth;
        self.friction = collision.friction;
        self.restitution = collision.restitution;
        self.is_active = true;
        self.time_updated = timestamp;
    }

    /// Mark as no longer touching. Forgets warm-start impulses.
    pub fn set_inactive(&mut self) {
        self.is_active = false;
        self.normal_impulse = 0.0;
        self.tangent_impulse = 0.0;
    }

    #[must_use]
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec2;

    fn collision(a: BodyId, b: BodyId) -> Collision {
        Collision {
            body_a: a,
            body_b: b,
            normal: Vec2::new(1.0, 0.0),
            tangent: Vec2::new(0.0, 1.0),
            depth: 0.5,
            support: Vec2::ZERO,
            friction: 0.1,
            restitution: 0.0,
        }
    }

    #[test]
    fn pair_id_ignores_order() {
        assert_eq!(PairId::new(3, 7), PairId::new(7, 3));
        assert_eq!(PairId::new(7, 3).bodies(), (3, 7));
        assert_eq!(PairId::new(7, 3).to_string(), "A3B7");
    }

    #[test]
    fn update_keeps_body_order() {
        let mut pair = Pair::new(collision(1, 2), 0.0);
        pair.update(collision(2, 1), 16.0);
        assert_eq!(pair.collision.body_a, 1);
        assert_eq!(pair.collision.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(pair.time_updated, 16.0);
        assert_eq!(pair.time_created, 0.0);
    }
}
