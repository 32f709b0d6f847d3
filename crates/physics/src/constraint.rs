//! # Distance Constraints
//!
//! Keeps two anchor points at a fixed distance. An anchor is either an offset
//! from a body's position or, without a body, a fixed world point. Solving is
//! positional: bodies are moved directly, which the Verlet integrator then
//! reads as velocity.

use crate::body::{next_id, Body, BodyId, BodySet};
use crate::types::Vec2;

/// Below this length the constraint direction is undefined
const MIN_LENGTH: f32 = 0.000_001;

#[derive(Clone, Debug)]
pub struct Constraint {
    pub id: BodyId,
    pub label: String,
    pub body_a: Option<BodyId>,
    pub body_b: Option<BodyId>,
    /// Offset from `body_a`, or a world point when there is no body
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub length: f32,
    /// In (0, 1]; 1 is rigid
    pub stiffness: f32,
}

impl Constraint {
    /// Join two body centres at their current distance
    pub fn between(body_a: &Body, body_b: &Body, stiffness: f32) -> Self {
        Self {
            id: next_id(),
            label: "Constraint".to_string(),
            body_a: Some(body_a.id),
            body_b: Some(body_b.id),
            point_a: Vec2::ZERO,
            point_b: Vec2::ZERO,
            length: (body_b.position - body_a.position).length(),
            stiffness,
        }
    }

    /// Hang a body from a fixed world point
    pub fn pin(anchor: Vec2, body: &Body, stiffness: f32) -> Self {
        Self {
            id: next_id(),
            label: "Pin".to_string(),
            body_a: None,
            body_b: Some(body.id),
            point_a: anchor,
            point_b: Vec2::ZERO,
            length: (body.position - anchor).length(),
            stiffness,
        }
    }

    #[must_use]
    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    /// True when either end is anchored to something immovable
    fn is_fixed(&self, bodies: &BodySet<'_>) -> bool {
        let fixed = |id: Option<BodyId>| id.and_then(|id| bodies.get(id)).map_or(true, |b| b.is_static);
        fixed(self.body_a) || fixed(self.body_b)
    }

    /// Move the participating bodies one pass closer to satisfying the constraint
    pub fn solve(&self, bodies: &mut BodySet<'_>, time_scale: f32) {
        // (world anchor, movable inverse mass) for each end
        let end = |id: Option<BodyId>, point: Vec2| match id.and_then(|id| bodies.get(id)) {
            Some(body) => {
                let inverse_mass = if body.is_static || body.is_sleeping { 0.0 } else { body.inverse_mass };
                (body.position + point, inverse_mass)
            }
            None => (point, 0.0),
        };
        let (point_a, inv_a) = end(self.body_a, self.point_a);
        let (point_b, inv_b) = end(self.body_b, self.point_b);

        let delta = point_a - point_b;
        let current = delta.length();
        let share = inv_a + inv_b;
        if current < MIN_LENGTH || share == 0.0 {
            return;
        }

        let stiffness = if self.stiffness < 1.0 { self.stiffness * time_scale } else { self.stiffness };
        let difference = (current - self.length) / current;
        let force = delta * (difference * stiffness);

        if inv_a > 0.0 {
            if let Some(body) = self.body_a.and_then(|id| bodies.get_mut(id)) {
                let offset = force * (inv_a / share);
                body.position -= offset;
                body.constraint_impulse -= offset;
            }
        }
        if inv_b > 0.0 {
            if let Some(body) = self.body_b.and_then(|id| bodies.get_mut(id)) {
                let offset = force * (inv_b / share);
                body.position += offset;
                body.constraint_impulse += offset;
            }
        }
    }
}

/// One pass over every constraint. Constraints anchored to something immovable
/// go first so free chains settle against them.
pub fn solve_all(constraints: &[&mut Constraint], bodies: &mut BodySet<'_>, time_scale: f32) {
    let (fixed, free): (Vec<&Constraint>, Vec<&Constraint>) =
        constraints.iter().map(|c| &**c).partition(|c| c.is_fixed(bodies));
    for constraint in fixed.into_iter().chain(free) {
        constraint.solve(bodies, time_scale);
    }
}

/// Refresh bounds of bodies moved by constraints and forget their impulses
pub fn post_solve_all<'a>(bodies: impl IntoIterator<Item = &'a mut Body>) {
    for body in bodies {
        if body.constraint_impulse.is_zero() {
            continue;
        }
        body.update_bounds();
        body.constraint_impulse = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rigid_link_restores_length() {
        let mut a = Body::circle(Vec2::new(0.0, 0.0), 1.0);
        let mut b = Body::circle(Vec2::new(10.0, 0.0), 1.0);
        let mut link = Constraint::between(&a, &b, 1.0);
        b.position = Vec2::new(14.0, 0.0);

        let mut set = BodySet::new(vec![&mut a, &mut b]);
        solve_all(&[&mut link], &mut set, 1.0);
        let span = set.as_slice()[1].position - set.as_slice()[0].position;
        assert!((span.length() - 10.0).abs() < 1e-4);
        // Equal masses share the correction
        assert!((set.as_slice()[0].position.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn pin_only_moves_the_body() {
        let mut ball = Body::circle(Vec2::new(0.0, 20.0), 1.0);
        let mut pin = Constraint::pin(Vec2::ZERO, &ball, 1.0).with_length(10.0);
        let mut set = BodySet::new(vec![&mut ball]);
        solve_all(&[&mut pin], &mut set, 1.0);
        assert!((set.as_slice()[0].position.y - 10.0).abs() < 1e-4);
        assert!(!set.as_slice()[0].constraint_impulse.is_zero());

        post_solve_all(set.as_mut_slice().iter_mut().map(|b| &mut **b));
        assert!(set.as_slice()[0].constraint_impulse.is_zero());
        assert!((set.as_slice()[0].bounds.max.y - 11.0).abs() < 1e-4);
    }

    #[test]
    fn sleeping_bodies_are_not_pulled() {
        let mut ball = Body::circle(Vec2::new(0.0, 20.0), 1.0);
        ball.is_sleeping = true;
        let mut pin = Constraint::pin(Vec2::ZERO, &ball, 1.0).with_length(10.0);
        let mut set = BodySet::new(vec![&mut ball]);
        solve_all(&[&mut pin], &mut set, 1.0);
        assert_eq!(set.as_slice()[0].position, Vec2::new(0.0, 20.0));
    }
}
