//! # Rigid Bodies
//!
//! Circle-shaped rigid bodies integrated with position Verlet. Velocity is
//! never stored authoritatively: it is `position - position_prev`, so the
//! resolver changes velocity by moving `position_prev`.

use crate::types::{Bounds, Vec2};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide unique body identifier
pub type BodyId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh body identifier, unique and monotonic for the process
pub fn next_id() -> BodyId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Frames of low motion before a body is put to sleep
pub const DEFAULT_SLEEP_THRESHOLD: u32 = 60;

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub label: String,

    pub position: Vec2,
    pub position_prev: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angle_prev: f32,
    pub angular_velocity: f32,
    pub speed: f32,
    pub angular_speed: f32,

    pub force: Vec2,
    pub torque: f32,

    pub radius: f32,
    pub mass: f32,
    pub inverse_mass: f32,
    pub inertia: f32,
    pub inverse_inertia: f32,

    pub friction: f32,
    pub friction_air: f32,
    pub restitution: f32,
    /// Per-body multiplier on the engine time scale
    pub time_scale: f32,

    pub is_static: bool,
    pub is_sleeping: bool,
    pub motion: f32,
    pub sleep_counter: u32,
    pub sleep_threshold: u32,

    /// Accumulated contact correction, applied by the resolver's post-solve pass
    pub position_impulse: Vec2,
    /// Accumulated constraint correction, consumed by the constraint post-solve pass
    pub constraint_impulse: Vec2,
    pub total_contacts: u32,

    pub bounds: Bounds,
}

impl Body {
    /// Create a dynamic circle with unit density
    pub fn circle(position: Vec2, radius: f32) -> Self {
        let area = std::f32::consts::PI * radius * radius;
        let mut body = Self {
            id: next_id(),
            label: "Circle Body".to_string(),
            position,
            position_prev: position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angle_prev: 0.0,
            angular_velocity: 0.0,
            speed: 0.0,
            angular_speed: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            radius,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
            time_scale: 1.0,
            is_static: false,
            is_sleeping: false,
            motion: 0.0,
            sleep_counter: 0,
            sleep_threshold: DEFAULT_SLEEP_THRESHOLD,
            position_impulse: Vec2::ZERO,
            constraint_impulse: Vec2::ZERO,
            total_contacts: 0,
            bounds: Bounds::around(position, radius),
        };
        body.set_mass(area * 0.001);
        body
    }

    /// Create an immovable circle
    pub fn fixed(position: Vec2, radius: f32) -> Self {
        let mut body = Self::circle(position, radius);
        body.set_static(true);
        body
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        // Solid disc
        self.inertia = 0.5 * mass * self.radius * self.radius;
        self.inverse_inertia = if self.inertia > 0.0 { 1.0 / self.inertia } else { 0.0 };
    }

    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.mass = f32::INFINITY;
            self.inverse_mass = 0.0;
            self.inertia = f32::INFINITY;
            self.inverse_inertia = 0.0;
            self.position_prev = self.position;
            self.angle_prev = self.angle;
            self.velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.speed = 0.0;
            self.angular_speed = 0.0;
            self.motion = 0.0;
        } else if !self.mass.is_finite() {
            let area = std::f32::consts::PI * self.radius * self.radius;
            self.set_mass(area * 0.001);
        }
    }

    /// Teleport the body, keeping its current velocity
    pub fn set_position(&mut self, position: Vec2) {
        let delta = position - self.position;
        self.position_prev += delta;
        self.position = position;
        self.update_bounds();
    }

    /// Set velocity in units per step
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.position_prev = self.position - velocity;
        self.velocity = velocity;
        self.speed = velocity.length();
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Bounds::around(self.position, self.radius);
    }

    /// Integrate one step. `dt` is the scaled step length in milliseconds.
    pub fn update(&mut self, dt: f32, time_scale: f32, correction: f32) {
        let dt_squared = (dt * self.time_scale).powi(2);
        let friction_air = 1.0 - self.friction_air * time_scale * self.time_scale;

        let velocity_prev = self.position - self.position_prev;
        self.velocity = velocity_prev * (friction_air * correction) + self.force * (self.inverse_mass * dt_squared);
        self.position_prev = self.position;
        self.position += self.velocity;

        self.angular_velocity = (self.angle - self.angle_prev) * friction_air * correction
            + self.torque * self.inverse_inertia * dt_squared;
        self.angle_prev = self.angle;
        self.angle += self.angular_velocity;

        self.speed = self.velocity.length();
        self.angular_speed = self.angular_velocity.abs();
        self.update_bounds();
    }
}

/// Accumulate gravity as a force on every awake, dynamic body
pub fn apply_gravity_all<'a>(bodies: impl IntoIterator<Item = &'a mut Body>, gravity: Vec2, gravity_scale: f32) {
    for body in bodies {
        if body.is_static || body.is_sleeping {
            continue;
        }
        body.force += gravity * (body.mass * gravity_scale);
    }
}

/// Integrate every awake, dynamic body whose bounds intersect `world_bounds`
pub fn update_all<'a>(
    bodies: impl IntoIterator<Item = &'a mut Body>,
    dt: f32,
    time_scale: f32,
    correction: f32,
    world_bounds: &Bounds,
) {
    for body in bodies {
        if body.is_static || body.is_sleeping {
            continue;
        }
        // Bodies that left the world are frozen where they are
        if !body.bounds.overlaps(world_bounds) {
            continue;
        }
        body.update(dt, time_scale, correction);
    }
}

pub fn reset_forces_all<'a>(bodies: impl IntoIterator<Item = &'a mut Body>) {
    for body in bodies {
        body.force = Vec2::ZERO;
        body.torque = 0.0;
    }
}

/// Flattened mutable view over every body in the scene, addressable by id
pub struct BodySet<'a> {
    list: Vec<&'a mut Body>,
    index: HashMap<BodyId, usize>,
}

impl<'a> BodySet<'a> {
    pub fn new(list: Vec<&'a mut Body>) -> Self {
        let index = list.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
        Self { list, index }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.index.get(&id).map(|&i| &*self.list[i])
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index.get(&id).map(|&i| &mut *self.list[i])
    }

    /// Borrow two distinct bodies mutably at once
    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.list.split_at_mut(j);
            Some((&mut *left[i], &mut *right[0]))
        } else {
            let (left, right) = self.list.split_at_mut(i);
            Some((&mut *right[0], &mut *left[j]))
        }
    }

    pub fn as_slice(&self) -> &[&'a mut Body] {
        &self.list
    }

    pub fn as_mut_slice(&mut self) -> &mut [&'a mut Body] {
        &mut self.list
    }
}
