//! # Sleeping
//!
//! Bodies that barely move for long enough are put to sleep and skipped by
//! gravity, integration and the narrowphase until something wakes them.

use crate::body::{Body, BodySet};
use crate::collision::Pair;
use crate::types::Vec2;

/// Smoothed motion below which a body counts as resting
pub const MOTION_SLEEP_THRESHOLD: f32 = 0.08;
/// Motion a body must carry to wake a sleeping body it touches
pub const MOTION_WAKE_THRESHOLD: f32 = 0.18;
/// Weight of the smaller motion sample in the running estimate
const MIN_BIAS: f32 = 0.9;
/// Step length the thresholds were tuned for
const BASE_DELTA: f32 = 1000.0 / 60.0;

/// Classify every body as resting or moving. `delta` is the scaled step length.
#[allow(clippy::cast_precision_loss)]
pub fn update<'a>(bodies: impl IntoIterator<Item = &'a mut Body>, delta: f32) {
    let time_factor = delta / BASE_DELTA;

    for body in bodies {
        if body.is_static {
            continue;
        }
        // Anything pushing a body keeps it awake
        if !body.force.is_zero() || body.torque != 0.0 {
            set(body, false);
            continue;
        }

        let motion = body.speed * body.speed + body.angular_speed * body.angular_speed;
        let min_motion = body.motion.min(motion);
        let max_motion = body.motion.max(motion);
        body.motion = MIN_BIAS * min_motion + (1.0 - MIN_BIAS) * max_motion;

        if body.sleep_threshold > 0 && body.motion < MOTION_SLEEP_THRESHOLD {
            body.sleep_counter += 1;
            if body.sleep_counter as f32 >= body.sleep_threshold as f32 / time_factor {
                set(body, true);
            }
        } else if body.sleep_counter > 0 {
            body.sleep_counter -= 1;
        }
    }
}

/// Wake sleeping bodies hit by a sufficiently moving body
pub fn after_collisions(pairs: &[Pair], bodies: &mut BodySet<'_>, time_scale: f32) {
    let wake_threshold = MOTION_WAKE_THRESHOLD * time_scale.powi(3);

    for pair in pairs.iter().filter(|p| p.is_active) {
        let Some((body_a, body_b)) = bodies.pair_mut(pair.body_a, pair.body_b) else {
            continue;
        };
        if (body_a.is_sleeping && body_b.is_sleeping) || body_a.is_static || body_b.is_static {
            continue;
        }
        if !(body_a.is_sleeping || body_b.is_sleeping) {
            continue;
        }

        let (sleeping, moving) = if body_a.is_sleeping { (body_a, body_b) } else { (body_b, body_a) };
        if moving.motion > wake_threshold {
            set(sleeping, false);
        }
    }
}

/// Put a body to sleep or wake it
pub fn set(body: &mut Body, is_sleeping: bool) {
    let was_sleeping = body.is_sleeping;

    if is_sleeping {
        body.is_sleeping = true;
        body.sleep_counter = body.sleep_threshold;
        body.position_impulse = Vec2::ZERO;
        body.position_prev = body.position;
        body.angle_prev = body.angle;
        body.velocity = Vec2::ZERO;
        body.angular_velocity = 0.0;
        body.speed = 0.0;
        body.angular_speed = 0.0;
        body.motion = 0.0;
        if !was_sleeping {
            tracing::trace!(body = body.id, "sleep");
        }
    } else {
        body.is_sleeping = false;
        body.sleep_counter = 0;
        if was_sleeping {
            tracing::trace!(body = body.id, "wake");
        }
    }
}
