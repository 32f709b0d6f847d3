//! # Collision Detection and Response
//!
//! Broadphase strategies produce candidate pairs, the narrowphase confirms
//! them as [`Collision`]s, the pair registry tracks them across steps and the
//! resolver separates the bodies.

mod broad_phase;
mod circle_circle;
mod detector;
mod grid;
mod pair;
mod pairs;
mod response;

pub use broad_phase::*;
pub use circle_circle::*;
pub use detector::*;
pub use grid::*;
pub use pair::*;
pub use pairs::*;
pub use response::*;

use crate::body::BodyId;
use crate::types::Vec2;

/// A confirmed overlap between two bodies for the current step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Contact normal (from body A to body B)
    pub normal: Vec2,
    pub tangent: Vec2,
    /// Penetration depth
    pub depth: f32,
    /// Contact point in world space
    pub support: Vec2,
    /// Combined friction coefficient
    pub friction: f32,
    /// Combined restitution coefficient
    pub restitution: f32,
}

/// Combine friction coefficients using geometric mean
pub(crate) fn combine_friction(f1: f32, f2: f32) -> f32 {
    (f1 * f2).sqrt()
}

/// The bouncier body wins
pub(crate) fn combine_restitution(r1: f32, r2: f32) -> f32 {
    r1.max(r2)
}
