//! Engine configuration
//!
//! Every struct here is `#[serde(default)]`, so a partial JSON document is
//! deep-merged over the structured defaults: any field left out keeps its
//! default value, at every nesting level.

use serde::{Deserialize, Serialize};

use crate::collision::BroadphaseOptions;
use crate::composite::Gravity;
use crate::error::PhysicsError;
use crate::render::RenderOptions;
use crate::timing::TimingOptions;
use crate::types::Bounds;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldOptions {
    pub gravity: Gravity,
    /// Unbounded when absent
    pub bounds: Option<Bounds>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub enabled: bool,
    pub position_iterations: u32,
    pub velocity_iterations: u32,
    pub constraint_iterations: u32,
    pub enable_sleeping: bool,
    pub time_scale: f32,
    pub timing: TimingOptions,
    pub broadphase: BroadphaseOptions,
    pub world: WorldOptions,
    pub render: RenderOptions,
    /// Count bodies, constraints and buckets every step
    pub extended_metrics: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            position_iterations: 6,
            velocity_iterations: 4,
            constraint_iterations: 2,
            enable_sleeping: false,
            time_scale: 1.0,
            timing: TimingOptions::default(),
            broadphase: BroadphaseOptions::default(),
            world: WorldOptions::default(),
            render: RenderOptions::default(),
            extended_metrics: false,
        }
    }
}

impl EngineOptions {
    /// Parse a (possibly partial) JSON document over the defaults
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PhysicsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BroadphaseKind;

    #[test]
    fn partial_documents_merge_over_defaults() {
        let options = EngineOptions::from_json(
            r#"{
                "positionIterations": 10,
                "timing": { "maxStepsPerTick": 3 },
                "broadphase": { "kind": "bruteForce" },
                "world": { "gravity": { "y": -1 } }
            }"#,
        )
        .unwrap();

        assert_eq!(options.position_iterations, 10);
        assert_eq!(options.velocity_iterations, 4);
        assert_eq!(options.timing.max_steps_per_tick, 3);
        assert_eq!(options.timing.fps, 60.0);
        assert_eq!(options.broadphase.kind, BroadphaseKind::BruteForce);
        assert_eq!(options.broadphase.grid.bucket_width, 48.0);
        assert_eq!(options.world.gravity.y, -1.0);
        assert_eq!(options.world.gravity.scale, 0.001);
        assert!(options.render.enabled);
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(EngineOptions::from_json("{}").unwrap(), EngineOptions::default());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let err = EngineOptions::from_json(r#"{ "positionIterations": "lots" }"#).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidOptions(_)));
    }

    #[test]
    fn bounded_worlds_round_trip() {
        let mut options = EngineOptions::default();
        options.world.bounds = Some(Bounds::new(crate::types::Vec2::ZERO, crate::types::Vec2::new(800.0, 600.0)));
        let parsed = EngineOptions::from_json(&options.to_json().unwrap()).unwrap();
        assert_eq!(parsed, options);
    }
}
