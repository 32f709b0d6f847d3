//! # Engine
//!
//! The top-level object: configuration, fixed-step timing, the world, the
//! pair registry, the active broadphase and the collaborators the pipeline
//! drives. Stepping lives in the pipeline and runner modules; this
//! module covers creation and the state-level operations `merge` and `clear`.

use std::collections::HashMap;

use tracing::debug;

use crate::body::{next_id, BodyId, BodySet};
use crate::collision::{Broadphase, BroadphaseOptions, Pairs};
use crate::commands::Commands;
use crate::composite::{Composite, World};
use crate::config::{EngineOptions, WorldOptions};
use crate::error::PhysicsError;
use crate::events::{Event, EventName, EventSource, Events};
use crate::metrics::Metrics;
use crate::render::{Render, RenderOptions};
use crate::sleeping;
use crate::timing::Timing;
use crate::types::Bounds;

#[derive(Debug)]
pub struct Engine {
    pub enabled: bool,
    pub position_iterations: u32,
    pub velocity_iterations: u32,
    pub constraint_iterations: u32,
    pub enable_sleeping: bool,
    pub time_scale: f32,
    pub timing: Timing,
    pub world: World,
    pub pairs: Pairs,
    pub metrics: Metrics,
    pub render: Render,
    pub events: Events,
    /// Scene mutations requested by listeners, applied at the next step
    pub commands: Commands,
    pub(crate) broadphase: Broadphase,
    broadphase_options: BroadphaseOptions,
    render_options: RenderOptions,
}

/// What another engine contributes to a [`Engine::merge`]
#[derive(Debug)]
pub struct EngineParts {
    pub options: EngineOptions,
    pub timing: Option<Timing>,
    pub world: Option<World>,
}

impl From<Engine> for EngineParts {
    fn from(engine: Engine) -> Self {
        Self {
            options: engine.options(),
            timing: Some(engine.timing),
            world: Some(engine.world),
        }
    }
}

impl From<EngineOptions> for EngineParts {
    fn from(options: EngineOptions) -> Self {
        Self { options, timing: None, world: None }
    }
}

impl Engine {
    /// Build an engine from options, usually `EngineOptions::default()` with
    /// a few fields overridden
    pub fn create(options: EngineOptions) -> Self {
        let world = Self::build_world(&options.world);
        let engine = Self {
            enabled: options.enabled,
            position_iterations: options.position_iterations,
            velocity_iterations: options.velocity_iterations,
            constraint_iterations: options.constraint_iterations,
            enable_sleeping: options.enable_sleeping,
            time_scale: options.time_scale,
            timing: Timing::new(&options.timing),
            world,
            pairs: Pairs::new(),
            metrics: Metrics::new(options.extended_metrics),
            render: Render::create(&options.render),
            events: Events::new(),
            commands: Commands::new(),
            broadphase: Broadphase::new(&options.broadphase),
            broadphase_options: options.broadphase,
            render_options: options.render,
        };
        debug!(
            delta = engine.timing.delta,
            broadphase = ?engine.broadphase.kind(),
            sleeping = engine.enable_sleeping,
            "engine created"
        );
        engine
    }

    pub fn new() -> Self {
        Self::create(EngineOptions::default())
    }

    /// Build an engine from a partial JSON options document
    pub fn from_json(json: &str) -> Result<Self, PhysicsError> {
        Ok(Self::create(EngineOptions::from_json(json)?))
    }

    fn build_world(options: &WorldOptions) -> World {
        Composite::world(options.gravity, options.bounds.unwrap_or(Bounds::UNBOUNDED))
    }

    /// Current configuration, in the shape `create` accepts
    pub fn options(&self) -> EngineOptions {
        let bounds = self.world.bounds.filter(|b| *b != Bounds::UNBOUNDED);
        EngineOptions {
            enabled: self.enabled,
            position_iterations: self.position_iterations,
            velocity_iterations: self.velocity_iterations,
            constraint_iterations: self.constraint_iterations,
            enable_sleeping: self.enable_sleeping,
            time_scale: self.time_scale,
            timing: crate::timing::TimingOptions {
                fps: self.timing.fps,
                delta: Some(self.timing.delta),
                correction: self.timing.correction,
                max_steps_per_tick: self.timing.max_steps_per_tick,
            },
            broadphase: self.broadphase_options,
            world: WorldOptions {
                gravity: self.world.gravity.unwrap_or_default(),
                bounds,
            },
            render: RenderOptions { enabled: self.render.enabled, ..self.render_options },
            extended_metrics: self.metrics.extended,
        }
    }

    pub fn broadphase(&self) -> &Broadphase {
        &self.broadphase
    }

    /// Switch broadphase strategy and rebuild it against the current world
    pub fn set_broadphase(&mut self, options: BroadphaseOptions) {
        debug!(from = ?self.broadphase.kind(), to = ?options.kind, "switching broadphase");
        self.broadphase = Broadphase::new(&options);
        self.broadphase_options = options;
        self.clear();
    }

    /// Merge another engine, or bare options, into this one.
    ///
    /// Configuration and timing are copied over. A changed broadphase is
    /// rebuilt against the current world. A world, when present,
    /// replaces this engine's world wholesale: every body in it is woken and
    /// given a fresh id (constraints are remapped to match), then the pair
    /// registry and broadphase are rebuilt against it. Listeners and queued
    /// commands stay with `self`.
    pub fn merge(&mut self, other: impl Into<EngineParts>) {
        let EngineParts { options, timing, world } = other.into();

        self.enabled = options.enabled;
        self.position_iterations = options.position_iterations;
        self.velocity_iterations = options.velocity_iterations;
        self.constraint_iterations = options.constraint_iterations;
        self.enable_sleeping = options.enable_sleeping;
        self.time_scale = options.time_scale;
        self.metrics.extended = options.extended_metrics;
        self.timing = timing.unwrap_or_else(|| Timing {
            accumulator: self.timing.accumulator,
            total_updates: self.timing.total_updates,
            timestamp: self.timing.timestamp,
            ..Timing::new(&options.timing)
        });
        if options.render != self.render_options {
            self.render = Render::create(&options.render);
            self.render_options = options.render;
        }
        let broadphase_changed = options.broadphase != self.broadphase_options;
        if broadphase_changed {
            self.broadphase = Broadphase::new(&options.broadphase);
            self.broadphase_options = options.broadphase;
        }

        let Some(mut world) = world else {
            // A fresh index only learns about moving bodies incrementally
            if broadphase_changed {
                self.clear();
            }
            debug!("merged engine options");
            return;
        };

        let remapped = Self::reassign_ids(&mut world);
        self.world = world;
        self.clear();
        debug!(bodies = remapped, "merged engine world");
    }

    /// Wake every body and give it a fresh id. Returns the body count.
    fn reassign_ids(world: &mut World) -> usize {
        let (bodies, constraints) = world.split_mut();
        let mut ids: HashMap<BodyId, BodyId> = HashMap::with_capacity(bodies.len());

        for body in bodies {
            sleeping::set(body, false);
            let id = next_id();
            ids.insert(body.id, id);
            body.id = id;
        }
        for constraint in constraints {
            let remap = |id: Option<BodyId>| id.map(|id| ids.get(&id).copied().unwrap_or(id));
            constraint.body_a = remap(constraint.body_a);
            constraint.body_b = remap(constraint.body_b);
        }
        ids.len()
    }

    /// Empty the pair registry and rebuild the broadphase from the current
    /// world, leaving the world marked unmodified.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.broadphase.clear();

        let world_bounds = self.world.resolved_root().bounds;
        let bodies = BodySet::new(self.world.all_bodies_mut());
        self.broadphase.update(&bodies, &world_bounds, true);

        self.world.set_modified(false, true);
        self.render.controller.clear();
        debug!(bodies = self.world.all_bodies().len(), "engine cleared");
    }

    /// Dispatch `names` with a payload built from the current engine state
    pub(crate) fn emit(&mut self, names: &[EventName], timestamp: f64) {
        let Some(&first) = names.first() else {
            return;
        };
        if !names.iter().any(|&name| self.events.has_listeners(name)) {
            return;
        }
        let event = Event {
            name: first,
            timestamp,
            source: EventSource { world: &self.world, timing: &self.timing, metrics: &self.metrics },
            pairs: None,
        };
        self.events.trigger(names, event, &mut self.commands);
    }

    /// Register a listener on the engine's event bus
    pub fn on<F>(&mut self, names: &str, listener: F) -> Result<crate::events::ListenerId, PhysicsError>
    where
        F: FnMut(&Event<'_>, &mut Commands) + Send + 'static,
    {
        self.events.on(names, listener)
    }

    pub fn off(&mut self, id: crate::events::ListenerId) -> Result<(), PhysicsError> {
        self.events.off(id)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::collision::BroadphaseKind;
    use crate::constraint::Constraint;
    use crate::types::Vec2;

    #[test]
    fn create_applies_options() {
        let engine = Engine::from_json(r#"{ "timing": { "delta": 16, "maxStepsPerTick": 5 } }"#).unwrap();
        assert_eq!(engine.timing.delta, 16);
        assert_eq!(engine.timing.max_steps_per_tick, 5);
        assert_eq!(engine.position_iterations, 6);
        assert_eq!(engine.broadphase().kind(), BroadphaseKind::Grid);
        assert_eq!(engine.options().timing.delta, Some(16));
    }

    #[test]
    fn merge_remaps_constraint_ids() {
        let mut other = Engine::new();
        let a = Body::circle(Vec2::ZERO, 1.0);
        let b = Body::circle(Vec2::new(5.0, 0.0), 1.0);
        other.world.add_constraint(Constraint::between(&a, &b, 1.0));
        other.world.add_body(a);
        other.world.add_body(b);

        let mut engine = Engine::new();
        engine.merge(other);

        let ids: Vec<BodyId> = engine.world.all_bodies().iter().map(|b| b.id).collect();
        let link = engine.world.all_constraints()[0];
        assert_eq!(link.body_a, Some(ids[0]));
        assert_eq!(link.body_b, Some(ids[1]));
    }

    #[test]
    fn merging_options_keeps_world_and_clock() {
        let mut engine = Engine::new();
        engine.world.add_body(Body::circle(Vec2::ZERO, 1.0));
        engine.timing.total_updates = 7;

        let options = EngineOptions { velocity_iterations: 9, ..EngineOptions::default() };
        engine.merge(options);
        assert_eq!(engine.velocity_iterations, 9);
        assert_eq!(engine.timing.total_updates, 7);
        assert_eq!(engine.world.all_bodies().len(), 1);
    }
}
