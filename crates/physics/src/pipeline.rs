//! # Update Pipeline
//!
//! One fixed step. The phase order is load-bearing:
//!
//! 1.  drain queued commands
//! 2.  reset step metrics
//! 3.  sleep classification (when sleeping is enabled)
//! 4.  gravity and integration, per composite, with resolved gravity/bounds
//! 5.  constraint iterations, then constraint post-solve
//! 6.  broadphase (flushed when the world was restructured)
//! 7.  narrowphase
//! 8.  pair registry update, expiry and lifecycle partition
//! 9.  wake bodies hit by moving bodies (when sleeping is enabled)
//! 10. velocity pre-solve and iterations
//! 11. position iterations and post-solve
//! 12. metrics update
//! 13. force reset, then the modified flag is cleared through the tree

use tracing::trace;

use crate::body::{self, BodySet};
use crate::collision::{post_solve_position, pre_solve_velocity, solve_position, solve_velocity};
use crate::constraint;
use crate::engine::Engine;
use crate::sleeping;

impl Engine {
    /// Advance the world by one step of `delta` milliseconds. Pure with
    /// respect to wall-clock time: only `delta` and `correction` are read.
    pub fn update(&mut self, delta: f32, correction: f32) {
        for command in self.commands.take() {
            command.apply(&mut self.world, &mut self.enabled);
        }

        self.metrics.reset();

        let time_scale = self.time_scale;
        let scaled_delta = delta * time_scale;
        let world_modified = self.world.is_modified();
        let world_bounds = self.world.resolved_root().bounds;
        let timestamp = self.timing.local_timestamp();

        if self.enable_sleeping {
            sleeping::update(self.world.all_bodies_mut(), scaled_delta);
        }

        self.world.for_each_resolved_mut(&mut |composite, resolved| {
            let gravity = resolved.gravity;
            body::apply_gravity_all(&mut composite.bodies, gravity.vector(), gravity.scale);
            body::update_all(&mut composite.bodies, scaled_delta, time_scale, correction, &resolved.bounds);
        });

        let (bodies, constraints) = self.world.split_mut();
        let mut bodies = BodySet::new(bodies);

        for _ in 0..self.constraint_iterations {
            constraint::solve_all(&constraints, &mut bodies, time_scale);
        }
        constraint::post_solve_all(bodies.as_mut_slice().iter_mut().map(|b| &mut **b));

        if world_modified {
            self.broadphase.clear();
        }
        self.broadphase.update(&bodies, &world_bounds, world_modified);
        let collisions = self.broadphase.detect(&bodies, &mut self.metrics);

        self.pairs.update(&collisions, timestamp);
        self.pairs.remove_old(timestamp, self.timing.delta_ms(), &bodies);
        self.pairs.partition();

        if self.enable_sleeping {
            sleeping::after_collisions(self.pairs.list(), &mut bodies, time_scale);
        }

        pre_solve_velocity(self.pairs.list_mut(), &mut bodies);
        for _ in 0..self.velocity_iterations {
            solve_velocity(self.pairs.list_mut(), &mut bodies);
        }

        for _ in 0..self.position_iterations {
            solve_position(self.pairs.list_mut(), &mut bodies);
        }
        post_solve_position(bodies.as_mut_slice().iter_mut().map(|b| &mut **b));

        self.metrics.update(&self.world, &self.pairs, &self.broadphase);
        trace!(
            step = self.timing.total_updates,
            timestamp,
            pairs = self.pairs.len(),
            started = self.pairs.collision_start().len(),
            ended = self.pairs.collision_end().len(),
            collisions = self.metrics.collisions,
            "step"
        );

        body::reset_forces_all(self.world.all_bodies_mut());
        if world_modified {
            self.world.set_modified(false, true);
        }
    }
}
