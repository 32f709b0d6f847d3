//! Deferred scene mutations
//!
//! Listeners cannot touch the engine while it is dispatching, so they queue
//! commands instead. The queue is drained at the top of the next step.

use tracing::warn;

use crate::body::{Body, BodyId};
use crate::composite::{CompositeId, Gravity, World};
use crate::sleeping;
use crate::types::Vec2;

#[derive(Debug, Clone)]
pub enum Command {
    /// Add to the composite with this id, or to the world root
    AddBody { composite: Option<CompositeId>, body: Body },
    RemoveBody(BodyId),
    SetPosition(BodyId, Vec2),
    SetVelocity(BodyId, Vec2),
    ApplyForce(BodyId, Vec2),
    SetStatic(BodyId, bool),
    SetSleeping(BodyId, bool),
    SetGravity(Gravity),
    SetEnabled(bool),
    ClearWorld { keep_static: bool },
}

#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id;
        self.push(Command::AddBody { composite: None, body });
        id
    }

    pub fn remove_body(&mut self, id: BodyId) {
        self.push(Command::RemoveBody(id));
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        self.push(Command::SetVelocity(id, velocity));
    }

    pub fn apply_force(&mut self, id: BodyId, force: Vec2) {
        self.push(Command::ApplyForce(id, force));
    }

    pub fn wake(&mut self, id: BodyId) {
        self.push(Command::SetSleeping(id, false));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

impl Command {
    /// Apply to the scene. Commands naming a body or composite that no longer
    /// exists are dropped with a warning.
    pub(crate) fn apply(self, world: &mut World, enabled: &mut bool) {
        match self {
            Self::AddBody { composite: None, body } => {
                world.add_body(body);
            }
            Self::AddBody { composite: Some(id), body } => match world.composite_mut(id) {
                Some(target) => {
                    target.add_body(body);
                }
                None => warn!(composite = id, "dropping queued body for missing composite"),
            },
            Self::RemoveBody(id) => {
                if world.remove_body(id).is_none() {
                    warn!(body = id, "queued removal of missing body");
                }
            }
            Self::SetGravity(gravity) => world.gravity = Some(gravity),
            Self::SetEnabled(value) => *enabled = value,
            Self::ClearWorld { keep_static } => world.clear(keep_static),
            Self::SetPosition(id, position) => with_body(world, id, |body| body.set_position(position)),
            Self::SetVelocity(id, velocity) => with_body(world, id, |body| {
                sleeping::set(body, false);
                body.set_velocity(velocity);
            }),
            Self::ApplyForce(id, force) => with_body(world, id, |body| body.apply_force(force)),
            Self::SetStatic(id, value) => with_body(world, id, |body| body.set_static(value)),
            Self::SetSleeping(id, value) => with_body(world, id, |body| sleeping::set(body, value)),
        }
    }
}

fn with_body(world: &mut World, id: BodyId, f: impl FnOnce(&mut Body)) {
    match world.body_mut(id) {
        Some(body) => f(body),
        None => warn!(body = id, "queued command for missing body"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Composite;
    use crate::types::Bounds;

    #[test]
    fn drained_commands_mutate_the_world() {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        world.set_modified(false, true);
        let mut enabled = true;

        let mut commands = Commands::new();
        let id = commands.add_body(Body::circle(Vec2::ZERO, 1.0));
        commands.set_velocity(id, Vec2::new(1.0, 0.0));
        commands.push(Command::SetEnabled(false));
        for command in commands.take() {
            command.apply(&mut world, &mut enabled);
        }

        assert!(commands.is_empty());
        assert!(world.is_modified());
        assert!(!enabled);
        let body = world.body(id).unwrap();
        assert_eq!(body.position - body.position_prev, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn missing_targets_are_skipped() {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        let mut enabled = true;
        Command::RemoveBody(u64::MAX).apply(&mut world, &mut enabled);
        Command::ApplyForce(u64::MAX, Vec2::new(1.0, 0.0)).apply(&mut world, &mut enabled);
        assert!(world.all_bodies().is_empty());
    }
}
