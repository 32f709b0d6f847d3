//! # Render Collaborators
//!
//! The engine hands its world to a [`RenderController`] once per heartbeat
//! and asks it to drop cached state whenever the scene is restructured. Two
//! controllers ship with the crate: [`NullRender`], which only counts frames,
//! and [`InstanceBuffer`], which packs body transforms into a GPU-ready byte
//! buffer.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::composite::World;
use crate::timing::Timing;
use crate::types::Vec2;

/// Instance flag: the body never moves
pub const FLAG_STATIC: u32 = 1;
/// Instance flag: the body is asleep
pub const FLAG_SLEEPING: u32 = 1 << 1;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub clears: u64,
    pub instances: usize,
}

pub trait RenderController: Send {
    /// Forget any cached scene representation
    fn clear(&mut self);

    /// Draw one frame of `world`
    fn world(&mut self, world: &World, timing: &Timing);

    fn stats(&self) -> RenderStats;

    /// Raw frame data, for controllers that produce any
    fn bytes(&self) -> &[u8] {
        &[]
    }
}

/// Counts frames and draws nothing
#[derive(Debug, Default)]
pub struct NullRender {
    stats: RenderStats,
}

impl RenderController for NullRender {
    fn clear(&mut self) {
        self.stats.clears += 1;
    }

    fn world(&mut self, _world: &World, _timing: &Timing) {
        self.stats.frames += 1;
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }
}

/// Per-body instance data, laid out for a vertex buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub position: Vec2,
    pub radius: f32,
    pub angle: f32,
    /// `FLAG_STATIC` | `FLAG_SLEEPING`
    pub flags: u32,
}

impl From<&Body> for BodyInstance {
    fn from(body: &Body) -> Self {
        let mut flags = 0;
        if body.is_static {
            flags |= FLAG_STATIC;
        }
        if body.is_sleeping {
            flags |= FLAG_SLEEPING;
        }
        Self {
            position: body.position,
            radius: body.radius,
            angle: body.angle,
            flags,
        }
    }
}

/// Rebuilds a packed instance list every frame
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    instances: Vec<BodyInstance>,
    stats: RenderStats,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instances(&self) -> &[BodyInstance] {
        &self.instances
    }
}

impl RenderController for InstanceBuffer {
    fn clear(&mut self) {
        self.instances.clear();
        self.stats.clears += 1;
    }

    fn world(&mut self, world: &World, _timing: &Timing) {
        self.instances.clear();
        self.instances.extend(world.all_bodies().into_iter().map(BodyInstance::from));
        self.stats.frames += 1;
        self.stats.instances = self.instances.len();
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Which controller the engine creates
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderKind {
    #[default]
    Null,
    Instances,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub enabled: bool,
    pub controller: RenderKind,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { enabled: true, controller: RenderKind::Null }
    }
}

/// Render state owned by the engine
pub struct Render {
    pub enabled: bool,
    pub controller: Box<dyn RenderController>,
}

impl Render {
    pub fn create(options: &RenderOptions) -> Self {
        let controller: Box<dyn RenderController> = match options.controller {
            RenderKind::Null => Box::new(NullRender::default()),
            RenderKind::Instances => Box::new(InstanceBuffer::new()),
        };
        Self { enabled: options.enabled, controller }
    }
}

impl std::fmt::Debug for Render {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Render")
            .field("enabled", &self.enabled)
            .field("stats", &self.controller.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{Composite, Gravity};
    use crate::types::Bounds;

    #[test]
    fn instance_buffer_packs_every_body() {
        let mut world = Composite::world(Gravity::default(), Bounds::UNBOUNDED);
        world.add_body(Body::circle(Vec2::new(1.0, 2.0), 3.0));
        world.add_body(Body::fixed(Vec2::ZERO, 10.0));

        let mut buffer = InstanceBuffer::new();
        buffer.world(&world, &Timing::default());
        assert_eq!(buffer.instances().len(), 2);
        assert_eq!(buffer.bytes().len(), 2 * std::mem::size_of::<BodyInstance>());
        assert_eq!(std::mem::size_of::<BodyInstance>(), 20);
        assert_eq!(buffer.instances()[1].flags, FLAG_STATIC);

        buffer.clear();
        assert!(buffer.bytes().is_empty());
        assert_eq!(buffer.stats().clears, 1);
        assert_eq!(buffer.stats().frames, 1);
    }
}
