#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::new_without_default
)]
//! # rigid2d
//!
//! The scheduler and per-step update pipeline of a 2D rigid-body engine.
//!
//! An [`Engine`] owns a scene tree ([`World`]), a collision pair registry, a
//! broadphase strategy and the collaborators that step the scene. A host
//! drives it by calling [`Engine::heartbeat`] with monotonic wall-clock
//! timestamps (or hands it to [`run`]); each heartbeat runs zero or more
//! fixed-length steps through [`Engine::update`] and notifies listeners of
//! what happened.
//!
//! ## Key Components
//!
//! -   **Scheduler:** [`Engine::heartbeat`] accumulates whole milliseconds and
//!     runs fixed steps, at most `max_steps_per_tick` per call.
//! -   **Update Pipeline:** [`Engine::update`] runs gravity, integration,
//!     constraints, broadphase, narrowphase, pair tracking, sleeping and the
//!     contact resolver in a fixed order.
//! -   **Pair Registry:** [`Pairs`] classifies every pair as started, active
//!     or ended once per step.
//! -   **Event Bus:** [`Events`] dispatches the named events synchronously;
//!     listeners request scene changes through [`Commands`].
//!
//! ## Usage
//!
//! ```rust
//! use rigid2d::{Body, Engine, EngineOptions, Vec2};
//!
//! let mut engine = Engine::create(EngineOptions::default());
//! engine.world.add_body(Body::fixed(Vec2::new(0.0, 100.0), 50.0));
//! engine.world.add_body(Body::circle(Vec2::new(0.0, 0.0), 10.0));
//!
//! engine.on("collisionStart", |event, _commands| {
//!     println!("{} new contacts", event.pairs.map_or(0, |pairs| pairs.len()));
//! })?;
//!
//! for frame in 0..120 {
//!     engine.heartbeat(f64::from(frame) * 1000.0 / 60.0);
//! }
//! # Ok::<(), rigid2d::PhysicsError>(())
//! ```

pub mod body;
pub mod collision;
pub mod commands;
pub mod composite;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod events;
pub mod metrics;
mod pipeline;
pub mod render;
pub mod runner;
pub mod sleeping;
pub mod timing;
pub mod types;

pub use body::{next_id, Body, BodyId};
pub use collision::{Broadphase, BroadphaseKind, BroadphaseOptions, Collision, GridOptions, Pair, PairId, Pairs};
pub use commands::{Command, Commands};
pub use composite::{Composite, CompositeId, Gravity, World};
pub use config::{EngineOptions, WorldOptions};
pub use constraint::Constraint;
pub use engine::{Engine, EngineParts};
pub use error::PhysicsError;
pub use events::{Event, EventName, EventSource, Events, ListenerId};
pub use metrics::Metrics;
pub use render::{BodyInstance, InstanceBuffer, NullRender, Render, RenderController, RenderKind, RenderOptions, RenderStats};
pub use runner::{run, RunHandle, Runner};
pub use timing::{Timing, TimingOptions};
pub use types::{Bounds, Vec2};
