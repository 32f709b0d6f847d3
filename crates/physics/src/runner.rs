//! # Scheduler
//!
//! `heartbeat` turns wall-clock timestamps into a whole number of fixed steps
//! and fires the tick, render and collision events around them. `run` drives
//! heartbeats from a background thread until cancelled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::PhysicsError;
use crate::events::{Event, EventName, EventSource};

impl Engine {
    /// Advance to `timestamp` (milliseconds, monotonic; `None` counts as 0).
    ///
    /// Runs as many fixed steps as the accumulated time allows, capped at
    /// `timing.max_steps_per_tick`. Backlog left by the cap is kept for later
    /// heartbeats. Returns the number of steps run. Does nothing while the
    /// engine is disabled.
    #[allow(clippy::cast_precision_loss)]
    pub fn heartbeat(&mut self, timestamp: impl Into<Option<f64>>) -> u32 {
        if !self.enabled {
            return 0;
        }
        let timestamp = timestamp.into().unwrap_or(0.0);

        self.emit(&[EventName::BeforeTick], timestamp);

        self.timing.advance(timestamp);

        if self.world.is_modified() {
            self.render.controller.clear();
        }

        let mut steps = 0;
        while self.timing.step_ready() && steps < self.timing.max_steps_per_tick {
            self.emit(&[EventName::Tick, EventName::BeforeUpdate], timestamp);

            self.update(self.timing.delta as f32, self.timing.correction);
            self.trigger_collision_events(timestamp);

            self.timing.consume_step();
            steps += 1;
        }

        if self.timing.step_ready() {
            debug!(
                steps,
                backlog_ms = self.timing.accumulator,
                "step cap reached, simulation is lagging"
            );
        }

        self.emit(&[EventName::AfterUpdate, EventName::BeforeRender], timestamp);

        if self.render.enabled {
            self.render.controller.world(&self.world, &self.timing);
        }

        self.emit(&[EventName::AfterTick, EventName::AfterRender], timestamp);
        steps
    }

    /// Emit the non-empty collision lifecycle lists of the latest step
    fn trigger_collision_events(&mut self, timestamp: f64) {
        let lists = [
            (EventName::CollisionStart, self.pairs.collision_start()),
            (EventName::CollisionActive, self.pairs.collision_active()),
            (EventName::CollisionEnd, self.pairs.collision_end()),
        ];
        for (name, pairs) in lists {
            if pairs.is_empty() || !self.events.has_listeners(name) {
                continue;
            }
            let event = Event {
                name,
                timestamp,
                source: EventSource { world: &self.world, timing: &self.timing, metrics: &self.metrics },
                pairs: Some(pairs),
            };
            self.events.trigger(&[name], event, &mut self.commands);
        }
    }
}

/// Cloneable cancellation token for a running engine
#[derive(Clone, Debug, Default)]
pub struct RunHandle {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
}

impl RunHandle {
    /// Stop scheduling heartbeats. A heartbeat in progress completes.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Heartbeats issued so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// An engine being driven on its own thread
#[derive(Debug)]
pub struct Runner {
    handle: RunHandle,
    thread: JoinHandle<Engine>,
}

/// Drive `engine` at its configured frame rate, calling `heartbeat` with the
/// milliseconds elapsed since the runner started
pub fn run(mut engine: Engine) -> Runner {
    let handle = RunHandle::default();
    handle.running.store(true, Ordering::Release);

    let token = handle.clone();
    let frame_duration = Duration::from_secs_f32(1.0 / engine.timing.fps.max(1.0));
    info!(fps = engine.timing.fps, "engine runner started");

    let thread = thread::spawn(move || {
        let start = Instant::now();
        while token.is_running() {
            let frame_start = Instant::now();

            engine.heartbeat(start.elapsed().as_secs_f64() * 1000.0);
            token.ticks.fetch_add(1, Ordering::Relaxed);

            let frame_time = frame_start.elapsed();
            if frame_time < frame_duration {
                thread::sleep(frame_duration - frame_time);
            }
        }
        info!(ticks = token.ticks(), "engine runner stopped");
        engine
    });

    Runner { handle, thread }
}

impl Runner {
    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    /// Cancel scheduling and take the engine back
    pub fn stop(self) -> Result<Engine, PhysicsError> {
        self.handle.stop();
        self.thread.join().map_err(|_| PhysicsError::RunnerPanicked)
    }
}
