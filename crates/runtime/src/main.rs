#![deny(clippy::all, clippy::pedantic)]
//! # rigid2d Runtime
//!
//! Entry point for the demo binary.
//!
//! Drops a pile of circles onto a static floor and steps it. By default the
//! engine runs headless on a synthetic clock as fast as possible; `--realtime`
//! hands it to the runner thread and the wall clock instead.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rigid2d::{run, Body, BroadphaseKind, Engine, EngineOptions, RenderKind, Vec2};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "runtime_main", about = "Drop a pile of circles onto a floor")]
struct Args {
    /// Engine options as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Dynamic bodies in the pile
    #[arg(long, default_value_t = 60)]
    bodies: u16,

    /// Drive the engine from the wall clock on a runner thread
    #[arg(long)]
    realtime: bool,

    /// Override the broadphase strategy (`grid` or `bruteForce`)
    #[arg(long)]
    broadphase: Option<BroadphaseKind>,
}

/// How heartbeats are scheduled
enum ExecutionMode {
    /// Synthetic timestamps, one frame after another
    Headless,
    /// Wall-clock timestamps on the runner thread
    Realtime,
}

impl From<&Args> for ExecutionMode {
    fn from(args: &Args) -> Self {
        if args.realtime {
            ExecutionMode::Realtime
        } else {
            ExecutionMode::Headless
        }
    }
}

/// Contact counters shared with the collision listeners
#[derive(Clone, Default)]
struct ContactLog {
    started: Arc<AtomicUsize>,
    ended: Arc<AtomicUsize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(io::stdout().is_terminal())
        .init();

    let args = Args::parse();
    let mut options = load_options(args.config.as_ref())?;
    if let Some(kind) = args.broadphase {
        options.broadphase.kind = kind;
    }
    options.render.controller = RenderKind::Instances;

    let mut engine = Engine::create(options);
    build_scene(&mut engine, args.bodies);
    let contacts = attach_listeners(&mut engine)?;

    let engine = match ExecutionMode::from(&args) {
        ExecutionMode::Headless => {
            info!("Running in headless mode.");
            run_headless(engine, args.seconds)
        }
        ExecutionMode::Realtime => {
            info!("Running in realtime mode.");
            let runner = run(engine);
            thread::sleep(Duration::from_secs_f64(args.seconds.max(0.0)));
            runner.stop()?
        }
    };

    let sleeping = engine.world.all_bodies().iter().filter(|b| b.is_sleeping).count();
    let metrics = serde_json::to_string(&engine.metrics)?;
    info!(
        steps = engine.timing.total_updates,
        started = contacts.started.load(Ordering::Relaxed),
        ended = contacts.ended.load(Ordering::Relaxed),
        sleeping,
        frame_bytes = engine.render.controller.bytes().len(),
        metrics = %metrics,
        "Simulation finished"
    );
    Ok(())
}

fn load_options(path: Option<&PathBuf>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    EngineOptions::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn build_scene(engine: &mut Engine, bodies: u16) {
    for i in 0..32u8 {
        engine
            .world
            .add_body(Body::fixed(Vec2::new(f32::from(i) * 25.0, 600.0), 14.0).with_label("floor"));
    }
    for i in 0..bodies {
        let x = f32::from(i % 24) * 30.0 + 20.0 + f32::from(i / 24 % 2) * 10.0;
        let y = 400.0 - f32::from(i / 24) * 30.0;
        engine.world.add_body(Body::circle(Vec2::new(x, y), 12.0).with_restitution(0.3));
    }
    debug!(bodies = engine.world.all_bodies().len(), "scene built");
}

fn attach_listeners(engine: &mut Engine) -> Result<ContactLog> {
    let log = ContactLog::default();

    let started = Arc::clone(&log.started);
    engine.on("collisionStart", move |event, _| {
        let count = event.pairs.map_or(0, |pairs| pairs.len());
        started.fetch_add(count, Ordering::Relaxed);
        debug!(timestamp = event.timestamp, count, "contacts started");
    })?;

    let ended = Arc::clone(&log.ended);
    engine.on("collisionEnd", move |event, _| {
        ended.fetch_add(event.pairs.map_or(0, |pairs| pairs.len()), Ordering::Relaxed);
    })?;

    Ok(log)
}

/// Step the engine with a synthetic clock that advances exactly one step per
/// frame, so a run of `seconds` always executes the same number of steps
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn run_headless(mut engine: Engine, seconds: f64) -> Engine {
    let delta = engine.timing.delta_ms();
    let frames = (seconds.max(0.0) * 1000.0 / delta).ceil() as u32;
    let report_every = (1000.0 / delta).round().max(1.0) as u32;

    for frame in 0..=frames {
        engine.heartbeat(f64::from(frame) * delta);
        if frame > 0 && frame % report_every == 0 {
            info!(
                second = frame / report_every,
                steps = engine.timing.total_updates,
                pairs = engine.pairs.len(),
                "simulation progress"
            );
        }
    }
    engine
}
