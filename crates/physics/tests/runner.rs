use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use rigid2d::{run, Body, Engine, Vec2};

#[test]
fn runner_drives_heartbeats_until_stopped() -> Result<()> {
    let mut engine = Engine::new();
    engine.world.add_body(Body::circle(Vec2::ZERO, 5.0));

    let ticks = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&ticks);
    engine.on("afterTick", move |_, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    })?;

    let runner = run(engine);
    let handle = runner.handle();
    thread::sleep(Duration::from_millis(250));
    assert!(handle.is_running());

    let engine = runner.stop()?;
    assert!(!handle.is_running());
    assert!(handle.ticks() > 0);
    assert_eq!(ticks.load(Ordering::Relaxed), handle.ticks());
    assert!(engine.timing.total_updates > 0);
    assert!(engine.world.all_bodies()[0].position.y > 0.0);

    // No further heartbeats once stopped
    let after = handle.ticks();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.ticks(), after);
    Ok(())
}
