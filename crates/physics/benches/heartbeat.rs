use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rigid2d::{Body, BroadphaseKind, BroadphaseOptions, Engine, EngineOptions, Vec2};

/// A loose pile of circles above a static floor
fn pile(count: u16, kind: BroadphaseKind) -> Engine {
    let mut engine = Engine::create(EngineOptions {
        broadphase: BroadphaseOptions { kind, ..BroadphaseOptions::default() },
        ..EngineOptions::default()
    });
    for i in 0..40u8 {
        engine.world.add_body(Body::fixed(Vec2::new(f32::from(i) * 20.0, 600.0), 12.0));
    }
    for i in 0..count {
        let x = f32::from(i % 30) * 25.0 + 10.0;
        let y = 500.0 - f32::from(i / 30) * 25.0;
        engine.world.add_body(Body::circle(Vec2::new(x, y), 10.0));
    }
    engine
}

fn bench_heartbeat(c: &mut Criterion) {
    let mut group = c.benchmark_group("heartbeat");
    for kind in [BroadphaseKind::Grid, BroadphaseKind::BruteForce] {
        for count in [100u16, 400] {
            group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), count), &count, |b, &count| {
                let mut engine = pile(count, kind);
                let mut now = 0.0;
                engine.heartbeat(now);
                b.iter(|| {
                    now += f64::from(engine.timing.delta);
                    black_box(engine.heartbeat(black_box(now)));
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_heartbeat);
criterion_main!(benches);
