//! Spatial index throughput: bulk insert, viewport queries and fat-bounds churn.
//!
//! Run with: cargo bench --bench spatial_index

use bevy_ecs::prelude::Entity;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moonbase_sim::spatial::{Rect, SpatialIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BODIES: u32 = 2_000;

fn field(rng: &mut StdRng) -> Vec<(Rect, Entity)> {
    (0..BODIES)
        .map(|i| {
            let x = rng.gen_range(-5000.0..5000.0);
            let y = rng.gen_range(-5000.0..5000.0);
            (Rect::around_circle(x, y, 48.0), Entity::from_raw(i))
        })
        .collect()
}

fn bench_index(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let bodies = field(&mut rng);

    c.bench_function("insert 2000", |b| {
        b.iter(|| {
            let mut index = SpatialIndex::new(300.0);
            for (rect, e) in &bodies {
                index.insert(*rect, *e);
            }
            black_box(index.len())
        })
    });

    let mut index = SpatialIndex::new(300.0);
    for (rect, e) in &bodies {
        index.insert(*rect, *e);
    }

    c.bench_function("viewport query", |b| {
        let view = Rect::from_center(0.0, 0.0, 3000.0, 3000.0);
        b.iter(|| black_box(index.query(view).iter().count()))
    });

    c.bench_function("probe queries", |b| {
        b.iter(|| {
            let mut hits = 0;
            for (rect, _) in bodies.iter().take(200) {
                hits += index.query(*rect).iter().count();
            }
            black_box(hits)
        })
    });

    c.bench_function("move 200 bodies", |b| {
        b.iter(|| {
            for (rect, e) in bodies.iter().take(200) {
                index.remove(*rect, *e);
                let moved = Rect::new(rect.min_x + 1.0, rect.min_y, rect.max_x + 1.0, rect.max_y);
                index.insert(moved, *e);
                index.remove(moved, *e);
                index.insert(*rect, *e);
            }
        })
    });
}

criterion_group!(benches, bench_index);
criterion_main!(benches);
