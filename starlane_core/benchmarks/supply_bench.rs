use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use starlane_core::{
    build_headless_app, random_lattice, run_turn, LatticeParams, SupplyConfig, SupplyManager,
};

fn lattice(size: u32) -> LatticeParams {
    LatticeParams {
        empires: 6,
        sources_per_empire: 3,
        max_range: 5,
        ..LatticeParams::new(0xC0FFEE, size, size, 6)
    }
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("supply_update");
    let config = SupplyConfig::default();

    for size in [8u32, 16, 32, 48] {
        let ctx = random_lattice(&lattice(size))
            .to_context()
            .expect("generated lattice is consistent");
        group.bench_with_input(BenchmarkId::new("lattice", size), &size, |b, _| {
            b.iter_batched(
                || (ctx.clone(), SupplyManager::default()),
                |(mut ctx, mut manager)| manager.update(&mut ctx, &config),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn");

    for size in [8u32, 32] {
        group.bench_with_input(BenchmarkId::new("lattice", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut app = build_headless_app();
                    random_lattice(&lattice(size))
                        .spawn(&mut app.world)
                        .expect("generated lattice is consistent");
                    app
                },
                |mut app| {
                    run_turn(&mut app);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(supply_benches, bench_update, bench_turn);
criterion_main!(supply_benches);
