//! Criterion benchmarks for the tangent-pair steps against the phantom host.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p beamplan

use beamplan::api::{
    breast_isocenter, breast_phantom, optimize, search_gantry_angle, BeamBuilder, BeamGeometry,
    GantryCfg, Laterality, MachineParams, RectAperture, SimplexCfg, AVOID_ID, TARGET_ID,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

fn template(side: Laterality) -> BeamGeometry {
    BeamGeometry {
        jaws: match side {
            Laterality::Left => RectAperture::new(-100.0, -100.0, 0.0, 100.0),
            Laterality::Right => RectAperture::new(100.0, -100.0, 0.0, 100.0),
        },
        isocenter: breast_isocenter(side),
        ..BeamGeometry::default()
    }
}

fn bench_gantry_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    for side in [Laterality::Left, Laterality::Right] {
        group.bench_function(format!("gantry_scan_{side:?}"), |b| {
            b.iter_batched(
                || breast_phantom(side),
                |mut host| {
                    let _res = search_gantry_angle(
                        &mut host,
                        &MachineParams::default(),
                        &template(side),
                        TARGET_ID,
                        AVOID_ID,
                        side,
                        &GantryCfg::default(),
                    )
                    .unwrap();
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("optimize_pair", |b| {
        b.iter_batched(
            || {
                let mut host = breast_phantom(Laterality::Left);
                let mut builder = BeamBuilder::with_geometry(
                    MachineParams::default(),
                    template(Laterality::Left),
                );
                builder.set_next_geometry(builder.next_geometry().with_gantry(300.0));
                builder.create_next_field(&mut host, "MED").unwrap();
                builder.set_lateral_from_medial();
                builder.create_next_field(&mut host, "LAT").unwrap();
                host
            },
            |mut host| {
                let _report = optimize(&mut host, &SimplexCfg::default()).unwrap();
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_gantry_scan);
criterion_main!(benches);
