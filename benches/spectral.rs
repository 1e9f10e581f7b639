use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use swimcube::prelude::*;

/// Build a time-domain cube through the reconstructor
fn generate_cube(n_pulses: usize, n_channels: usize) -> TimeDomainCube {
    let mut storage = InMemoryArrayStorage::new();
    storage.insert(1, (0..n_channels).map(|c| 100.0 + c as f64 * 0.01).collect());

    let records: Vec<AcquisitionRecord> = (0..n_pulses as u64)
        .map(|i| {
            let intensities = (0..n_channels as u64)
                .map(|c| ((i * 7919 + c * 104_729) % 1000) as f64)
                .collect();
            storage.insert(10 + i, intensities);
            AcquisitionRecord::new(i as f64, 1, 10 + i)
        })
        .collect();

    let axis = MassAxis::new(storage.read_doubles(1).expect("Mass axis missing"));
    TimeDomainReconstructor::new(&storage, axis, n_pulses)
        .reconstruct(&records)
        .expect("Reconstruction failed")
        .cube
}

/// Compare the bulk transform against per-channel transforms
fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("power_spectra");
    group.sample_size(20);

    for (n_pulses, n_channels) in [(256, 1_000), (2048, 500), (2048, 4_000)] {
        let cube = generate_cube(n_pulses, n_channels);
        group.throughput(Throughput::Elements((n_pulses * n_channels) as u64));

        for strategy in [ResolvedStrategy::Batched, ResolvedStrategy::ChannelAtATime] {
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), format!("{}x{}", n_pulses, n_channels)),
                &cube,
                |b, cube| {
                    let transformer = SpectralTransformer::new(1.0);
                    b.iter(|| transformer.transform_with(cube, strategy));
                },
            );
        }
    }

    group.finish();
}

/// Cost of the full reconstruction step
fn bench_reconstruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruction");

    for n_channels in [1_000, 10_000] {
        group.throughput(Throughput::Elements((2048 * n_channels) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_channels),
            &n_channels,
            |b, &n_channels| {
                b.iter(|| generate_cube(2048, n_channels));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_reconstruction);
criterion_main!(benches);
