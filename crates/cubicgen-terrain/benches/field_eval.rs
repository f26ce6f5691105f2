use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use cubicgen_config::GeneratorSettings;
use cubicgen_math::CubePos;
use cubicgen_terrain::*;
use glam::IVec3;

fn bench_noise_sample(c: &mut Criterion) {
    let noise = NoiseSource::new(42, glam::DVec3::splat(0.005), 16);
    c.bench_function("noise_16_octaves", |bencher| {
        bencher.iter(|| black_box(noise.sample(black_box(glam::DVec3::new(123.0, 64.0, -77.0)))))
    });
}

fn bench_scaled_terrain_field(c: &mut Criterion) {
    let settings = GeneratorSettings::default();
    let catalogue = Arc::new(BiomeRegistry::default_catalogue().unwrap());
    let biomes = Arc::new(BiomeSource::for_settings(42, &settings, catalogue).unwrap());
    let (graph, terrain) = build_terrain_graph(42, &settings, &biomes);
    let mut caches = graph.new_caches();
    let start = IVec3::new(12, 8, -8);
    c.bench_function("terrain_field_scaled_cube", |bencher| {
        bencher.iter(|| {
            let mut sum = 0.0;
            graph.for_each_scaled(terrain, start, start + SAMPLE_CELLS, SAMPLE_STRIDE, &mut caches, |s| {
                sum += s.value;
            });
            black_box(sum)
        })
    });
}

fn bench_generate_cube(c: &mut Criterion) {
    let handle = GeneratorHandle::new(42, GeneratorSettings::default()).unwrap();
    let mut worker = handle.worker();
    c.bench_function("generate_surface_cube", |bencher| {
        bencher.iter(|| black_box(worker.generate_cube(black_box(CubePos::new(3, 4, -2))).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_noise_sample,
    bench_scaled_terrain_field,
    bench_generate_cube,
);
criterion_main!(benches);
