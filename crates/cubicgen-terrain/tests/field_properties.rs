//! Properties of the field algebra and block replacement that hold
//! independently of any generator configuration.

use std::sync::Arc;

use cubicgen_terrain::field::Sign;
use cubicgen_terrain::{BlockReplacer, FieldGraph, NoiseSource, ReplaceContext, ReplacerChain, octave_seeds};
use cubicgen_voxel::{BiomeId, BlockId};
use glam::{DVec3, IVec3};
use noise::{NoiseFn, Perlin};

#[test]
fn test_scaled_noise_layer_matches_raw_noise() {
    let mut graph = FieldGraph::new();
    let noise = graph.source(NoiseSource::new(42, DVec3::splat(0.01), 1));
    let scaled = graph.mul(noise, 10.0);
    let layer = graph.add(scaled, 0.0);

    let raw = Perlin::new(octave_seeds(42, 1)[0]);
    for p in [IVec3::ZERO, IVec3::new(13, 7, -5), IVec3::new(-250, 31, 99)] {
        let expected = raw.get([p.x as f64 * 0.01, p.y as f64 * 0.01, p.z as f64 * 0.01]) * 10.0;
        assert_eq!(graph.eval_uncached(layer, p), expected, "at {p}");
    }
}

#[test]
fn test_cache_is_transparent() {
    let mut graph = FieldGraph::new();
    let noise = graph.source(NoiseSource::new(9, DVec3::splat(0.02), 4));
    let flat = graph.source(NoiseSource::new(10, DVec3::new(0.02, 0.0, 0.02), 4));
    let sum = graph.add(noise, flat);
    let cached = graph.cached_3d(sum);
    let flat_cached = graph.cached_2d(flat);
    let mut caches = graph.new_caches();

    // Two passes so the second is served from the caches, plus positions
    // outside one cube so slots are overwritten.
    for _ in 0..2 {
        for y in (-20..20).step_by(7) {
            for z in -20..20 {
                for x in (-20..20).step_by(3) {
                    let p = IVec3::new(x, y, z);
                    assert_eq!(graph.eval(cached, p, &mut caches), graph.eval_uncached(sum, p));
                    assert_eq!(graph.eval(flat_cached, p, &mut caches), graph.eval_uncached(flat, p));
                }
            }
        }
    }
    assert!(caches.stats().hits > 0, "the second pass must hit");
}

#[test]
fn test_interpolation_error_is_bounded_on_smooth_field() {
    let mut graph = FieldGraph::new();
    let smooth = graph.source(|p: IVec3| {
        (p.x as f64 / 16.0).sin() + (p.z as f64 / 16.0).cos() + p.y as f64 / 32.0
    });
    let mut caches = graph.new_caches();
    let start = IVec3::new(-8, -3, 5);
    let mut visited = 0;
    let mut worst = 0.0f64;
    graph.for_each_scaled(smooth, start, start + IVec3::new(4, 2, 4), IVec3::new(4, 8, 4), &mut caches, |s| {
        visited += 1;
        worst = worst.max((s.value - graph.eval_uncached(smooth, s.pos)).abs());
    });
    assert_eq!(visited, 16 * 16 * 16);
    // h²/8 · max|f''| = 16/8 · 1/256 per horizontal axis.
    assert!(worst < 0.02, "interpolation error {worst}");
}

#[test]
fn test_conditional_ops_follow_sign() {
    let mut graph = FieldGraph::new();
    let y = graph.coordinate(cubicgen_terrain::field::Axis::Y);
    let shaped = graph.mul_if(Sign::Negative, y, -0.5);
    assert_eq!(graph.eval_uncached(shaped, IVec3::new(0, -4, 0)), 2.0);
    assert_eq!(graph.eval_uncached(shaped, IVec3::new(0, 4, 0)), 4.0);
}

#[test]
fn test_replacer_chain_order_matters() {
    let stone: Arc<dyn BlockReplacer> = Arc::new(|_: BlockId, _: &ReplaceContext| BlockId::STONE);
    let weather: Arc<dyn BlockReplacer> = Arc::new(|prev: BlockId, _: &ReplaceContext| {
        if prev == BlockId::STONE { BlockId::DIRT } else { BlockId::SAND }
    });
    let ab = ReplacerChain::new(vec![stone.clone(), weather.clone()]);
    let ba = ReplacerChain::new(vec![weather, stone]);
    let ctx = ReplaceContext {
        pos: IVec3::new(1, 2, 3),
        frac: DVec3::ZERO,
        density: 1.0,
        gradient: DVec3::ZERO,
        biome: BiomeId(0),
        water_level: 63,
    };
    assert_eq!(ab.apply(&ctx), BlockId::DIRT);
    assert_eq!(ba.apply(&ctx), BlockId::STONE);
}
