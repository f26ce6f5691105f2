//! Seeded multi-octave Perlin noise normalized to a configurable range.
//!
//! Each octave owns its own permutation table. Octave seeds are drawn in order
//! from a ChaCha8 stream seeded with the source seed, so the same seed always
//! reproduces the same octave tables.

use glam::{DVec3, IVec3};
use noise::{NoiseFn, Perlin};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::field::ScalarField;

/// Builder for a [`NoiseSource`].
#[derive(Clone, Debug)]
pub struct NoiseSourceBuilder {
    seed: u64,
    frequency: DVec3,
    octaves: u32,
    range: (f64, f64),
}

impl Default for NoiseSourceBuilder {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: DVec3::splat(1.0),
            octaves: 1,
            range: (-1.0, 1.0),
        }
    }
}

impl NoiseSourceBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Base frequency per axis. A zero axis makes the source invariant along it.
    pub fn frequency(mut self, fx: f64, fy: f64, fz: f64) -> Self {
        self.frequency = DVec3::new(fx, fy, fz);
        self
    }

    /// Number of octaves; clamped to at least one.
    pub fn octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.max(1);
        self
    }

    /// Output range the fractal sum is mapped onto.
    pub fn normalize_to(mut self, lo: f64, hi: f64) -> Self {
        self.range = (lo, hi);
        self
    }

    pub fn build(self) -> NoiseSource {
        let layers = octave_seeds(self.seed, self.octaves)
            .into_iter()
            .map(Perlin::new)
            .collect();
        let total_amplitude = (0..self.octaves).map(|i| 0.5f64.powi(i as i32)).sum();
        NoiseSource {
            layers,
            frequency: self.frequency,
            total_amplitude,
            range: self.range,
        }
    }
}

/// Per-octave Perlin seeds derived from a single 64-bit seed.
pub fn octave_seeds(seed: u64, octaves: u32) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..octaves).map(|_| rng.next_u32()).collect()
}

/// Fractal-sum Perlin noise: octave `i` is sampled at `frequency * 2^i` with
/// amplitude `0.5^i`, the sum is divided by the total amplitude, clamped to
/// `[-1, 1]` and mapped linearly onto the configured output range.
pub struct NoiseSource {
    layers: Vec<Perlin>,
    frequency: DVec3,
    total_amplitude: f64,
    range: (f64, f64),
}

impl NoiseSource {
    pub fn builder() -> NoiseSourceBuilder {
        NoiseSourceBuilder::default()
    }

    /// Source normalized to `[-1, 1]`.
    pub fn new(seed: u64, frequency: DVec3, octaves: u32) -> Self {
        Self::builder()
            .seed(seed)
            .frequency(frequency.x, frequency.y, frequency.z)
            .octaves(octaves)
            .build()
    }

    /// Sample at a real-valued position.
    pub fn sample(&self, pos: DVec3) -> f64 {
        let mut total = 0.0;
        let mut scale = 1.0;
        let mut amplitude = 1.0;
        for layer in &self.layers {
            let p = pos * self.frequency * scale;
            total += layer.get([p.x, p.y, p.z]) * amplitude;
            scale *= 2.0;
            amplitude *= 0.5;
        }
        let normalized = (total / self.total_amplitude).clamp(-1.0, 1.0);
        let (lo, hi) = self.range;
        (lo + hi) * 0.5 + normalized * (hi - lo) * 0.5
    }

    pub fn octaves(&self) -> usize {
        self.layers.len()
    }

    pub fn frequency(&self) -> DVec3 {
        self.frequency
    }
}

impl ScalarField for NoiseSource {
    fn eval(&self, pos: IVec3) -> f64 {
        self.sample(pos.as_dvec3())
    }
}

impl std::fmt::Debug for NoiseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseSource")
            .field("octaves", &self.layers.len())
            .field("frequency", &self.frequency)
            .field("range", &self.range)
            .finish()
    }
}
