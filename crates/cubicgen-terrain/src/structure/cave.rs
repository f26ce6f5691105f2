//! Noise-carved caves using the Swiss cheese model.
//!
//! Multi-octave 3D simplex noise carves tunnels into solid blocks below a
//! ceiling height. Blocks just under water are never carved so oceans do not
//! drain into the cave system.

use cubicgen_math::{CUBE_SIZE, CubePos};
use cubicgen_voxel::{BlockId, CubePrimer};
use glam::DVec3;
use noise::{NoiseFn, Simplex};

use super::StructureGenerator;

#[derive(Clone, Debug)]
pub struct CaveConfig {
    /// Blocks where `noise <= threshold` become air. Typical range: -0.6 to 0.0.
    pub threshold: f64,
    pub octaves: u32,
    /// Base frequency. Higher values give narrower, more frequent tunnels.
    pub frequency: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Highest block y that may be carved.
    pub max_y: i32,
    /// Blocks within this many blocks below water are kept.
    pub water_buffer: usize,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            threshold: -0.45,
            octaves: 3,
            frequency: 0.03,
            lacunarity: 2.0,
            persistence: 0.5,
            max_y: 56,
            water_buffer: 3,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NoiseCaves {
    pub config: CaveConfig,
}

impl NoiseCaves {
    pub fn new(config: CaveConfig) -> Self {
        Self { config }
    }

    fn noise(world_seed: u64) -> Simplex {
        // Offset decorrelates cave noise from terrain noise.
        Simplex::new(world_seed.wrapping_add(0xCAFE_BABE) as u32)
    }

    fn sample(&self, noise: &Simplex, pos: DVec3) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.config.frequency;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..self.config.octaves.max(1) {
            total += noise.get([pos.x * frequency, pos.y * frequency, pos.z * frequency]) * amplitude;
            max_amplitude += amplitude;
            frequency *= self.config.lacunarity;
            amplitude *= self.config.persistence;
        }

        total / max_amplitude
    }

    fn near_water(&self, primer: &CubePrimer, x: usize, y: usize, z: usize) -> bool {
        (y + 1..(y + 1 + self.config.water_buffer).min(CUBE_SIZE as usize))
            .any(|above| primer.block_state(x, above, z) == BlockId::WATER)
    }
}

impl StructureGenerator for NoiseCaves {
    fn name(&self) -> &str {
        "Caves"
    }

    fn generate(&self, world_seed: u64, primer: Option<&mut CubePrimer>, cube: CubePos) {
        let Some(primer) = primer else {
            return;
        };
        let min = cube.min_block();
        if min.y > self.config.max_y {
            return;
        }
        let noise = Self::noise(world_seed);
        let size = CUBE_SIZE as usize;
        for y in 0..size {
            let world_y = min.y + y as i32;
            if world_y > self.config.max_y {
                break;
            }
            for z in 0..size {
                for x in 0..size {
                    let block = primer.block_state(x, y, z);
                    if block.is_air() || block == BlockId::WATER {
                        continue;
                    }
                    let pos = DVec3::new((min.x + x as i32) as f64, world_y as f64, (min.z + z as i32) as f64);
                    if self.sample(&noise, pos) <= self.config.threshold && !self.near_water(primer, x, y, z) {
                        primer.set_block_state(x, y, z, BlockId::AIR);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone_cube() -> CubePrimer {
        let mut primer = CubePrimer::new();
        primer.fill(BlockId::STONE);
        primer
    }

    #[test]
    fn test_carves_some_but_not_all() {
        let caves = NoiseCaves::default();
        let mut found = false;
        for cx in 0..6 {
            let mut primer = stone_cube();
            caves.generate(42, Some(&mut primer), CubePos::new(cx, 1, 0));
            let air = primer.count(BlockId::AIR);
            assert!(air < 4096, "caves must not hollow a whole cube");
            found |= air > 0;
        }
        assert!(found, "expected at least one tunnel in six cubes");
    }

    #[test]
    fn test_deterministic_with_seed() {
        let caves = NoiseCaves::default();
        let mut a = stone_cube();
        let mut b = stone_cube();
        caves.generate(7, Some(&mut a), CubePos::new(2, 0, -3));
        caves.generate(7, Some(&mut b), CubePos::new(2, 0, -3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_nothing_above_ceiling() {
        let caves = NoiseCaves::default();
        let mut primer = stone_cube();
        caves.generate(42, Some(&mut primer), CubePos::new(0, 4, 0));
        assert_eq!(primer.count(BlockId::STONE), 4096);
    }

    #[test]
    fn test_threshold_controls_density() {
        let sparse = NoiseCaves::new(CaveConfig {
            threshold: -0.6,
            ..CaveConfig::default()
        });
        let dense = NoiseCaves::new(CaveConfig {
            threshold: 0.0,
            ..CaveConfig::default()
        });
        let mut a = stone_cube();
        let mut b = stone_cube();
        sparse.generate(3, Some(&mut a), CubePos::new(1, 1, 1));
        dense.generate(3, Some(&mut b), CubePos::new(1, 1, 1));
        assert!(b.count(BlockId::AIR) > a.count(BlockId::AIR));
    }

    #[test]
    fn test_blocks_under_water_are_kept() {
        let caves = NoiseCaves::new(CaveConfig {
            threshold: 2.0,
            ..CaveConfig::default()
        });
        let mut primer = stone_cube();
        for x in 0..16 {
            for z in 0..16 {
                primer.set_block_state(x, 15, z, BlockId::WATER);
            }
        }
        caves.generate(1, Some(&mut primer), CubePos::new(0, 0, 0));
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(primer.block_state(x, 14, z), BlockId::STONE, "ocean floor breached");
                assert_eq!(primer.block_state(x, 15, z), BlockId::WATER);
            }
        }
        assert_eq!(primer.block_state(0, 0, 0), BlockId::AIR, "an unreachable threshold carves everything else");
    }

    #[test]
    fn test_missing_primer_is_noop() {
        NoiseCaves::default().generate(1, None, CubePos::new(0, 0, 0));
    }
}
