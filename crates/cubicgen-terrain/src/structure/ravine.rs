//! Ravines: long, narrow, deep cuts seeded per placement cell.
//!
//! The world is divided into square cells of `cell_size` blocks. Each cell
//! holds at most one ravine, decided by a stream seeded from the world seed
//! and the cell. A cube checks every cell whose ravine could reach it.

use std::f64::consts::{PI, TAU};

use cubicgen_math::{CUBE_SIZE, CubePos};
use cubicgen_voxel::{BlockId, CubePrimer};
use glam::{DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::StructureGenerator;
use crate::seed::derive_feature_seed;

const RAVINE_SALT: u64 = 0x5241_5649_4E45;

#[derive(Clone, Debug)]
pub struct RavineConfig {
    /// Edge of a placement cell, in blocks.
    pub cell_size: i32,
    /// Probability that a cell holds a ravine.
    pub chance: f64,
    /// Vertical range of ravine centres.
    pub min_y: i32,
    pub max_y: i32,
    pub length: (f64, f64),
    pub half_width: (f64, f64),
    pub half_height: (f64, f64),
}

impl Default for RavineConfig {
    fn default() -> Self {
        Self {
            cell_size: 64,
            chance: 0.12,
            min_y: 20,
            max_y: 56,
            length: (40.0, 112.0),
            half_width: (1.5, 3.5),
            half_height: (6.0, 14.0),
        }
    }
}

/// One placed ravine: a straight cut whose width and height swell towards
/// the middle.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Ravine {
    start: DVec2,
    dir: DVec2,
    y: f64,
    length: f64,
    half_width: f64,
    half_height: f64,
}

impl Ravine {
    fn contains(&self, p: DVec3) -> bool {
        let d = DVec2::new(p.x, p.z) - self.start;
        let t = d.dot(self.dir);
        if t < 0.0 || t > self.length {
            return false;
        }
        let swell = libm::sin(PI * t / self.length);
        let across = d.perp_dot(self.dir).abs();
        across <= self.half_width * swell && (p.y - self.y).abs() <= self.half_height * swell
    }

    fn midpoint(&self) -> DVec3 {
        let mid = self.start + self.dir * (self.length * 0.5);
        DVec3::new(mid.x, self.y, mid.y)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Ravines {
    pub config: RavineConfig,
}

impl Ravines {
    pub fn new(config: RavineConfig) -> Self {
        Self { config }
    }

    fn ravine_in_cell(&self, world_seed: u64, cell_x: i32, cell_z: i32) -> Option<Ravine> {
        let c = &self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(derive_feature_seed(world_seed, RAVINE_SALT, (cell_x, 0, cell_z)));
        if !rng.random_bool(c.chance.clamp(0.0, 1.0)) {
            return None;
        }
        let start = DVec2::new(
            (cell_x * c.cell_size + rng.random_range(0..c.cell_size)) as f64,
            (cell_z * c.cell_size + rng.random_range(0..c.cell_size)) as f64,
        );
        let angle = rng.random::<f64>() * TAU;
        Some(Ravine {
            start,
            dir: DVec2::new(libm::cos(angle), libm::sin(angle)),
            y: rng.random_range(c.min_y..=c.max_y) as f64,
            length: rng.random_range(c.length.0..=c.length.1),
            half_width: rng.random_range(c.half_width.0..=c.half_width.1),
            half_height: rng.random_range(c.half_height.0..=c.half_height.1),
        })
    }

    /// Ravines that may intersect `cube`.
    fn ravines_near(&self, world_seed: u64, cube: CubePos) -> Vec<Ravine> {
        let c = &self.config;
        let min = cube.min_block();
        let max = cube.max_block();
        if (min.y as f64) > c.max_y as f64 + c.half_height.1 || (max.y as f64) < c.min_y as f64 - c.half_height.1 {
            return Vec::new();
        }
        let reach = (c.length.1 / c.cell_size as f64).ceil() as i32 + 1;
        let (x0, x1) = (min.x.div_euclid(c.cell_size), max.x.div_euclid(c.cell_size));
        let (z0, z1) = (min.z.div_euclid(c.cell_size), max.z.div_euclid(c.cell_size));
        let mut out = Vec::new();
        for cz in z0 - reach..=z1 + reach {
            for cx in x0 - reach..=x1 + reach {
                if let Some(r) = self.ravine_in_cell(world_seed, cx, cz) {
                    out.push(r);
                }
            }
        }
        out
    }
}

impl StructureGenerator for Ravines {
    fn name(&self) -> &str {
        "Ravines"
    }

    fn generate(&self, world_seed: u64, primer: Option<&mut CubePrimer>, cube: CubePos) {
        let Some(primer) = primer else {
            return;
        };
        let ravines = self.ravines_near(world_seed, cube);
        if ravines.is_empty() {
            return;
        }
        let min = cube.min_block();
        let size = CUBE_SIZE as usize;
        for y in 0..size {
            for z in 0..size {
                for x in 0..size {
                    let block = primer.block_state(x, y, z);
                    if block.is_air() || block == BlockId::WATER {
                        continue;
                    }
                    if y + 1 < size && primer.block_state(x, y + 1, z) == BlockId::WATER {
                        continue;
                    }
                    let p = (min + glam::IVec3::new(x as i32, y as i32, z as i32)).as_dvec3();
                    if ravines.iter().any(|r| r.contains(p)) {
                        primer.set_block_state(x, y, z, BlockId::AIR);
                    }
                }
            }
        }
    }
}
