//! Strongholds: a fixed number of rooms placed on concentric rings.

use std::f64::consts::TAU;
use std::sync::Arc;

use cubicgen_math::{CUBE_SIZE, CubePos, IntAabb};
use cubicgen_voxel::{BlockId, CubePrimer};
use dashmap::DashMap;
use glam::IVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::StructureGenerator;
use crate::populate::HostWorld;
use crate::seed::derive_feature_seed;

/// Structure name answered by stronghold queries.
pub const STRONGHOLD: &str = "Stronghold";

const STRONGHOLD_SALT: u64 = 0x5354_524F_4E47;

#[derive(Clone, Debug)]
pub struct StrongholdConfig {
    pub count: usize,
    /// Distance of the first ring from the origin, in blocks.
    pub first_ring_distance: f64,
    pub ring_spacing: f64,
    /// Strongholds on the first ring; each later ring holds this many more.
    pub first_ring_count: usize,
    /// Floor y of every room.
    pub floor_y: i32,
    /// Half extent of a room along x and z.
    pub half_extent: i32,
    pub room_height: i32,
}

impl Default for StrongholdConfig {
    fn default() -> Self {
        Self {
            count: 24,
            first_ring_distance: 1408.0,
            ring_spacing: 3072.0,
            first_ring_count: 3,
            floor_y: 24,
            half_extent: 7,
            room_height: 7,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Strongholds {
    config: StrongholdConfig,
    /// Ring placements per world seed, computed on first use.
    placements: DashMap<u64, Arc<[IVec3]>>,
}

impl Strongholds {
    pub fn new(config: StrongholdConfig) -> Self {
        Self {
            config,
            placements: DashMap::new(),
        }
    }

    pub fn config(&self) -> &StrongholdConfig {
        &self.config
    }

    /// Floor centres of every stronghold in the world, ring by ring.
    pub fn positions(&self, world_seed: u64) -> Arc<[IVec3]> {
        let entry = self
            .placements
            .entry(world_seed)
            .or_insert_with(|| self.place_rings(world_seed).into());
        Arc::clone(entry.value())
    }

    fn place_rings(&self, world_seed: u64) -> Vec<IVec3> {
        let c = &self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(derive_feature_seed(world_seed, STRONGHOLD_SALT, (0, 0, 0)));
        let mut out = Vec::with_capacity(c.count);
        let mut ring = 0usize;
        let mut per_ring = c.first_ring_count.max(1);
        let mut placed_in_ring = 0usize;
        let mut angle = rng.random::<f64>() * TAU;
        while out.len() < c.count {
            let jitter = (rng.random::<f64>() - 0.5) * c.ring_spacing * 0.5;
            let distance = c.first_ring_distance + ring as f64 * c.ring_spacing + jitter;
            out.push(IVec3::new(
                libm::round(libm::cos(angle) * distance) as i32,
                c.floor_y,
                libm::round(libm::sin(angle) * distance) as i32,
            ));
            angle += TAU / per_ring as f64;
            placed_in_ring += 1;
            if placed_in_ring == per_ring {
                ring += 1;
                placed_in_ring = 0;
                per_ring += c.first_ring_count.max(1);
                angle += rng.random::<f64>() * TAU;
            }
        }
        out
    }

    fn room(&self, center: IVec3) -> IntAabb {
        let e = self.config.half_extent;
        IntAabb::new(
            center - IVec3::new(e, 0, e),
            center + IVec3::new(e, self.config.room_height - 1, e),
        )
    }

    fn rooms_touching(&self, world_seed: u64, cube: CubePos) -> Vec<IntAabb> {
        let bounds = IntAabb::new(cube.min_block(), cube.max_block());
        self.positions(world_seed)
            .iter()
            .map(|&p| self.room(p))
            .filter(|room| room.intersects(&bounds))
            .collect()
    }
}

impl StructureGenerator for Strongholds {
    fn name(&self) -> &str {
        STRONGHOLD
    }

    /// Hollow stone-brick rooms: walls, floor and ceiling are bricks, the
    /// interior is air.
    fn generate(&self, world_seed: u64, primer: Option<&mut CubePrimer>, cube: CubePos) {
        let Some(primer) = primer else {
            return;
        };
        let min = cube.min_block();
        for room in self.rooms_touching(world_seed, cube) {
            for pos in room.iter() {
                let local = pos - min;
                if local.cmplt(IVec3::ZERO).any() || local.cmpge(IVec3::splat(CUBE_SIZE)).any() {
                    continue;
                }
                let shell = pos.cmpeq(room.min).any() || pos.cmpeq(room.max).any();
                let block = if shell { BlockId::STONE_BRICKS } else { BlockId::AIR };
                primer.set_block_state(local.x as usize, local.y as usize, local.z as usize, block);
            }
        }
    }

    fn nearest_structure_position(&self, world_seed: u64, pos: IVec3, _allow_unexplored: bool) -> Option<IVec3> {
        self.positions(world_seed)
            .iter()
            .copied()
            .min_by_key(|p| (*p - pos).as_i64vec3().length_squared())
    }

    /// Lays a cobblestone pillar at the room centre of the cube holding it.
    fn populate(&self, world: &mut dyn HostWorld, _rng: &mut ChaCha8Rng, cube: CubePos) {
        let seed = world.seed();
        for &center in self.positions(seed).iter() {
            if CubePos::from_block(center) != cube {
                continue;
            }
            for dy in 1..self.config.room_height - 1 {
                world.set_block(center + IVec3::new(0, dy, 0), BlockId::COBBLESTONE);
            }
        }
    }
}
