//! Deterministic seed derivation and primer digests.
//!
//! Every random stream used during generation or population is a pure
//! function of the world seed and a position, never of call order or thread.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use cubicgen_math::CubePos;
use cubicgen_voxel::CubePrimer;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derive a u64 seed for a cube from the world seed and cube coordinate.
///
/// Uses SipHash (via std's `DefaultHasher`) with fixed keys, so the result is
/// stable across runs and platforms.
pub fn derive_cube_seed(world_seed: u64, cube: CubePos) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    cube.x.hash(&mut hasher);
    cube.y.hash(&mut hasher);
    cube.z.hash(&mut hasher);
    hasher.finish()
}

/// The population stream of one cube.
pub fn cube_rng(world_seed: u64, cube: CubePos) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_cube_seed(world_seed, cube))
}

/// Seed for a placement cell of one structure kind. `salt` separates
/// structure kinds that share a cell grid.
pub fn derive_feature_seed(world_seed: u64, salt: u64, cell: (i32, i32, i32)) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    salt.hash(&mut hasher);
    cell.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// Determinism digest
// ---------------------------------------------------------------------------

/// Hash every block and, when present, every coarse biome of a primer.
pub fn hash_primer(primer: &CubePrimer) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (_, _, _, block) in primer.iter() {
        block.0.hash(&mut hasher);
    }
    if let Some(biomes) = primer.biomes() {
        for biome in biomes {
            biome.0.hash(&mut hasher);
        }
    }
    hasher.finish()
}
