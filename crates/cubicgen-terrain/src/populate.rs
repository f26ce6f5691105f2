//! Population: the decoration pass run after neighbouring cubes exist.
//!
//! The generator drives a fixed sequence for every cube (see
//! [`TerrainGenerator::populate`](crate::TerrainGenerator::populate)). This
//! module holds the contracts the sequence calls through: the host world,
//! decorators, stage listeners that may cancel, and an in-memory world used by
//! the batch tool and the tests.

use std::sync::Arc;

use cubicgen_math::{CUBE_SIZE, CubePos, block_to_cube, block_to_local};
use cubicgen_voxel::{BiomeId, BlockId, CubePrimer};
use glam::IVec3;
use hashbrown::HashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Block and biome access to the world being populated.
pub trait HostWorld {
    fn seed(&self) -> u64;
    /// Block at an absolute position; air where nothing is loaded.
    fn block(&self, pos: IVec3) -> BlockId;
    fn set_block(&mut self, pos: IVec3, block: BlockId);
    /// Host biome at an absolute position, if the host stores one.
    fn biome_at(&self, pos: IVec3) -> Option<BiomeId>;
}

/// A decoration pass over one cube.
pub trait CubicPopulator: Send + Sync {
    fn populate(&self, world: &mut dyn HostWorld, rng: &mut ChaCha8Rng, cube: CubePos, biome: BiomeId);
}

/// Extension points fired during population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopulateStage {
    /// Before anything else; cancelling skips all default population.
    Cube,
    /// Before structure population and the biome decorator.
    Pre,
    /// After the biome decorator. Cancelling has no effect.
    Post,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopulateFlow {
    #[default]
    Continue,
    Cancel,
}

/// Observer of population stages.
pub trait PopulationListener: Send + Sync {
    fn on_stage(
        &self,
        stage: PopulateStage,
        cube: CubePos,
        world: &mut dyn HostWorld,
        rng: &mut ChaCha8Rng,
    ) -> PopulateFlow;
}

/// Listeners and externally registered populators, shared by every
/// generator built from one handle.
#[derive(Clone, Default)]
pub struct PopulationHooks {
    listeners: Vec<Arc<dyn PopulationListener>>,
    populators: Vec<Arc<dyn CubicPopulator>>,
}

impl PopulationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn PopulationListener>) {
        self.listeners.push(listener);
    }

    /// Populator run after the `Post` stage, in registration order.
    pub fn add_populator(&mut self, populator: Arc<dyn CubicPopulator>) {
        self.populators.push(populator);
    }

    /// Notifies every listener; the stage is cancelled if any listener cancels.
    pub fn fire(
        &self,
        stage: PopulateStage,
        cube: CubePos,
        world: &mut dyn HostWorld,
        rng: &mut ChaCha8Rng,
    ) -> PopulateFlow {
        let mut flow = PopulateFlow::Continue;
        for listener in &self.listeners {
            if listener.on_stage(stage, cube, world, rng) == PopulateFlow::Cancel {
                flow = PopulateFlow::Cancel;
            }
        }
        flow
    }

    pub fn populators(&self) -> &[Arc<dyn CubicPopulator>] {
        &self.populators
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for PopulationHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationHooks")
            .field("listeners", &self.listeners.len())
            .field("populators", &self.populators.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Scatter decorator
// ---------------------------------------------------------------------------

/// Places single blocks on exposed surfaces of one block type.
///
/// Each attempt picks a random column of the cube and places `block` on the
/// highest `on` block in that column whose upper neighbour is air.
#[derive(Clone, Copy, Debug)]
pub struct ScatterDecorator {
    pub block: BlockId,
    pub on: BlockId,
    pub attempts: u32,
}

impl ScatterDecorator {
    pub fn new(block: BlockId, on: BlockId, attempts: u32) -> Self {
        Self { block, on, attempts }
    }
}

impl CubicPopulator for ScatterDecorator {
    fn populate(&self, world: &mut dyn HostWorld, rng: &mut ChaCha8Rng, cube: CubePos, _biome: BiomeId) {
        let min = cube.min_block();
        for _ in 0..self.attempts {
            let x = min.x + rng.random_range(0..CUBE_SIZE);
            let z = min.z + rng.random_range(0..CUBE_SIZE);
            for y in (min.y..min.y + CUBE_SIZE - 1).rev() {
                let ground = IVec3::new(x, y, z);
                let above = ground + IVec3::Y;
                if world.block(ground) == self.on && world.block(above).is_air() {
                    world.set_block(above, self.block);
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory world
// ---------------------------------------------------------------------------

/// A [`HostWorld`] over generated primers held in memory.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    seed: u64,
    cubes: HashMap<CubePos, CubePrimer>,
}

impl MemoryWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            cubes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, pos: CubePos, primer: CubePrimer) -> Option<CubePrimer> {
        self.cubes.insert(pos, primer)
    }

    pub fn get(&self, pos: CubePos) -> Option<&CubePrimer> {
        self.cubes.get(&pos)
    }

    pub fn contains(&self, pos: CubePos) -> bool {
        self.cubes.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    /// Loaded cubes in coordinate order.
    pub fn cubes(&self) -> Vec<(CubePos, &CubePrimer)> {
        let mut out: Vec<_> = self.cubes.iter().map(|(p, c)| (*p, c)).collect();
        out.sort_by_key(|(p, _)| *p);
        out
    }
}

impl HostWorld for MemoryWorld {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn block(&self, pos: IVec3) -> BlockId {
        let (cube, [x, y, z]) = locate(pos);
        self.cubes
            .get(&cube)
            .map_or(BlockId::AIR, |c| c.block_state(x, y, z))
    }

    fn set_block(&mut self, pos: IVec3, block: BlockId) {
        let (cube, [x, y, z]) = locate(pos);
        if let Some(primer) = self.cubes.get_mut(&cube) {
            primer.set_block_state(x, y, z, block);
        }
    }

    fn biome_at(&self, pos: IVec3) -> Option<BiomeId> {
        let (cube, [x, y, z]) = locate(pos);
        self.cubes.get(&cube).and_then(|c| c.biome(x / 4, y / 4, z / 4))
    }
}

/// Owning cube and local primer index of a block position.
fn locate(pos: IVec3) -> (CubePos, [usize; 3]) {
    let local = block_to_local(pos);
    (
        CubePos::from(block_to_cube(pos)),
        [local.x as usize, local.y as usize, local.z as usize],
    )
}
