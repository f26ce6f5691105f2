//! Per-cube output buffer handed through terrain generation.
//!
//! A [`CubePrimer`] holds the 16×16×16 block grid and, optionally, a coarse
//! 4×4×4 biome grid (one entry per 4×4×4 block cell). The generating call owns
//! it exclusively; structure generators carve into it in place.

use serde::{Deserialize, Serialize};

use crate::registry::{BiomeId, BlockId};
use crate::storage::BlockStorage;

/// Edge length of the primer in blocks.
pub const PRIMER_SIZE: usize = 16;

/// Edge length of the coarse biome grid.
pub const BIOME_GRID_SIZE: usize = 4;

const BIOME_CELLS: usize = BIOME_GRID_SIZE * BIOME_GRID_SIZE * BIOME_GRID_SIZE;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubePrimer {
    blocks: BlockStorage,
    biomes: Option<Vec<BiomeId>>,
}

impl CubePrimer {
    /// An all-air primer without biome data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the block at local `(x, y, z)`, each in `0..16`.
    ///
    /// Out-of-range coordinates read as air.
    pub fn block_state(&self, x: usize, y: usize, z: usize) -> BlockId {
        if !Self::in_bounds(x, y, z) {
            tracing::warn!("CubePrimer::block_state out of bounds: ({x}, {y}, {z})");
            return BlockId::AIR;
        }
        self.blocks.get(Self::block_index(x, y, z))
    }

    /// Sets the block at local `(x, y, z)`. Out-of-range writes are ignored.
    pub fn set_block_state(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        if !Self::in_bounds(x, y, z) {
            tracing::warn!("CubePrimer::set_block_state out of bounds: ({x}, {y}, {z})");
            return;
        }
        self.blocks.set(Self::block_index(x, y, z), block);
    }

    /// Biome of the coarse cell `(x4, y4, z4)`, each in `0..4`, if the grid
    /// has been filled.
    pub fn biome(&self, x4: usize, y4: usize, z4: usize) -> Option<BiomeId> {
        let biomes = self.biomes.as_ref()?;
        Self::biome_index(x4, y4, z4).map(|i| biomes[i])
    }

    /// Stamps a biome into the coarse cell `(x4, y4, z4)`.
    ///
    /// The grid is allocated on first write, with every other cell taking the
    /// same biome until overwritten.
    pub fn set_biome(&mut self, x4: usize, y4: usize, z4: usize, biome: BiomeId) {
        let Some(index) = Self::biome_index(x4, y4, z4) else {
            tracing::warn!("CubePrimer::set_biome out of bounds: ({x4}, {y4}, {z4})");
            return;
        };
        self.biomes.get_or_insert_with(|| vec![biome; BIOME_CELLS])[index] = biome;
    }

    /// Returns `true` once any coarse biome has been stamped.
    pub fn has_biomes(&self) -> bool {
        self.biomes.is_some()
    }

    /// Flattened coarse biome grid in x, then z, then y order.
    pub fn biomes(&self) -> Option<&[BiomeId]> {
        self.biomes.as_deref()
    }

    /// Resets every block to `block`, keeping biome data.
    pub fn fill(&mut self, block: BlockId) {
        self.blocks.fill(block);
    }

    /// Number of cells holding `block`.
    pub fn count(&self, block: BlockId) -> usize {
        if !self.blocks.palette().contains(&block) {
            return 0;
        }
        (0..PRIMER_SIZE * PRIMER_SIZE * PRIMER_SIZE)
            .filter(|&i| self.blocks.get(i) == block)
            .count()
    }

    /// Every `(x, y, z, block)` in x, then z, then y order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, BlockId)> + '_ {
        (0..PRIMER_SIZE).flat_map(move |y| {
            (0..PRIMER_SIZE).flat_map(move |z| {
                (0..PRIMER_SIZE).map(move |x| (x, y, z, self.blocks.get(Self::block_index(x, y, z))))
            })
        })
    }

    pub fn storage(&self) -> &BlockStorage {
        &self.blocks
    }

    fn in_bounds(x: usize, y: usize, z: usize) -> bool {
        x < PRIMER_SIZE && y < PRIMER_SIZE && z < PRIMER_SIZE
    }

    fn block_index(x: usize, y: usize, z: usize) -> usize {
        x + z * PRIMER_SIZE + y * PRIMER_SIZE * PRIMER_SIZE
    }

    fn biome_index(x4: usize, y4: usize, z4: usize) -> Option<usize> {
        (x4 < BIOME_GRID_SIZE && y4 < BIOME_GRID_SIZE && z4 < BIOME_GRID_SIZE)
            .then(|| x4 + z4 * BIOME_GRID_SIZE + y4 * BIOME_GRID_SIZE * BIOME_GRID_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_primer_is_air_without_biomes() {
        let primer = CubePrimer::new();
        assert_eq!(primer.block_state(0, 0, 0), BlockId::AIR);
        assert_eq!(primer.count(BlockId::AIR), 4096);
        assert!(!primer.has_biomes());
        assert_eq!(primer.biome(0, 0, 0), None);
    }

    #[test]
    fn test_set_and_get_block() {
        let mut primer = CubePrimer::new();
        primer.set_block_state(15, 0, 7, BlockId::STONE);
        assert_eq!(primer.block_state(15, 0, 7), BlockId::STONE);
        assert_eq!(primer.block_state(7, 0, 15), BlockId::AIR);
        assert_eq!(primer.count(BlockId::STONE), 1);
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut primer = CubePrimer::new();
        primer.set_block_state(16, 0, 0, BlockId::STONE);
        assert_eq!(primer.count(BlockId::STONE), 0);
        assert_eq!(primer.block_state(0, 99, 0), BlockId::AIR);
    }

    #[test]
    fn test_biome_grid_allocated_on_first_write() {
        let mut primer = CubePrimer::new();
        primer.set_biome(1, 2, 3, BiomeId(5));
        primer.set_biome(0, 0, 0, BiomeId(9));
        assert!(primer.has_biomes());
        assert_eq!(primer.biome(1, 2, 3), Some(BiomeId(5)));
        assert_eq!(primer.biome(0, 0, 0), Some(BiomeId(9)));
        assert_eq!(primer.biome(4, 0, 0), None);
        assert_eq!(primer.biomes().map(<[BiomeId]>::len), Some(64));
    }

    #[test]
    fn test_iter_visits_every_cell_once() {
        let mut primer = CubePrimer::new();
        primer.set_block_state(3, 4, 5, BlockId::DIRT);
        let cells: Vec<_> = primer.iter().collect();
        assert_eq!(cells.len(), 4096);
        assert_eq!(cells.iter().filter(|c| c.3 == BlockId::DIRT).count(), 1);
        assert!(cells.contains(&(3, 4, 5, BlockId::DIRT)));
    }

    #[test]
    fn test_primers_with_same_content_compare_equal() {
        let mut a = CubePrimer::new();
        let mut b = CubePrimer::new();
        a.set_block_state(1, 1, 1, BlockId::SAND);
        b.set_block_state(1, 1, 1, BlockId::SAND);
        assert_eq!(a, b);
    }
}
