//! Block and biome identifiers, and the block registry that names them.
//!
//! The registry is built once at startup. Air is always ID 0 so that a freshly
//! created primer represents empty space.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compact block-state identifier stored in every primer cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
    pub const STONE: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const GRASS: BlockId = BlockId(3);
    pub const SAND: BlockId = BlockId(4);
    pub const GRAVEL: BlockId = BlockId(5);
    pub const WATER: BlockId = BlockId(6);
    pub const SANDSTONE: BlockId = BlockId(7);
    pub const COBBLESTONE: BlockId = BlockId(8);
    pub const STONE_BRICKS: BlockId = BlockId(9);
    pub const TALL_GRASS: BlockId = BlockId(10);
    pub const CACTUS: BlockId = BlockId(11);

    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

/// Host biome identifier, as stored in the coarse biome grid of a primer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(pub u16);

/// Descriptor for a block type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Registry name (e.g. "stone", "water").
    pub name: String,
    /// Whether the block counts as solid terrain.
    pub solid: bool,
    /// Whether the block is a fluid.
    pub liquid: bool,
}

impl BlockDef {
    pub fn solid(name: &str) -> Self {
        Self {
            name: name.to_string(),
            solid: true,
            liquid: false,
        }
    }

    pub fn liquid(name: &str) -> Self {
        Self {
            name: name.to_string(),
            solid: false,
            liquid: true,
        }
    }

    /// Neither solid nor liquid (plants and similar).
    pub fn decoration(name: &str) -> Self {
        Self {
            name: name.to_string(),
            solid: false,
            liquid: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    #[error("block registry is full (max 65536 types)")]
    RegistryFull,
}

/// Maps [`BlockId`] to [`BlockDef`] with O(1) lookup in both directions.
pub struct BlockRegistry {
    blocks: Vec<BlockDef>,
    name_to_id: FxHashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a registry containing only air.
    pub fn new() -> Self {
        let air = BlockDef {
            name: "air".to_string(),
            solid: false,
            liquid: false,
        };
        let mut name_to_id = FxHashMap::default();
        name_to_id.insert(air.name.clone(), BlockId::AIR);
        Self {
            blocks: vec![air],
            name_to_id,
        }
    }

    /// Registry with the blocks the built-in replacers and structures place,
    /// in the order matching the `BlockId` constants.
    pub fn with_terrain_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            BlockDef::solid("stone"),
            BlockDef::solid("dirt"),
            BlockDef::solid("grass"),
            BlockDef::solid("sand"),
            BlockDef::solid("gravel"),
            BlockDef::liquid("water"),
            BlockDef::solid("sandstone"),
            BlockDef::solid("cobblestone"),
            BlockDef::solid("stone_bricks"),
            BlockDef::decoration("tall_grass"),
            BlockDef::solid("cactus"),
        ];
        for def in defaults {
            // Names above are distinct and far below the capacity limit.
            let _ = registry.register(def);
        }
        registry
    }

    /// Registers a block and returns its sequential ID.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.blocks.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }
        let id = BlockId(self.blocks.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Name of the block, or `"unknown"` for unregistered IDs.
    pub fn name(&self, id: BlockId) -> &str {
        self.get(id).map_or("unknown", |def| def.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() <= 1
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
