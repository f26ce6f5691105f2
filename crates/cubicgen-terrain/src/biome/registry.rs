//! Biome catalogue: maps [`BiomeId`] to [`BiomeDef`] with name-based lookup.

use std::sync::Arc;

use cubicgen_voxel::{BiomeId, BlockId};
use hashbrown::HashMap;

use super::{BiomeDef, ReplacerChain, WhittakerDiagram, WhittakerRegion};
use crate::populate::ScatterDecorator;

/// Errors that can occur when registering biomes.
#[derive(Debug, thiserror::Error)]
pub enum BiomeRegistryError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    #[error("biome catalogue is full")]
    Full,
}

/// Every biome the host knows about, plus an optional climate diagram
/// assigning them to the world.
#[derive(Debug, Default)]
pub struct BiomeRegistry {
    biomes: Vec<BiomeDef>,
    name_to_id: HashMap<String, BiomeId>,
    climate: Option<WhittakerDiagram>,
}

impl BiomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new biome definition, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`BiomeRegistryError::DuplicateName`] if a biome with the same name exists.
    pub fn register(&mut self, def: BiomeDef) -> Result<BiomeId, BiomeRegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(BiomeRegistryError::DuplicateName(def.name.clone()));
        }
        let id = u16::try_from(self.biomes.len())
            .map(BiomeId)
            .map_err(|_| BiomeRegistryError::Full)?;
        self.name_to_id.insert(def.name.clone(), id);
        self.biomes.push(def);
        Ok(id)
    }

    pub fn get(&self, id: BiomeId) -> Option<&BiomeDef> {
        self.biomes.get(id.0 as usize)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    /// Identifiers of every registered biome, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = BiomeId> + '_ {
        (0..self.biomes.len()).map(|i| BiomeId(i as u16))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDef)> {
        self.biomes.iter().enumerate().map(|(i, d)| (BiomeId(i as u16), d))
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    pub fn set_climate(&mut self, diagram: WhittakerDiagram) {
        self.climate = Some(diagram);
    }

    /// Climate diagram used when settings do not pin a single biome.
    pub fn climate(&self) -> Option<&WhittakerDiagram> {
        self.climate.as_ref()
    }

    /// Ocean, beach, plains, desert, hills and mountains with standard block
    /// chains and a climate diagram covering the full range. Water follows
    /// the level of whichever generator applies the chains.
    ///
    /// # Errors
    ///
    /// Propagates registration failures of the built-in table.
    pub fn default_catalogue() -> Result<Self, BiomeRegistryError> {
        let mut reg = Self::new();
        let mut add = |def: BiomeDef| reg.register(def);

        let ocean = add(BiomeDef::new("ocean", -1.0, 0.1)
            .with_replacers(ReplacerChain::standard(BlockId::GRAVEL, BlockId::GRAVEL)))?;
        let beach = add(BiomeDef::new("beach", 0.0, 0.025)
            .with_replacers(ReplacerChain::standard(BlockId::SAND, BlockId::SAND)))?;
        let plains = add(BiomeDef::new("plains", 0.125, 0.05)
            .with_replacers(ReplacerChain::standard(BlockId::GRASS, BlockId::DIRT))
            .with_decorator(Arc::new(ScatterDecorator::new(BlockId::TALL_GRASS, BlockId::GRASS, 24))))?;
        let desert = add(BiomeDef::new("desert", 0.125, 0.05)
            .with_replacers(ReplacerChain::standard(BlockId::SAND, BlockId::SANDSTONE))
            .with_decorator(Arc::new(ScatterDecorator::new(BlockId::CACTUS, BlockId::SAND, 2))))?;
        let hills = add(BiomeDef::new("hills", 0.45, 0.3)
            .with_replacers(ReplacerChain::standard(BlockId::GRASS, BlockId::DIRT))
            .with_decorator(Arc::new(ScatterDecorator::new(BlockId::TALL_GRASS, BlockId::GRASS, 8))))?;
        let mountains = add(BiomeDef::new("mountains", 1.0, 0.5)
            .with_replacers(ReplacerChain::standard(BlockId::GRASS, BlockId::DIRT)))?;

        reg.set_climate(
            WhittakerDiagram::new(plains)
                .with_region(WhittakerRegion::new((0.0, 1.0), (0.7, 1.0), ocean))
                .with_region(WhittakerRegion::new((0.0, 1.0), (0.64, 0.7), beach))
                .with_region(WhittakerRegion::new((0.65, 1.0), (0.0, 0.35), desert))
                .with_region(WhittakerRegion::new((0.0, 0.3), (0.0, 0.64), mountains))
                .with_region(WhittakerRegion::new((0.3, 0.45), (0.0, 0.64), hills)),
        );
        Ok(reg)
    }
}
