//! Error taxonomy of the terrain generator.

use cubicgen_config::ConfigError;

use crate::biome::BiomeRegistryError;
use crate::structure::StructureKind;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Settings failed to load, parse or validate. The previous state, if
    /// any, stays active.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("settings reference unknown biome {0:?}")]
    UnknownBiome(String),
    #[error("biome catalogue is empty")]
    EmptyCatalogue,
    #[error("biome catalogue error: {0}")]
    Catalogue(#[from] BiomeRegistryError),
    #[error("structure generator {0} is not registered")]
    StructureUnavailable(StructureKind),
    #[error("density at ({x}, {y}, {z}) is not finite")]
    NonFiniteDensity { x: i32, y: i32, z: i32 },
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;
