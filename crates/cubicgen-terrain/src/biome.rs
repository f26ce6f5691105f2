//! Biomes: catalogue, classification, smoothed parameters and block replacers.
//!
//! The catalogue ([`BiomeRegistry`]) is owned by the host and shared by every
//! generator. A [`BiomeSource`] combines it with a [`BiomeProvider`] for one
//! generator configuration.

mod def;
mod diagram;
mod provider;
mod registry;
mod replacer;
mod source;

pub use def::BiomeDef;
pub use diagram::{WhittakerDiagram, WhittakerRegion};
pub use provider::{BiomeProvider, ClimateBiomeProvider, SingleBiomeProvider};
pub use registry::{BiomeRegistry, BiomeRegistryError};
pub use replacer::{
    BlockReplacer, OceanWaterReplacer, ReplaceContext, ReplacerChain, SurfaceReplacer,
    TerrainShapeReplacer,
};
pub use source::{BIOME_CELL, BiomeChannel, BiomeField, BiomeSource};
