//! Density-field terrain generation for 16³ cubic chunks.
//!
//! A world is generated from a seed and a [`GeneratorSettings`] snapshot:
//! noise sources feed a scalar [`FieldGraph`], the graph is sampled sparsely
//! and trilinearly interpolated per cube, and each block is decided by the
//! local biome's replacer chain. Caves, ravines and strongholds run after
//! block replacement; decoration runs later during population.
//!
//! [`GeneratorHandle`] is the entry point. It owns the reloadable state and
//! hands out per-thread [`TerrainGenerator`]s.
//!
//! [`GeneratorSettings`]: cubicgen_config::GeneratorSettings

mod async_generation;
mod error;
mod generator;
mod handle;
mod noise_source;
mod region;
mod seed;

pub mod biome;
pub mod field;
pub mod populate;
pub mod structure;

pub use async_generation::{AsyncCubeGenerator, CubeResult, FailedCube, GeneratedCube};
pub use biome::{
    BiomeDef, BiomeProvider, BiomeRegistry, BiomeRegistryError, BiomeSource, BlockReplacer,
    ReplaceContext, ReplacerChain, WhittakerDiagram, WhittakerRegion,
};
pub use error::{GeneratorError, Result};
pub use field::{DensitySample, FieldCaches, FieldGraph, FieldId, ScalarField};
pub use generator::{
    CacheTree, GeneratorState, SAMPLE_CELLS, SAMPLE_STRIDE, TerrainGenerator, build_terrain_graph,
};
pub use handle::{GeneratorHandle, GeneratorHandleBuilder};
pub use noise_source::{NoiseSource, NoiseSourceBuilder, octave_seeds};
pub use populate::{
    CubicPopulator, HostWorld, MemoryWorld, PopulateFlow, PopulateStage, PopulationHooks,
    PopulationListener, ScatterDecorator,
};
pub use region::RegionOverrides;
pub use seed::{cube_rng, derive_cube_seed, derive_feature_seed, hash_primer};
pub use structure::{StructureGenerator, StructureKind, StructureRegistry};
