//! Block identifiers, palette-compressed cube storage, and the per-cube primer.

pub mod primer;
pub mod registry;
pub mod storage;

pub use primer::{BIOME_GRID_SIZE, CubePrimer, PRIMER_SIZE};
pub use registry::{BiomeId, BlockDef, BlockId, BlockRegistry, RegistryError};
pub use storage::BlockStorage;
