//! Cube coordinates, block/local conversions and integer bounding boxes for the cubic terrain generator.

mod aabb;
mod conversion;
mod cube_pos;

pub use aabb::IntAabb;
pub use conversion::{block_to_cube, block_to_local, cube_to_min_block, local_to_block};
pub use cube_pos::{CUBE_SIZE, CUBE_VOLUME, CubePos};
pub use glam::{DVec3, IVec3};
