use crate::CUBE_SIZE;
use glam::IVec3;

/// Cube coordinate containing the block. Floors towards negative infinity.
pub fn block_to_cube(block: IVec3) -> IVec3 {
    IVec3::new(
        block.x.div_euclid(CUBE_SIZE),
        block.y.div_euclid(CUBE_SIZE),
        block.z.div_euclid(CUBE_SIZE),
    )
}

/// Position of the block within its cube, each axis in `0..16`.
pub fn block_to_local(block: IVec3) -> IVec3 {
    IVec3::new(
        block.x.rem_euclid(CUBE_SIZE),
        block.y.rem_euclid(CUBE_SIZE),
        block.z.rem_euclid(CUBE_SIZE),
    )
}

/// Lowest-coordinate block of the cube.
pub fn cube_to_min_block(cube: IVec3) -> IVec3 {
    cube * CUBE_SIZE
}

/// Absolute block coordinate of a local offset inside a cube.
pub fn local_to_block(cube: IVec3, local: IVec3) -> IVec3 {
    cube_to_min_block(cube) + local
}
