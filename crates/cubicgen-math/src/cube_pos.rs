use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a cube in blocks.
pub const CUBE_SIZE: i32 = 16;

/// Number of blocks in one cube.
pub const CUBE_VOLUME: usize = (CUBE_SIZE * CUBE_SIZE * CUBE_SIZE) as usize;

/// Position of a cube in cube coordinates.
///
/// Cube `(cx, cy, cz)` covers blocks `cx * 16 ..= cx * 16 + 15` on each axis.
/// The world is unbounded vertically, so `y` uses the full `i32` range like
/// the horizontal axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubePos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cube containing the given block.
    pub fn from_block(block: IVec3) -> Self {
        let c = crate::block_to_cube(block);
        Self::new(c.x, c.y, c.z)
    }

    /// Lowest-coordinate block inside this cube.
    pub fn min_block(self) -> IVec3 {
        crate::cube_to_min_block(self.as_ivec3())
    }

    /// Highest-coordinate block inside this cube.
    pub fn max_block(self) -> IVec3 {
        self.min_block() + IVec3::splat(CUBE_SIZE - 1)
    }

    /// Block at the centre of this cube, rounded towards the minimum corner.
    pub fn center_block(self) -> IVec3 {
        self.min_block() + IVec3::splat(CUBE_SIZE / 2)
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Neighbouring cube offset by `(dx, dy, dz)`.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<IVec3> for CubePos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<CubePos> for IVec3 {
    fn from(c: CubePos) -> Self {
        c.as_ivec3()
    }
}

impl fmt::Display for CubePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
