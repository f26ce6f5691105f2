use crate::CubePos;
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box over integer coordinates, inclusive on both corners.
///
/// Used for cube-area overrides, where the coordinates are cube positions.
/// `new` sorts the corners so that min <= max on every axis; boxes read from
/// settings files are not sorted and should be checked with [`IntAabb::is_well_formed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntAabb {
    pub min: IVec3,
    pub max: IVec3,
}

impl IntAabb {
    /// Create a box from two corners, sorting components per axis.
    pub fn new(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box containing exactly one cell.
    pub fn single(p: IVec3) -> Self {
        Self { min: p, max: p }
    }

    /// Returns true if min <= max on every axis.
    pub fn is_well_formed(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn contains_cube(&self, cube: CubePos) -> bool {
        self.contains(cube.as_ivec3())
    }

    /// Returns true if the two boxes share at least one cell.
    pub fn intersects(&self, other: &IntAabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &IntAabb) -> IntAabb {
        IntAabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Number of cells along each axis.
    pub fn size(&self) -> IVec3 {
        self.max - self.min + IVec3::ONE
    }

    /// Number of cells covered, computed in i64 to avoid overflow.
    pub fn cell_count(&self) -> i64 {
        let s = self.size();
        s.x as i64 * s.y as i64 * s.z as i64
    }

    /// Box grown by `margin` cells on each face.
    pub fn expand_by(&self, margin: i32) -> IntAabb {
        IntAabb {
            min: self.min - IVec3::splat(margin),
            max: self.max + IVec3::splat(margin),
        }
    }

    /// Iterate every cell in x-fastest, then z, then y order.
    pub fn iter(&self) -> impl Iterator<Item = IVec3> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| IVec3::new(x, y, z)))
        })
    }
}
