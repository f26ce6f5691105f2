//! Region overrides: cube-coordinate boxes bound to their own generator.

use cubicgen_math::{CubePos, IntAabb};

/// Ordered `(box, value)` pairs. Lookup is a linear scan and the first box
/// containing the cube wins, so overlapping boxes resolve to the earliest.
#[derive(Clone, Debug)]
pub struct RegionOverrides<T> {
    regions: Vec<(IntAabb, T)>,
}

impl<T> Default for RegionOverrides<T> {
    fn default() -> Self {
        Self { regions: Vec::new() }
    }
}

impl<T> RegionOverrides<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bounds: IntAabb, value: T) {
        self.regions.push((bounds, value));
    }

    /// Index and value of the first box containing `cube`.
    pub fn find(&self, cube: CubePos) -> Option<(usize, &T)> {
        self.regions
            .iter()
            .enumerate()
            .find(|(_, (bounds, _))| bounds.contains_cube(cube))
            .map(|(i, (_, value))| (i, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(IntAabb, T)> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
