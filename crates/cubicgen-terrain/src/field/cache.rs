//! Direct-mapped spatial caches for memoizing pure sub-fields.
//!
//! A slot stores the full key it was filled for, so a colliding coordinate is a
//! miss rather than a stale hit. Caches are not thread-safe; every worker owns
//! its own [`FieldCaches`].

use glam::IVec3;

/// Hash from a (possibly flattened) coordinate to a slot index before wrapping.
pub type HashFn = fn(IVec3) -> i32;

/// Slots in a 2-D cache: one 16×16 cube column.
pub const CACHE_SIZE_2D: usize = 16 * 16;

/// Slots in a 3-D cache: one 16×16×16 cube.
pub const CACHE_SIZE_3D: usize = 16 * 16 * 16;

/// Column hash: distinct for every `(x, z)` within a 16×16 footprint.
pub fn hash_2d(p: IVec3) -> i32 {
    p.x.wrapping_add(p.z.wrapping_mul(16))
}

/// Volume hash: distinct for every position within a 16×16×16 footprint.
pub fn hash_3d(p: IVec3) -> i32 {
    p.x
        .wrapping_add(p.z.wrapping_mul(16))
        .wrapping_add(p.y.wrapping_mul(256))
}

/// Whether a cache ignores the vertical coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Height-invariant field; `y` is dropped from the key.
    Flat2d,
    Volume3d,
}

/// Declaration of one cache in a field graph; instantiated per worker.
#[derive(Clone, Copy, Debug)]
pub struct CacheSpec {
    pub kind: CacheKind,
    pub capacity: usize,
    pub hash: HashFn,
}

/// Hit/miss counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Clone, Debug)]
pub struct SpatialCache {
    spec: CacheSpec,
    slots: Vec<Option<(IVec3, f64)>>,
    stats: CacheStats,
}

impl SpatialCache {
    pub fn new(spec: CacheSpec) -> Self {
        Self {
            slots: vec![None; spec.capacity.max(1)],
            spec,
            stats: CacheStats::default(),
        }
    }

    /// Key stored for `pos`: the position itself, or its column for 2-D caches.
    pub fn key(&self, pos: IVec3) -> IVec3 {
        match self.spec.kind {
            CacheKind::Flat2d => IVec3::new(pos.x, 0, pos.z),
            CacheKind::Volume3d => pos,
        }
    }

    fn slot(&self, key: IVec3) -> usize {
        (self.spec.hash)(key).rem_euclid(self.slots.len() as i32) as usize
    }

    /// Returns the stored value for `pos` if its slot was filled for the same key.
    pub fn lookup(&mut self, pos: IVec3) -> Option<f64> {
        let key = self.key(pos);
        match self.slots[self.slot(key)] {
            Some((stored, value)) if stored == key => {
                self.stats.hits += 1;
                Some(value)
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Stores `value` for `pos`, overwriting whatever occupied the slot.
    pub fn store(&mut self, pos: IVec3, value: f64) {
        let key = self.key(pos);
        let slot = self.slot(key);
        self.slots[slot] = Some((key, value));
    }

    /// Returns the cached value for `pos`, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, pos: IVec3, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(value) = self.lookup(pos) {
            return value;
        }
        let value = compute();
        self.store(pos, value);
        value
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.stats = CacheStats::default();
    }
}

/// The caches of one field graph, indexed by the graph's cache slots.
#[derive(Clone, Debug, Default)]
pub struct FieldCaches {
    caches: Vec<SpatialCache>,
}

impl FieldCaches {
    pub(crate) fn from_specs(specs: &[CacheSpec]) -> Self {
        Self {
            caches: specs.iter().copied().map(SpatialCache::new).collect(),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut SpatialCache> {
        self.caches.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Summed counters over every cache.
    pub fn stats(&self) -> CacheStats {
        self.caches.iter().fold(CacheStats::default(), |acc, c| CacheStats {
            hits: acc.hits + c.stats.hits,
            misses: acc.misses + c.stats.misses,
        })
    }

    pub fn clear(&mut self) {
        self.caches.iter_mut().for_each(SpatialCache::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: CacheKind) -> CacheSpec {
        match kind {
            CacheKind::Flat2d => CacheSpec {
                kind,
                capacity: CACHE_SIZE_2D,
                hash: hash_2d,
            },
            CacheKind::Volume3d => CacheSpec {
                kind,
                capacity: CACHE_SIZE_3D,
                hash: hash_3d,
            },
        }
    }

    #[test]
    fn test_hit_returns_stored_value() {
        let mut cache = SpatialCache::new(spec(CacheKind::Volume3d));
        let p = IVec3::new(3, 4, 5);
        assert_eq!(cache.get_or_insert_with(p, || 1.5), 1.5);
        assert_eq!(cache.get_or_insert_with(p, || 99.0), 1.5);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_collision_is_a_miss_not_a_stale_hit() {
        let mut cache = SpatialCache::new(spec(CacheKind::Volume3d));
        let a = IVec3::new(0, 0, 0);
        let b = IVec3::new(0, 16, 0); // 16 * 256 = 4096 -> slot 0
        assert_eq!(cache.slot(a), cache.slot(b));
        cache.get_or_insert_with(a, || 1.0);
        assert_eq!(cache.get_or_insert_with(b, || 2.0), 2.0);
        assert_eq!(cache.get_or_insert_with(a, || 3.0), 3.0, "evicted slot recomputes");
    }

    #[test]
    fn test_flat_cache_ignores_y() {
        let mut cache = SpatialCache::new(spec(CacheKind::Flat2d));
        cache.get_or_insert_with(IVec3::new(1, -50, 2), || 7.0);
        assert_eq!(cache.get_or_insert_with(IVec3::new(1, 300, 2), || 8.0), 7.0);
    }

    #[test]
    fn test_cube_footprint_has_no_collisions() {
        let cache = SpatialCache::new(spec(CacheKind::Volume3d));
        let origin = IVec3::new(-48, 32, 80);
        let mut seen = vec![false; CACHE_SIZE_3D];
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    let slot = cache.slot(origin + IVec3::new(x, y, z));
                    assert!(!seen[slot], "slot {slot} reused inside one cube");
                    seen[slot] = true;
                }
            }
        }
    }

    #[test]
    fn test_negative_coordinates_map_into_range() {
        let cache = SpatialCache::new(spec(CacheKind::Flat2d));
        let slot = cache.slot(cache.key(IVec3::new(-1, 0, -1)));
        assert!(slot < CACHE_SIZE_2D);
    }

    #[test]
    fn test_clear_resets_slots_and_stats() {
        let mut caches = FieldCaches::from_specs(&[spec(CacheKind::Flat2d), spec(CacheKind::Volume3d)]);
        let cache = caches.get_mut(1).unwrap();
        cache.get_or_insert_with(IVec3::ZERO, || 1.0);
        assert_eq!(caches.stats().misses, 1);
        caches.clear();
        assert_eq!(caches.stats(), CacheStats::default());
        assert_eq!(caches.len(), 2);
    }
}
