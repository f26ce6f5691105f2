//! Hard biome classification at a block position.

use cubicgen_voxel::BiomeId;
use glam::IVec3;
use noise::{NoiseFn, Simplex};

use super::WhittakerDiagram;

/// The host's biome map. Must be a pure function of position.
pub trait BiomeProvider: Send + Sync {
    fn biome_at(&self, pos: IVec3) -> BiomeId;
}

/// Every position belongs to the same biome.
#[derive(Clone, Copy, Debug)]
pub struct SingleBiomeProvider(pub BiomeId);

impl BiomeProvider for SingleBiomeProvider {
    fn biome_at(&self, _pos: IVec3) -> BiomeId {
        self.0
    }
}

/// Temperature and moisture noise fed through a [`WhittakerDiagram`].
///
/// Climate is horizontal only: the biome of a column is the same at every
/// height.
pub struct ClimateBiomeProvider {
    temp_noise: Simplex,
    moisture_noise: Simplex,
    diagram: WhittakerDiagram,
    /// Lower values produce broader temperature zones.
    pub temp_frequency: f64,
    pub moisture_frequency: f64,
}

impl ClimateBiomeProvider {
    /// Temperature and moisture use different seeds derived from `seed` so
    /// they are decorrelated.
    pub fn new(seed: u64, diagram: WhittakerDiagram) -> Self {
        Self {
            temp_noise: Simplex::new(seed as u32),
            moisture_noise: Simplex::new(seed.wrapping_add(0xDEAD_BEEF) as u32),
            diagram,
            temp_frequency: 0.0021,
            moisture_frequency: 0.0027,
        }
    }

    /// Returns `(biome, temperature, moisture)` with both climate values in
    /// `[0.0, 1.0]`.
    pub fn sample(&self, pos: IVec3) -> (BiomeId, f64, f64) {
        let (x, z) = (pos.x as f64, pos.z as f64);
        let temp_raw = self
            .temp_noise
            .get([x * self.temp_frequency, z * self.temp_frequency]);
        let moisture_raw = self
            .moisture_noise
            .get([x * self.moisture_frequency, z * self.moisture_frequency]);

        // [-1, 1] -> [0, 1]
        let temperature = ((temp_raw + 1.0) * 0.5).clamp(0.0, 1.0);
        let moisture = ((moisture_raw + 1.0) * 0.5).clamp(0.0, 1.0);
        (self.diagram.lookup(temperature, moisture), temperature, moisture)
    }

    pub fn diagram(&self) -> &WhittakerDiagram {
        &self.diagram
    }
}

impl BiomeProvider for ClimateBiomeProvider {
    fn biome_at(&self, pos: IVec3) -> BiomeId {
        self.sample(pos).0
    }
}

impl std::fmt::Debug for ClimateBiomeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClimateBiomeProvider")
            .field("diagram", &self.diagram)
            .field("temp_frequency", &self.temp_frequency)
            .field("moisture_frequency", &self.moisture_frequency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::WhittakerRegion;

    fn diagram() -> WhittakerDiagram {
        WhittakerDiagram::new(BiomeId(0))
            .with_region(WhittakerRegion::new((0.0, 0.5), (0.0, 1.0), BiomeId(1)))
            .with_region(WhittakerRegion::new((0.5, 1.0), (0.0, 1.0), BiomeId(2)))
    }

    #[test]
    fn test_climate_provider_deterministic() {
        let a = ClimateBiomeProvider::new(42, diagram());
        let b = ClimateBiomeProvider::new(42, diagram());
        for i in -50..50 {
            let p = IVec3::new(i * 37, 0, i * -53);
            assert_eq!(a.sample(p), b.sample(p), "mismatch at {p}");
        }
    }

    #[test]
    fn test_climate_is_height_invariant() {
        let p = ClimateBiomeProvider::new(7, diagram());
        assert_eq!(p.biome_at(IVec3::new(300, -2000, 90)), p.biome_at(IVec3::new(300, 5000, 90)));
    }

    #[test]
    fn test_climate_values_normalized() {
        let p = ClimateBiomeProvider::new(3, diagram());
        for i in 0..200 {
            let (_, t, m) = p.sample(IVec3::new(i * 101, 0, i * 67));
            assert!((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&m), "t={t} m={m}");
        }
    }

    #[test]
    fn test_climate_produces_both_zones() {
        let p = ClimateBiomeProvider::new(11, diagram());
        let mut seen = std::collections::HashSet::new();
        for x in 0..60 {
            for z in 0..60 {
                seen.insert(p.biome_at(IVec3::new(x * 64, 0, z * 64)));
            }
        }
        assert!(seen.contains(&BiomeId(1)) && seen.contains(&BiomeId(2)), "saw {seen:?}");
    }

    #[test]
    fn test_single_provider_is_constant() {
        let p = SingleBiomeProvider(BiomeId(4));
        assert_eq!(p.biome_at(IVec3::new(-9, 9, 99)), BiomeId(4));
    }
}
