//! Whittaker diagram: maps (temperature, moisture) pairs to biome IDs.

use cubicgen_voxel::BiomeId;

/// A rectangular region in temperature–moisture space mapped to a biome.
#[derive(Clone, Debug)]
pub struct WhittakerRegion {
    /// Minimum temperature (inclusive), in `[0.0, 1.0]`.
    pub temp_min: f64,
    /// Maximum temperature (exclusive), in `[0.0, 1.0]`.
    pub temp_max: f64,
    /// Minimum moisture (inclusive), in `[0.0, 1.0]`.
    pub moisture_min: f64,
    /// Maximum moisture (exclusive), in `[0.0, 1.0]`.
    pub moisture_max: f64,
    pub biome: BiomeId,
}

impl WhittakerRegion {
    pub fn new(temp: (f64, f64), moisture: (f64, f64), biome: BiomeId) -> Self {
        Self {
            temp_min: temp.0,
            temp_max: temp.1,
            moisture_min: moisture.0,
            moisture_max: moisture.1,
            biome,
        }
    }

    fn contains(&self, temperature: f64, moisture: f64) -> bool {
        temperature >= self.temp_min
            && temperature < self.temp_max
            && moisture >= self.moisture_min
            && moisture < self.moisture_max
    }
}

/// Climate lookup table. Regions are tested in order; the first match wins.
#[derive(Clone, Debug)]
pub struct WhittakerDiagram {
    pub regions: Vec<WhittakerRegion>,
    /// Biome for points no region covers.
    pub fallback: BiomeId,
}

impl WhittakerDiagram {
    pub fn new(fallback: BiomeId) -> Self {
        Self {
            regions: Vec::new(),
            fallback,
        }
    }

    pub fn with_region(mut self, region: WhittakerRegion) -> Self {
        self.regions.push(region);
        self
    }

    pub fn lookup(&self, temperature: f64, moisture: f64) -> BiomeId {
        self.regions
            .iter()
            .find(|r| r.contains(temperature, moisture))
            .map_or(self.fallback, |r| r.biome)
    }
}
