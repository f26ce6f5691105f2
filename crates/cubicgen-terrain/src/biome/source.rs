//! Biome source: hard classification plus smoothed height and volatility.

use std::sync::Arc;

use cubicgen_config::GeneratorSettings;
use cubicgen_voxel::BiomeId;
use glam::IVec3;

use super::{BiomeDef, BiomeProvider, BiomeRegistry, ClimateBiomeProvider, ReplacerChain, SingleBiomeProvider};
use crate::error::{GeneratorError, Result};
use crate::field::ScalarField;
use crate::populate::CubicPopulator;

/// Edge length, in blocks, of one biome cell of the smoothing kernel.
pub const BIOME_CELL: i32 = 4;

/// Per-position biome lookups for one generator.
///
/// `get_biome` is a hard classification. Height and volatility are weighted
/// averages over a `(2r+1)²` neighbourhood of biome cells so transitions in
/// the density field are smooth. Both are height-invariant: the neighbourhood
/// is always sampled at `y = 0`.
pub struct BiomeSource {
    provider: Arc<dyn BiomeProvider>,
    registry: Arc<BiomeRegistry>,
    radius: i32,
    weights: Vec<f64>,
    empty: ReplacerChain,
}

impl BiomeSource {
    pub fn new(provider: Arc<dyn BiomeProvider>, registry: Arc<BiomeRegistry>, radius: u32) -> Result<Self> {
        if registry.is_empty() {
            return Err(GeneratorError::EmptyCatalogue);
        }
        let r = radius as i32;
        let weights = (-r..=r)
            .flat_map(|dz| (-r..=r).map(move |dx| (dx, dz)))
            .map(|(dx, dz)| 10.0 / libm::sqrt((dx * dx + dz * dz) as f64 + 0.2))
            .collect();
        Ok(Self {
            provider,
            registry,
            radius: r,
            weights,
            empty: ReplacerChain::default(),
        })
    }

    /// Source for `settings`: a single biome when the settings name one, the
    /// catalogue's climate otherwise, and the first catalogue entry when the
    /// catalogue has no climate.
    pub fn for_settings(seed: u64, settings: &GeneratorSettings, registry: Arc<BiomeRegistry>) -> Result<Self> {
        let first = registry.ids().next().ok_or(GeneratorError::EmptyCatalogue)?;
        let provider: Arc<dyn BiomeProvider> = match (&settings.biome, registry.climate()) {
            (Some(name), _) => {
                let id = registry
                    .lookup_by_name(name)
                    .ok_or_else(|| GeneratorError::UnknownBiome(name.clone()))?;
                Arc::new(SingleBiomeProvider(id))
            }
            (None, Some(diagram)) => Arc::new(ClimateBiomeProvider::new(seed, diagram.clone())),
            (None, None) => Arc::new(SingleBiomeProvider(first)),
        };
        Self::new(provider, registry, settings.biome_smooth_radius)
    }

    pub fn get_biome(&self, pos: IVec3) -> BiomeId {
        self.provider.biome_at(pos)
    }

    pub fn get_height(&self, pos: IVec3) -> f64 {
        self.smoothed(pos).0
    }

    pub fn get_volatility(&self, pos: IVec3) -> f64 {
        self.smoothed(pos).1
    }

    /// Block pipeline of the biome at `pos`; empty for biomes missing from the catalogue.
    pub fn get_replacers(&self, pos: IVec3) -> &ReplacerChain {
        self.replacers_of(self.get_biome(pos))
    }

    pub fn replacers_of(&self, biome: BiomeId) -> &ReplacerChain {
        self.registry.get(biome).map_or(&self.empty, |d| &d.replacers)
    }

    pub fn decorator_of(&self, biome: BiomeId) -> Option<&Arc<dyn CubicPopulator>> {
        self.registry.get(biome).and_then(|d| d.decorator.as_ref())
    }

    pub fn definition(&self, biome: BiomeId) -> Option<&BiomeDef> {
        self.registry.get(biome)
    }

    pub fn registry(&self) -> &Arc<BiomeRegistry> {
        &self.registry
    }

    /// Weighted `(height, volatility)` around the biome cell containing `pos`.
    fn smoothed(&self, pos: IVec3) -> (f64, f64) {
        let cell_x = pos.x.div_euclid(BIOME_CELL);
        let cell_z = pos.z.div_euclid(BIOME_CELL);
        let center_height = self
            .registry
            .get(self.provider.biome_at(cell_center(cell_x, cell_z)))
            .map_or(0.0, |d| d.height);

        let r = self.radius;
        let (mut height, mut volatility, mut total) = (0.0, 0.0, 0.0);
        let mut weights = self.weights.iter();
        for dz in -r..=r {
            for dx in -r..=r {
                let base = weights.next().copied().unwrap_or(0.0);
                let Some(def) = self
                    .registry
                    .get(self.provider.biome_at(cell_center(cell_x + dx, cell_z + dz)))
                else {
                    continue;
                };
                let mut weight = base / (def.height + 2.0).max(0.1);
                if def.height > center_height {
                    weight *= 0.5;
                }
                height += def.height * weight;
                volatility += def.height_variation * weight;
                total += weight;
            }
        }
        if total > 0.0 {
            (height / total, volatility / total)
        } else {
            (0.0, 0.0)
        }
    }
}

fn cell_center(cell_x: i32, cell_z: i32) -> IVec3 {
    IVec3::new(cell_x * BIOME_CELL + BIOME_CELL / 2, 0, cell_z * BIOME_CELL + BIOME_CELL / 2)
}

impl std::fmt::Debug for BiomeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiomeSource")
            .field("radius", &self.radius)
            .field("biomes", &self.registry.len())
            .finish()
    }
}

/// Which smoothed biome parameter a [`BiomeField`] exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BiomeChannel {
    Height,
    Volatility,
}

/// A smoothed biome parameter as a scalar field.
#[derive(Clone, Debug)]
pub struct BiomeField {
    pub source: Arc<BiomeSource>,
    pub channel: BiomeChannel,
}

impl ScalarField for BiomeField {
    fn eval(&self, pos: IVec3) -> f64 {
        match self.channel {
            BiomeChannel::Height => self.source.get_height(pos),
            BiomeChannel::Volatility => self.source.get_volatility(pos),
        }
    }
}
