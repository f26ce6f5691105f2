//! The cube-generation pipeline and its region hierarchy.
//!
//! A [`GeneratorState`] is the immutable product of one settings snapshot:
//! noise sources, the terrain field graph, the biome source, the resolved
//! structure collaborators and one nested state per cube area. A
//! [`TerrainGenerator`] is the per-worker side: a state snapshot plus the
//! mutable caches for every graph in the hierarchy.
//!
//! Generation of one cube runs, in order: region dispatch, density sampling
//! with block replacement, caves, ravines, strongholds, and (for nested
//! states only) the coarse biome stamp.

use std::sync::Arc;

use cubicgen_config::{GeneratorSettings, NoiseLayerSettings};
use cubicgen_math::CubePos;
use cubicgen_voxel::{BIOME_GRID_SIZE, CubePrimer};
use glam::IVec3;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use crate::biome::{BiomeChannel, BiomeField, BiomeRegistry, BiomeSource, ReplaceContext};
use crate::error::{GeneratorError, Result};
use crate::field::{Axis, CacheStats, FieldCaches, FieldGraph, FieldId, Sign};
use crate::handle::GeneratorHandle;
use crate::noise_source::NoiseSource;
use crate::populate::{HostWorld, PopulateFlow, PopulateStage, PopulationHooks};
use crate::region::RegionOverrides;
use crate::seed::cube_rng;
use crate::structure::{StructureGenerator, StructureKind, StructureRegistry};

/// Blocks between sparse density samples along each axis.
pub const SAMPLE_STRIDE: IVec3 = IVec3::new(4, 8, 4);

/// Sparse sample cells per cube along each axis.
pub const SAMPLE_CELLS: IVec3 = IVec3::new(4, 2, 4);

/// Blocks between coarse biome samples.
const BIOME_STEP: i32 = 4;

/// Depth noise scale after shaping.
const DEPTH_SCALE: f64 = 0.2 * 17.0 / 64.0;

// ---------------------------------------------------------------------------
// Generator state
// ---------------------------------------------------------------------------

/// Everything built from one settings snapshot. Immutable after construction.
pub struct GeneratorState {
    seed: u64,
    settings: GeneratorSettings,
    nested: bool,
    graph: FieldGraph,
    terrain: FieldId,
    biomes: Arc<BiomeSource>,
    structures: StructureRegistry,
    enabled: [bool; 3],
    regions: RegionOverrides<Arc<GeneratorState>>,
}

impl GeneratorState {
    /// Validates `settings` and builds the state and every nested area state.
    pub fn build(
        seed: u64,
        settings: &GeneratorSettings,
        catalogue: &Arc<BiomeRegistry>,
        structures: &StructureRegistry,
        nested: bool,
    ) -> Result<Self> {
        settings.validate()?;
        Self::build_validated(seed, settings, catalogue, structures, nested)
    }

    fn build_validated(
        seed: u64,
        settings: &GeneratorSettings,
        catalogue: &Arc<BiomeRegistry>,
        structures: &StructureRegistry,
        nested: bool,
    ) -> Result<Self> {
        let biomes = Arc::new(BiomeSource::for_settings(seed, settings, Arc::clone(catalogue))?);
        let (graph, terrain) = build_terrain_graph(seed, settings, &biomes);

        let mut enabled = [settings.caves, settings.ravines, settings.strongholds];
        for (kind, on) in StructureKind::ALL.into_iter().zip(enabled.iter_mut()) {
            if *on && structures.get(kind).is_none() {
                warn!(%kind, "{}; toggle forced off", GeneratorError::StructureUnavailable(kind));
                *on = false;
            }
        }

        let mut regions = RegionOverrides::new();
        for area in &settings.cube_areas {
            let sub = Self::build_validated(seed, &area.settings, catalogue, structures, true)?;
            regions.push(area.bounds, Arc::new(sub));
        }

        debug!(
            nested,
            nodes = graph.len(),
            caches = graph.cache_specs().len(),
            regions = regions.len(),
            "generator state built"
        );
        Ok(Self {
            seed,
            settings: settings.clone(),
            nested,
            graph,
            terrain,
            biomes,
            structures: structures.clone(),
            enabled,
            regions,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Whether this state belongs to a cube area rather than the top level.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn biomes(&self) -> &Arc<BiomeSource> {
        &self.biomes
    }

    pub fn regions(&self) -> &RegionOverrides<Arc<GeneratorState>> {
        &self.regions
    }

    /// Whether `kind` runs during generation after unavailable collaborators
    /// were forced off.
    pub fn structure_enabled(&self, kind: StructureKind) -> bool {
        self.enabled[kind as usize]
    }

    /// Raw density at a block, bypassing interpolation and caches.
    pub fn density(&self, pos: IVec3) -> f64 {
        self.graph.eval_uncached(self.terrain, pos)
    }

    /// The state generating `cube`: the first matching area, or `self`.
    pub fn resolve(&self, cube: CubePos) -> &GeneratorState {
        self.regions.find(cube).map_or(self, |(_, sub)| sub.resolve(cube))
    }

    fn active_structure(&self, kind: StructureKind) -> Option<&Arc<dyn StructureGenerator>> {
        self.structures
            .get(kind)
            .filter(|_| self.structure_enabled(kind))
    }

    /// Generates one cube, delegating wholesale to a matching area.
    pub fn generate(&self, cube: CubePos, caches: &mut CacheTree) -> Result<CubePrimer> {
        if let Some((index, sub)) = self.regions.find(cube) {
            return sub.generate(cube, caches.child(index));
        }

        let mut primer = CubePrimer::new();
        let min = cube.min_block();
        let start = cube.as_ivec3() * SAMPLE_CELLS;
        let mut non_finite = None;
        self.graph.for_each_scaled(
            self.terrain,
            start,
            start + SAMPLE_CELLS,
            SAMPLE_STRIDE,
            &mut caches.own,
            |sample| {
                if non_finite.is_some() {
                    return;
                }
                if !sample.value.is_finite() {
                    non_finite = Some(sample.pos);
                    return;
                }
                let biome = self.biomes.get_biome(sample.pos);
                let block = self
                    .biomes
                    .replacers_of(biome)
                    .apply(&ReplaceContext::from_sample(sample, biome, self.settings.water_level));
                let local = sample.pos - min;
                primer.set_block_state(local.x as usize, local.y as usize, local.z as usize, block);
            },
        );
        if let Some(pos) = non_finite {
            return Err(GeneratorError::NonFiniteDensity {
                x: pos.x,
                y: pos.y,
                z: pos.z,
            });
        }

        for kind in StructureKind::ALL {
            if let Some(structure) = self.active_structure(kind) {
                structure.generate(self.seed, Some(&mut primer), cube);
            }
        }

        if self.nested {
            self.fill_biomes(&mut primer, min);
        }
        trace!(%cube, nested = self.nested, "cube generated");
        Ok(primer)
    }

    /// Stamps the biome at the centre of every 4×4×4 cell.
    fn fill_biomes(&self, primer: &mut CubePrimer, min: IVec3) {
        for y in 0..BIOME_GRID_SIZE {
            for z in 0..BIOME_GRID_SIZE {
                for x in 0..BIOME_GRID_SIZE {
                    let cell = IVec3::new(x as i32, y as i32, z as i32) * BIOME_STEP;
                    let pos = min + cell + IVec3::splat(BIOME_STEP / 2);
                    primer.set_biome(x, y, z, self.biomes.get_biome(pos));
                }
            }
        }
    }

    /// Runs the population sequence for one cube.
    ///
    /// Order: `Cube` stage (cancel skips everything below), dominant biome,
    /// `Pre` stage (cancel skips the next two steps), stronghold population,
    /// biome decorator, `Post` stage, registered populators. Every step draws
    /// from the same stream derived from the world seed and `cube`.
    ///
    /// Stronghold population follows the `strongholds` toggle, unlike
    /// [`closest_structure`](Self::closest_structure) which answers with the
    /// toggle off. A world generated without stronghold rooms therefore gets
    /// no stronghold fittings either.
    pub fn populate(&self, cube: CubePos, world: &mut dyn HostWorld, hooks: &PopulationHooks) {
        if let Some((_, sub)) = self.regions.find(cube) {
            sub.populate(cube, world, hooks);
            return;
        }

        let mut rng = cube_rng(self.seed, cube);
        if hooks.fire(PopulateStage::Cube, cube, world, &mut rng) == PopulateFlow::Cancel {
            debug!(%cube, "population cancelled");
            return;
        }

        let center = cube.center_block();
        let biome = world
            .biome_at(center)
            .unwrap_or_else(|| self.biomes.get_biome(center));

        if hooks.fire(PopulateStage::Pre, cube, world, &mut rng) == PopulateFlow::Continue {
            if let Some(strongholds) = self.active_structure(StructureKind::Strongholds) {
                strongholds.populate(world, &mut rng, cube);
            }
            if let Some(decorator) = self.biomes.decorator_of(biome) {
                decorator.populate(world, &mut rng, cube, biome);
            }
        }
        hooks.fire(PopulateStage::Post, cube, world, &mut rng);

        for populator in hooks.populators() {
            populator.populate(world, &mut rng, cube, biome);
        }
    }

    /// Rebuilds stronghold bookkeeping for `cube` after a reload.
    pub fn recreate_structures(&self, cube: CubePos) {
        if let Some((_, sub)) = self.regions.find(cube) {
            sub.recreate_structures(cube);
            return;
        }
        if let Some(strongholds) = self.active_structure(StructureKind::Strongholds) {
            strongholds.recreate_structures(self.seed, cube);
        }
    }

    /// Nearest structure named `name` as seen by the generator owning `pos`.
    pub fn closest_structure(&self, name: &str, pos: IVec3, allow_unexplored: bool) -> Option<IVec3> {
        let cube = CubePos::from_block(pos);
        if let Some((_, sub)) = self.regions.find(cube) {
            return sub.closest_structure(name, pos, allow_unexplored);
        }
        StructureKind::ALL
            .into_iter()
            .filter_map(|kind| self.structures.get(kind))
            .find(|g| g.name() == name)
            .and_then(|g| g.nearest_structure_position(self.seed, pos, allow_unexplored))
    }
}

impl std::fmt::Debug for GeneratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorState")
            .field("seed", &self.seed)
            .field("nested", &self.nested)
            .field("graph", &self.graph)
            .field("enabled", &self.enabled)
            .field("regions", &self.regions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Terrain field
// ---------------------------------------------------------------------------

fn noise_layer(graph: &mut FieldGraph, seed: u64, layer: &NoiseLayerSettings, flat: bool) -> FieldId {
    let fy = if flat { 0.0 } else { layer.frequency_y };
    let source = NoiseSource::builder()
        .seed(seed)
        .frequency(layer.frequency_x, fy, layer.frequency_z)
        .octaves(layer.octaves)
        .build();
    let noise = graph.source(source);
    let scaled = graph.mul(noise, layer.factor);
    graph.add(scaled, layer.offset)
}

/// Builds the top-level density field. Positive density is solid.
pub fn build_terrain_graph(seed: u64, settings: &GeneratorSettings, biomes: &Arc<BiomeSource>) -> (FieldGraph, FieldId) {
    let mut g = FieldGraph::new();
    let mut seeds = ChaCha8Rng::seed_from_u64(seed);
    let (sel_seed, low_seed, high_seed, depth_seed) =
        (seeds.next_u64(), seeds.next_u64(), seeds.next_u64(), seeds.next_u64());

    let selector = noise_layer(&mut g, sel_seed, &settings.selector, false);
    let selector = g.clamp(selector, 0.0, 1.0);
    let low = noise_layer(&mut g, low_seed, &settings.low, false);
    let high = noise_layer(&mut g, high_seed, &settings.high, false);

    let depth = noise_layer(&mut g, depth_seed, &settings.depth, true);
    let depth = g.mul_if(Sign::Negative, depth, -0.3);
    let depth = g.mul(depth, 3.0);
    let depth = g.sub(depth, 2.0);
    let depth = g.clamp(depth, -2.0, 1.0);
    let depth = g.div_if(Sign::Negative, depth, 5.6);
    let depth = g.div_if(Sign::Positive, depth, 8.0);
    let depth = g.mul(depth, DEPTH_SCALE);
    let depth = g.cached_2d(depth);

    let y = g.coordinate(Axis::Y);

    let height = g.source(BiomeField {
        source: Arc::clone(biomes),
        channel: BiomeChannel::Height,
    });
    let height = g.cached_2d(height);
    let height = g.mul(height, settings.height_factor);
    let height = g.add(height, settings.height_offset);

    let volatility = g.source(BiomeField {
        source: Arc::clone(biomes),
        channel: BiomeChannel::Volatility,
    });
    let volatility = g.cached_2d(volatility);
    let below_average = g.select_greater(
        height,
        y,
        settings.special_height_variation_factor_below_average_y,
        1.0,
    );
    let volatility = g.mul(volatility, below_average);
    let volatility = g.mul(volatility, settings.height_variation_factor);
    let volatility = g.add(volatility, settings.height_variation_offset);

    let blend = g.lerp(selector, low, high);
    let shaped = g.add(blend, depth);
    let shaped = g.mul(shaped, volatility);
    let shaped = g.add(shaped, height);
    let direction = g.signum(volatility);
    let falloff = g.mul(direction, y);
    let density = g.sub(shaped, falloff);
    let density = g.cached_3d(density);
    (g, density)
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Field caches for a state and, recursively, for each of its areas.
#[derive(Clone, Debug, Default)]
pub struct CacheTree {
    own: FieldCaches,
    regions: Vec<CacheTree>,
}

impl CacheTree {
    pub fn for_state(state: &GeneratorState) -> Self {
        Self {
            own: state.graph.new_caches(),
            regions: state.regions.iter().map(|(_, sub)| Self::for_state(sub)).collect(),
        }
    }

    fn child(&mut self, index: usize) -> &mut CacheTree {
        if self.regions.len() <= index {
            self.regions.resize_with(index + 1, CacheTree::default);
        }
        &mut self.regions[index]
    }

    /// Summed counters over the whole tree.
    pub fn stats(&self) -> CacheStats {
        self.regions.iter().fold(self.own.stats(), |acc, child| {
            let s = child.stats();
            CacheStats {
                hits: acc.hits + s.hits,
                misses: acc.misses + s.misses,
            }
        })
    }
}

/// A single worker's generator: owns its caches, follows reloads between cubes.
pub struct TerrainGenerator {
    handle: GeneratorHandle,
    state: Arc<GeneratorState>,
    caches: CacheTree,
}

impl TerrainGenerator {
    pub fn new(handle: GeneratorHandle) -> Self {
        let state = handle.current();
        let caches = CacheTree::for_state(&state);
        Self { handle, state, caches }
    }

    /// Adopts the handle's current state if a reload replaced it.
    fn refresh(&mut self) {
        let current = self.handle.current();
        if !Arc::ptr_eq(&current, &self.state) {
            debug!("worker adopting reloaded generator state");
            self.caches = CacheTree::for_state(&current);
            self.state = current;
        }
    }

    pub fn generate_cube(&mut self, cube: CubePos) -> Result<CubePrimer> {
        self.refresh();
        self.state.generate(cube, &mut self.caches)
    }

    pub fn populate(&mut self, cube: CubePos, world: &mut dyn HostWorld) {
        self.refresh();
        self.state.populate(cube, world, self.handle.hooks());
    }

    pub fn recreate_structures(&mut self, cube: CubePos) {
        self.refresh();
        self.state.recreate_structures(cube);
    }

    pub fn closest_structure(&mut self, name: &str, pos: IVec3, allow_unexplored: bool) -> Option<IVec3> {
        self.refresh();
        self.state.closest_structure(name, pos, allow_unexplored)
    }

    pub fn state(&self) -> &Arc<GeneratorState> {
        &self.state
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }
}
