//! Block replacers: the per-biome pipeline turning a density sample into a block.
//!
//! A [`ReplacerChain`] is built once per biome and applied in order, starting
//! from air. Each stage sees the block produced by the previous stage. A stage
//! that wants to veto later ones does so by convention: later stages leave
//! blocks they do not recognise untouched.

use std::sync::Arc;

use cubicgen_voxel::{BiomeId, BlockId};
use glam::{DVec3, IVec3};

use crate::field::DensitySample;

/// Everything a replacer may inspect about the cell being resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplaceContext {
    /// Absolute block coordinate.
    pub pos: IVec3,
    /// Offset within the coarse sampling interval.
    pub frac: DVec3,
    /// Raw density; positive is solid.
    pub density: f64,
    /// Per-block density derivative.
    pub gradient: DVec3,
    /// Hard biome classification at `pos`.
    pub biome: BiomeId,
    /// Water level of the generator resolving this cell.
    pub water_level: i32,
}

impl ReplaceContext {
    pub fn from_sample(sample: &DensitySample, biome: BiomeId, water_level: i32) -> Self {
        Self {
            pos: sample.pos,
            frac: sample.frac,
            density: sample.value,
            gradient: sample.gradient,
            biome,
            water_level,
        }
    }
}

/// One stage of the block-replacement pipeline.
pub trait BlockReplacer: Send + Sync {
    fn replace(&self, previous: BlockId, ctx: &ReplaceContext) -> BlockId;
}

impl<F> BlockReplacer for F
where
    F: Fn(BlockId, &ReplaceContext) -> BlockId + Send + Sync,
{
    fn replace(&self, previous: BlockId, ctx: &ReplaceContext) -> BlockId {
        self(previous, ctx)
    }
}

/// Immutable ordered sequence of replacers, cheap to clone.
#[derive(Clone, Default)]
pub struct ReplacerChain {
    stages: Arc<[Arc<dyn BlockReplacer>]>,
}

impl ReplacerChain {
    pub fn new(stages: Vec<Arc<dyn BlockReplacer>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    /// Runs every stage in order, starting from air.
    pub fn apply(&self, ctx: &ReplaceContext) -> BlockId {
        self.stages
            .iter()
            .fold(BlockId::AIR, |block, stage| stage.replace(block, ctx))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The standard chain: terrain shape, then surface, then ocean water.
    pub fn standard(top: BlockId, filler: BlockId) -> Self {
        Self::new(vec![
            Arc::new(TerrainShapeReplacer::default()),
            Arc::new(SurfaceReplacer::new(top, filler).with_sea_floor()),
            Arc::new(OceanWaterReplacer::default()),
        ])
    }
}

impl std::fmt::Debug for ReplacerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplacerChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Solid block where density is positive, air elsewhere.
#[derive(Clone, Copy, Debug)]
pub struct TerrainShapeReplacer {
    pub solid: BlockId,
}

impl Default for TerrainShapeReplacer {
    fn default() -> Self {
        Self {
            solid: BlockId::STONE,
        }
    }
}

impl BlockReplacer for TerrainShapeReplacer {
    fn replace(&self, _previous: BlockId, ctx: &ReplaceContext) -> BlockId {
        if ctx.density > 0.0 {
            self.solid
        } else {
            BlockId::AIR
        }
    }
}

/// Replaces the upper layers of solid terrain with top and filler blocks.
///
/// Depth below the surface is estimated as `density / -gradient.y`, which is
/// exact for a field that falls off linearly with height.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceReplacer {
    pub top: BlockId,
    pub filler: BlockId,
    /// Only this block is replaced.
    pub base: BlockId,
    /// Depth, in blocks, of the filler layer including the top block.
    pub filler_depth: f64,
    /// Below the water level the top block is replaced by filler (sea floor).
    pub sea_floor: bool,
}

impl SurfaceReplacer {
    pub fn new(top: BlockId, filler: BlockId) -> Self {
        Self {
            top,
            filler,
            base: BlockId::STONE,
            filler_depth: 4.0,
            sea_floor: false,
        }
    }

    pub fn with_sea_floor(mut self) -> Self {
        self.sea_floor = true;
        self
    }
}

impl BlockReplacer for SurfaceReplacer {
    fn replace(&self, previous: BlockId, ctx: &ReplaceContext) -> BlockId {
        if previous != self.base || ctx.gradient.y >= 0.0 {
            return previous;
        }
        let depth = ctx.density / -ctx.gradient.y;
        let under_water = self.sea_floor && ctx.pos.y < ctx.water_level;
        if depth < 1.0 && !under_water {
            self.top
        } else if depth < self.filler_depth {
            self.filler
        } else {
            previous
        }
    }
}

/// Air below the context's water level becomes water.
#[derive(Clone, Copy, Debug)]
pub struct OceanWaterReplacer {
    pub water: BlockId,
}

impl Default for OceanWaterReplacer {
    fn default() -> Self {
        Self { water: BlockId::WATER }
    }
}

impl BlockReplacer for OceanWaterReplacer {
    fn replace(&self, previous: BlockId, ctx: &ReplaceContext) -> BlockId {
        if previous.is_air() && ctx.pos.y < ctx.water_level {
            self.water
        } else {
            previous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(y: i32, density: f64, gradient_y: f64) -> ReplaceContext {
        ReplaceContext {
            pos: IVec3::new(0, y, 0),
            frac: DVec3::ZERO,
            density,
            gradient: DVec3::new(0.0, gradient_y, 0.0),
            biome: BiomeId(0),
            water_level: 63,
        }
    }

    #[test]
    fn test_shape_replacer_uses_density_sign() {
        let r = TerrainShapeReplacer::default();
        assert_eq!(r.replace(BlockId::AIR, &ctx(0, 0.5, -1.0)), BlockId::STONE);
        assert_eq!(r.replace(BlockId::AIR, &ctx(0, 0.0, -1.0)), BlockId::AIR);
        assert_eq!(r.replace(BlockId::AIR, &ctx(0, -3.0, -1.0)), BlockId::AIR);
    }

    #[test]
    fn test_surface_layers_by_estimated_depth() {
        let r = SurfaceReplacer::new(BlockId::GRASS, BlockId::DIRT);
        assert_eq!(r.replace(BlockId::STONE, &ctx(70, 0.5, -1.0)), BlockId::GRASS);
        assert_eq!(r.replace(BlockId::STONE, &ctx(67, 3.0, -1.0)), BlockId::DIRT);
        assert_eq!(r.replace(BlockId::STONE, &ctx(60, 10.0, -1.0)), BlockId::STONE);
    }

    #[test]
    fn test_surface_ignores_overhang_undersides_and_air() {
        let r = SurfaceReplacer::new(BlockId::GRASS, BlockId::DIRT);
        assert_eq!(r.replace(BlockId::STONE, &ctx(70, 0.5, 1.0)), BlockId::STONE);
        assert_eq!(r.replace(BlockId::AIR, &ctx(70, 0.5, -1.0)), BlockId::AIR);
    }

    #[test]
    fn test_surface_under_water_uses_filler() {
        let r = SurfaceReplacer::new(BlockId::GRASS, BlockId::DIRT).with_sea_floor();
        assert_eq!(r.replace(BlockId::STONE, &ctx(40, 0.5, -1.0)), BlockId::DIRT);
    }

    #[test]
    fn test_ocean_water_below_level_only() {
        let r = OceanWaterReplacer::default();
        assert_eq!(r.replace(BlockId::AIR, &ctx(62, -1.0, -1.0)), BlockId::WATER);
        assert_eq!(r.replace(BlockId::AIR, &ctx(63, -1.0, -1.0)), BlockId::AIR);
        assert_eq!(r.replace(BlockId::STONE, &ctx(10, 1.0, -1.0)), BlockId::STONE);
    }

    #[test]
    fn test_water_follows_context_level() {
        let chain = ReplacerChain::standard(BlockId::GRASS, BlockId::DIRT);
        let low = ctx(100, -1.0, -1.0);
        let high = ReplaceContext { water_level: 200, ..low };
        assert_eq!(chain.apply(&low), BlockId::AIR);
        assert_eq!(chain.apply(&high), BlockId::WATER);
    }

    #[test]
    fn test_chain_applies_in_order_from_air() {
        let chain = ReplacerChain::standard(BlockId::SAND, BlockId::SANDSTONE);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.apply(&ctx(80, -2.0, -1.0)), BlockId::AIR);
        assert_eq!(chain.apply(&ctx(50, -2.0, -1.0)), BlockId::WATER);
        assert_eq!(chain.apply(&ctx(70, 0.5, -1.0)), BlockId::SAND);
        assert_eq!(chain.apply(&ctx(10, 50.0, -1.0)), BlockId::STONE);
        assert_eq!(chain.apply(&ctx(40, 0.5, -1.0)), BlockId::SANDSTONE, "sea floor gets filler");
    }

    #[test]
    fn test_swapping_order_sensitive_stages_changes_result() {
        let to_dirt = |b: BlockId, _: &ReplaceContext| if b == BlockId::STONE { BlockId::DIRT } else { b };
        let to_sand = |b: BlockId, _: &ReplaceContext| if b == BlockId::STONE { BlockId::SAND } else { b };
        let shape: Arc<dyn BlockReplacer> = Arc::new(TerrainShapeReplacer::default());
        let ab = ReplacerChain::new(vec![shape.clone(), Arc::new(to_dirt), Arc::new(to_sand)]);
        let ba = ReplacerChain::new(vec![shape, Arc::new(to_sand), Arc::new(to_dirt)]);
        let c = ctx(0, 1.0, -1.0);
        assert_eq!(ab.apply(&c), BlockId::DIRT);
        assert_eq!(ba.apply(&c), BlockId::SAND);
    }

    #[test]
    fn test_empty_chain_yields_air() {
        assert_eq!(ReplacerChain::default().apply(&ctx(0, 5.0, -1.0)), BlockId::AIR);
    }
}
