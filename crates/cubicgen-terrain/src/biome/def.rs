//! Biome definition: the parameters the terrain engine reads per biome.

use std::sync::Arc;

use crate::populate::CubicPopulator;

use super::ReplacerChain;

/// Catalogue entry for one biome.
#[derive(Clone)]
pub struct BiomeDef {
    /// Unique catalogue name (e.g. "plains").
    pub name: String,
    /// Base terrain height, in units of the configured height factor.
    pub height: f64,
    /// Terrain volatility, in units of the configured variation factor.
    pub height_variation: f64,
    /// Ordered block pipeline applied to every generated block of this biome.
    pub replacers: ReplacerChain,
    /// Decoration pass run during population. `None` for barren biomes.
    pub decorator: Option<Arc<dyn CubicPopulator>>,
}

impl BiomeDef {
    pub fn new(name: &str, height: f64, height_variation: f64) -> Self {
        Self {
            name: name.to_string(),
            height,
            height_variation,
            replacers: ReplacerChain::default(),
            decorator: None,
        }
    }

    pub fn with_replacers(mut self, replacers: ReplacerChain) -> Self {
        self.replacers = replacers;
        self
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn CubicPopulator>) -> Self {
        self.decorator = Some(decorator);
        self
    }
}

impl std::fmt::Debug for BiomeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiomeDef")
            .field("name", &self.name)
            .field("height", &self.height)
            .field("height_variation", &self.height_variation)
            .field("replacers", &self.replacers)
            .field("decorator", &self.decorator.is_some())
            .finish()
    }
}
