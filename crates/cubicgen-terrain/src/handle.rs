//! Shared, atomically reloadable generator handle.
//!
//! The handle owns the inputs that survive a reload (seed, biome catalogue,
//! structure collaborators, population hooks) and an `Arc` of the current
//! [`GeneratorState`]. A reload builds the complete replacement state first
//! and swaps the pointer only on success, so a reader sees either the old
//! state or the new one, never a mix. Workers adopt a new state between cubes.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use cubicgen_config::GeneratorSettings;
use tracing::{info, warn};

use crate::biome::BiomeRegistry;
use crate::error::Result;
use crate::generator::{GeneratorState, TerrainGenerator};
use crate::populate::{CubicPopulator, PopulationHooks, PopulationListener};
use crate::structure::StructureRegistry;

struct HandleInner {
    seed: u64,
    catalogue: Arc<BiomeRegistry>,
    structures: StructureRegistry,
    hooks: PopulationHooks,
    state: RwLock<Arc<GeneratorState>>,
}

/// Cheaply cloneable reference to one world's generator.
#[derive(Clone)]
pub struct GeneratorHandle {
    inner: Arc<HandleInner>,
}

impl GeneratorHandle {
    /// Handle with the default catalogue, structures and no hooks.
    pub fn new(seed: u64, settings: GeneratorSettings) -> Result<Self> {
        GeneratorHandleBuilder::new(seed).settings(settings).build()
    }

    pub fn builder(seed: u64) -> GeneratorHandleBuilder {
        GeneratorHandleBuilder::new(seed)
    }

    /// The active state. A reload holds the lock only for the pointer swap.
    pub fn current(&self) -> Arc<GeneratorState> {
        let guard = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn settings(&self) -> GeneratorSettings {
        self.current().settings().clone()
    }

    pub fn seed(&self) -> u64 {
        self.inner.seed
    }

    pub fn catalogue(&self) -> &Arc<BiomeRegistry> {
        &self.inner.catalogue
    }

    pub fn hooks(&self) -> &PopulationHooks {
        &self.inner.hooks
    }

    /// A generator with its own caches, for one worker thread.
    pub fn worker(&self) -> TerrainGenerator {
        TerrainGenerator::new(self.clone())
    }

    /// Builds a state from `settings` and swaps it in. On failure the
    /// previous state stays active and the error is returned.
    pub fn reload_settings(&self, settings: GeneratorSettings) -> Result<()> {
        let built = GeneratorState::build(
            self.inner.seed,
            &settings,
            &self.inner.catalogue,
            &self.inner.structures,
            false,
        );
        match built {
            Ok(state) => {
                let mut guard = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
                *guard = Arc::new(state);
                info!(areas = settings.cube_areas.len(), "generator settings reloaded");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload rejected; keeping previous generator state");
                Err(e)
            }
        }
    }

    /// Parses a RON preset and reloads from it.
    pub fn reload_preset(&self, preset: &str) -> Result<()> {
        let settings = GeneratorSettings::from_ron_str(preset).inspect_err(|e| {
            warn!(error = %e, "preset rejected; keeping previous generator state");
        })?;
        self.reload_settings(settings)
    }

    /// Reloads from the settings file in a save folder.
    pub fn reload_from_save_dir(&self, save_dir: &Path) -> Result<()> {
        let settings = GeneratorSettings::load_from_save_dir(save_dir).inspect_err(|e| {
            warn!(error = %e, dir = %save_dir.display(), "settings file rejected; keeping previous generator state");
        })?;
        self.reload_settings(settings)
    }
}

impl std::fmt::Debug for GeneratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorHandle")
            .field("seed", &self.inner.seed)
            .field("biomes", &self.inner.catalogue.len())
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

/// Assembles a [`GeneratorHandle`]; everything but the seed is optional.
pub struct GeneratorHandleBuilder {
    seed: u64,
    settings: GeneratorSettings,
    catalogue: Option<Arc<BiomeRegistry>>,
    structures: StructureRegistry,
    hooks: PopulationHooks,
}

impl GeneratorHandleBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            settings: GeneratorSettings::default(),
            catalogue: None,
            structures: StructureRegistry::with_defaults(),
            hooks: PopulationHooks::new(),
        }
    }

    pub fn settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Biome catalogue. Defaults to [`BiomeRegistry::default_catalogue`].
    pub fn catalogue(mut self, catalogue: Arc<BiomeRegistry>) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    pub fn structures(mut self, structures: StructureRegistry) -> Self {
        self.structures = structures;
        self
    }

    pub fn hooks(mut self, hooks: PopulationHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn listener(mut self, listener: Arc<dyn PopulationListener>) -> Self {
        self.hooks.add_listener(listener);
        self
    }

    pub fn populator(mut self, populator: Arc<dyn CubicPopulator>) -> Self {
        self.hooks.add_populator(populator);
        self
    }

    pub fn build(self) -> Result<GeneratorHandle> {
        let catalogue = match self.catalogue {
            Some(catalogue) => catalogue,
            None => Arc::new(BiomeRegistry::default_catalogue()?),
        };
        let state = GeneratorState::build(self.seed, &self.settings, &catalogue, &self.structures, false)?;
        info!(
            seed = self.seed,
            biomes = catalogue.len(),
            areas = self.settings.cube_areas.len(),
            "terrain generator ready"
        );
        Ok(GeneratorHandle {
            inner: Arc::new(HandleInner {
                seed: self.seed,
                catalogue,
                structures: self.structures,
                hooks: self.hooks,
                state: RwLock::new(Arc::new(state)),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use cubicgen_math::CubePos;

    fn handle() -> GeneratorHandle {
        let settings = GeneratorSettings {
            caves: false,
            ravines: false,
            strongholds: false,
            ..GeneratorSettings::default()
        };
        GeneratorHandle::new(3, settings).unwrap()
    }

    #[test]
    fn test_reload_swaps_state() {
        let h = handle();
        let before = h.current();
        let mut next = h.settings();
        next.water_level = 40;
        h.reload_settings(next.clone()).unwrap();
        assert!(!Arc::ptr_eq(&before, &h.current()));
        assert_eq!(h.settings().water_level, 40);
        assert_eq!(before.settings().water_level, 63, "old snapshot is untouched");

        let cube = CubePos::new(0, 3, 0);
        let fresh = GeneratorHandle::new(3, next).unwrap();
        assert_eq!(h.worker().generate_cube(cube).unwrap(), fresh.worker().generate_cube(cube).unwrap());
    }

    #[test]
    fn test_failed_reload_keeps_state() {
        let h = handle();
        let before = h.current();
        let mut bad = h.settings();
        bad.biome = Some("nowhere".into());
        let err = h.reload_settings(bad).unwrap_err();
        assert!(matches!(err, GeneratorError::UnknownBiome(_)));
        assert!(Arc::ptr_eq(&before, &h.current()));
    }

    #[test]
    fn test_malformed_preset_rejected() {
        let h = handle();
        let before = h.current();
        assert!(matches!(h.reload_preset("(low: ("), Err(GeneratorError::Configuration(_))));
        assert!(Arc::ptr_eq(&before, &h.current()));
    }

    #[test]
    fn test_missing_save_dir_is_configuration_error() {
        let h = handle();
        let dir = tempfile::tempdir().unwrap();
        let err = h.reload_from_save_dir(dir.path()).unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
    }

    #[test]
    fn test_worker_follows_reload() {
        let h = handle();
        let mut worker = h.worker();
        let cube = CubePos::new(0, 3, 0);
        let first = worker.generate_cube(cube).unwrap();
        let mut next = h.settings();
        next.height_offset = -200.0;
        h.reload_settings(next).unwrap();
        let second = worker.generate_cube(cube).unwrap();
        assert_ne!(first, second);
        assert!(Arc::ptr_eq(worker.state(), &h.current()));
    }
}
