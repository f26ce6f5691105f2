//! Generator settings with sensible defaults and RON persistence.
//!
//! `GeneratorSettings` is the immutable snapshot the terrain generator is built
//! from. Cube-area overrides nest a complete `GeneratorSettings` per box, so a
//! region can use an entirely different configuration.

use std::path::{Path, PathBuf};

use cubicgen_math::IntAabb;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the generator settings inside a save folder.
pub const SETTINGS_FILE: &str = "cubicgen.ron";

/// File name of the world/run configuration inside a save folder.
pub const WORLD_FILE: &str = "world.ron";

/// Largest accepted biome smoothing radius, in biome cells.
pub const MAX_SMOOTH_RADIUS: u32 = 8;

/// Accepted octave counts for a noise layer.
pub const OCTAVE_RANGE: std::ops::RangeInclusive<u32> = 1..=32;

/// Frequency, octave count and linear mapping of one noise layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseLayerSettings {
    pub frequency_x: f64,
    pub frequency_y: f64,
    pub frequency_z: f64,
    pub octaves: u32,
    /// Multiplier applied to the normalized `[-1, 1]` noise.
    pub factor: f64,
    /// Offset added after `factor`.
    pub offset: f64,
}

impl NoiseLayerSettings {
    /// Layer with horizontal frequency `xz`, vertical frequency `y`.
    pub fn new(xz: f64, y: f64, octaves: u32, factor: f64, offset: f64) -> Self {
        Self {
            frequency_x: xz,
            frequency_y: y,
            frequency_z: xz,
            octaves,
            factor,
            offset,
        }
    }

    fn validate(&self, path: &str) -> Result<(), ConfigError> {
        if !OCTAVE_RANGE.contains(&self.octaves) {
            return Err(ConfigError::invalid(
                format!("{path}.octaves"),
                format!("{} is outside 1..=32", self.octaves),
            ));
        }
        for (name, value) in [
            ("frequency_x", self.frequency_x),
            ("frequency_y", self.frequency_y),
            ("frequency_z", self.frequency_z),
            ("factor", self.factor),
            ("offset", self.offset),
        ] {
            check_finite(&format!("{path}.{name}"), value)?;
        }
        Ok(())
    }
}

impl Default for NoiseLayerSettings {
    fn default() -> Self {
        Self::new(0.005, 0.005, 8, 1.0, 0.0)
    }
}

/// A box of cube coordinates generated with its own settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CubeArea {
    /// Inclusive cube-coordinate bounds.
    pub bounds: IntAabb,
    pub settings: GeneratorSettings,
}

/// All tunables of the density-field terrain generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Blends between the low and high layers; clamped to `[0, 1]` after mapping.
    pub selector: NoiseLayerSettings,
    pub low: NoiseLayerSettings,
    pub high: NoiseLayerSettings,
    /// Height-invariant depth noise. `frequency_y` is ignored.
    pub depth: NoiseLayerSettings,
    pub height_factor: f64,
    pub height_offset: f64,
    pub height_variation_factor: f64,
    /// Volatility multiplier applied below the biome's average height.
    pub special_height_variation_factor_below_average_y: f64,
    pub height_variation_offset: f64,
    /// Block y below which air becomes water.
    pub water_level: i32,
    /// Generate a single-biome world with this catalogue entry.
    pub biome: Option<String>,
    /// Radius, in 4-block biome cells, of the height/volatility blend.
    pub biome_smooth_radius: u32,
    pub caves: bool,
    pub ravines: bool,
    pub strongholds: bool,
    /// Regional overrides, tested in order; the first containing box wins.
    pub cube_areas: Vec<CubeArea>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            selector: NoiseLayerSettings::new(0.0032, 0.0016, 8, 12.75, 0.5),
            low: NoiseLayerSettings::new(0.0052, 0.0026, 16, 1.0, 0.0),
            high: NoiseLayerSettings::new(0.0052, 0.0026, 16, 1.0, 0.0),
            depth: NoiseLayerSettings::new(0.0061, 0.0, 16, 1.024, 0.0),
            height_factor: 64.0,
            height_offset: 64.0,
            height_variation_factor: 64.0,
            special_height_variation_factor_below_average_y: 0.25,
            height_variation_offset: 0.0,
            water_level: 63,
            biome: None,
            biome_smooth_radius: 2,
            caves: true,
            ravines: true,
            strongholds: true,
            cube_areas: Vec::new(),
        }
    }
}

impl GeneratorSettings {
    /// Checks every field, including nested cube areas.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_at("settings")
    }

    fn validate_at(&self, path: &str) -> Result<(), ConfigError> {
        self.selector.validate(&format!("{path}.selector"))?;
        self.low.validate(&format!("{path}.low"))?;
        self.high.validate(&format!("{path}.high"))?;
        self.depth.validate(&format!("{path}.depth"))?;
        for (name, value) in [
            ("height_factor", self.height_factor),
            ("height_offset", self.height_offset),
            ("height_variation_factor", self.height_variation_factor),
            (
                "special_height_variation_factor_below_average_y",
                self.special_height_variation_factor_below_average_y,
            ),
            ("height_variation_offset", self.height_variation_offset),
        ] {
            check_finite(&format!("{path}.{name}"), value)?;
        }
        if self.biome_smooth_radius > MAX_SMOOTH_RADIUS {
            return Err(ConfigError::invalid(
                format!("{path}.biome_smooth_radius"),
                format!("{} exceeds {MAX_SMOOTH_RADIUS}", self.biome_smooth_radius),
            ));
        }
        if let Some(name) = &self.biome
            && name.trim().is_empty()
        {
            return Err(ConfigError::invalid(format!("{path}.biome"), "empty biome name"));
        }
        for (i, area) in self.cube_areas.iter().enumerate() {
            let area_path = format!("{path}.cube_areas[{i}]");
            if !area.bounds.is_well_formed() {
                return Err(ConfigError::invalid(
                    format!("{area_path}.bounds"),
                    format!("min {} exceeds max {}", area.bounds.min, area.bounds.max),
                ));
            }
            area.settings.validate_at(&format!("{area_path}.settings"))?;
        }
        Ok(())
    }

    /// Parses and validates a settings payload.
    pub fn from_ron_str(payload: &str) -> Result<Self, ConfigError> {
        let settings: GeneratorSettings = ron::from_str(payload).map_err(ConfigError::ParseError)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(false)
            .enumerate_arrays(false);
        ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)
    }

    /// Path of the settings file inside `save_dir`.
    pub fn path_in(save_dir: &Path) -> PathBuf {
        save_dir.join(SETTINGS_FILE)
    }

    /// Loads settings from a save folder, failing with `NotFound` when absent.
    pub fn load_from_save_dir(save_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(save_dir);
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadError)?;
        let settings = Self::from_ron_str(&contents)?;
        log::info!("Loaded generator settings from {}", path.display());
        Ok(settings)
    }

    /// Loads settings, or writes and returns the defaults when the file is absent.
    pub fn load_or_create(save_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load_from_save_dir(save_dir) {
            Err(ConfigError::NotFound(path)) => {
                let settings = Self::default();
                settings.save(save_dir)?;
                log::info!("Created default generator settings at {}", path.display());
                Ok(settings)
            }
            other => other,
        }
    }

    pub fn save(&self, save_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(save_dir).map_err(ConfigError::WriteError)?;
        let serialized = self.to_ron_string()?;
        std::fs::write(Self::path_in(save_dir), serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Returns `Some(new_settings)` if the file on disk differs from `self`.
    pub fn reload(&self, save_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_settings = Self::load_from_save_dir(save_dir)?;
        if &new_settings != self {
            log::info!("Generator settings reloaded with changes");
            Ok(Some(new_settings))
        } else {
            Ok(None)
        }
    }

    /// Number of generator configurations in this tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .cube_areas
            .iter()
            .map(|a| a.settings.node_count())
            .sum::<usize>()
    }
}

/// World and run parameters for the command-line generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// 64-bit world seed.
    pub seed: u64,
    /// Horizontal radius, in cubes, of the generated region around the origin.
    pub radius: u32,
    pub cube_y_min: i32,
    pub cube_y_max: i32,
    /// Worker threads for batch generation (0 = automatic).
    pub threads: usize,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            radius: 2,
            cube_y_min: 2,
            cube_y_max: 5,
            threads: 0,
            log_level: "info".to_string(),
        }
    }
}

impl WorldConfig {
    /// Load from `save_dir`, or create a default `world.ron`.
    pub fn load_or_create(save_dir: &Path) -> Result<Self, ConfigError> {
        let path = save_dir.join(WORLD_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadError)?;
            let config: WorldConfig = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded world config from {}", path.display());
            Ok(config)
        } else {
            let config = WorldConfig::default();
            config.save(save_dir)?;
            log::info!("Created default world config at {}", path.display());
            Ok(config)
        }
    }

    pub fn save(&self, save_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(save_dir).map_err(ConfigError::WriteError)?;
        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(save_dir.join(WORLD_FILE), serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is not finite")))
    }
}
