//! Settings for the cubic terrain generator.
//!
//! Generator settings and world parameters persist in a save folder as RON
//! files. Supports CLI overrides via clap, validation, change-detecting reload,
//! and forward/backward compatible serialization.

mod cli;
mod error;
mod settings;

pub use cli::CliArgs;
pub use error::ConfigError;
pub use settings::{
    CubeArea, GeneratorSettings, MAX_SMOOTH_RADIUS, NoiseLayerSettings, OCTAVE_RANGE,
    SETTINGS_FILE, WORLD_FILE, WorldConfig,
};
