//! Command-line argument parsing for the cubic terrain generator.

use std::path::PathBuf;

use clap::Parser;

use crate::WorldConfig;

/// `cubicgen` command-line arguments.
///
/// CLI values override settings loaded from `world.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "cubicgen", about = "Density-field cubic terrain generator")]
pub struct CliArgs {
    /// Save folder holding `cubicgen.ron` and `world.ron`.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Horizontal radius in cubes around the origin.
    #[arg(long)]
    pub radius: Option<u32>,

    /// Lowest cube y to generate.
    #[arg(long, allow_hyphen_values = true)]
    pub cube_y_min: Option<i32>,

    /// Highest cube y to generate.
    #[arg(long, allow_hyphen_values = true)]
    pub cube_y_max: Option<i32>,

    /// Worker threads (0 = automatic).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Reload generator settings from the save folder before generating.
    #[arg(long)]
    pub reload: bool,
}

impl WorldConfig {
    /// Apply CLI overrides to a loaded world config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(radius) = args.radius {
            self.radius = radius;
        }
        if let Some(min) = args.cube_y_min {
            self.cube_y_min = min;
        }
        if let Some(max) = args.cube_y_max {
            self.cube_y_max = max;
        }
        if let Some(threads) = args.threads {
            self.threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.log_level = level.clone();
        }
    }
}
