//! Binary entry point for `cubicgen`.

use std::process::ExitCode;

use clap::Parser;
use cubicgen_app::batch;
use cubicgen_app::platform::PlatformDirs;
use cubicgen_config::{CliArgs, GeneratorSettings, WorldConfig};
use cubicgen_terrain::GeneratorHandle;
use cubicgen_voxel::BlockRegistry;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match &args.save_dir {
        Some(dir) => PlatformDirs::for_save_dir(dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve the world folder: {e}");
                return ExitCode::FAILURE;
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create {}: {e}", dirs.save_dir.display());
        return ExitCode::FAILURE;
    }

    let mut config = match WorldConfig::load_or_create(&dirs.save_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load world config: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.apply_cli_overrides(&args);
    cubicgen_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let settings = match GeneratorSettings::load_or_create(&dirs.save_dir) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "failed to load generator settings");
            return ExitCode::FAILURE;
        }
    };
    let handle = match GeneratorHandle::new(config.seed, settings) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to build the generator");
            return ExitCode::FAILURE;
        }
    };
    if args.reload
        && let Err(e) = handle.reload_from_save_dir(&dirs.save_dir)
    {
        eprintln!("Reload failed, keeping loaded settings: {e}");
    }

    let report = match batch::run(&handle, &config) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "failed to start generation workers");
            return ExitCode::FAILURE;
        }
    };

    let blocks = BlockRegistry::with_terrain_defaults();
    println!("cubicgen");
    println!("  world:   {}", dirs.save_dir.display());
    println!("  seed:    {}", config.seed);
    println!("  cubes:   {} ({} failed)", report.world.len(), report.failures.len());
    println!("  time:    {} ms", report.elapsed.as_millis());
    println!("  digest:  {:016x}", report.digest);
    for (block, count) in &report.block_counts {
        println!("  {:<14} {count}", blocks.name(*block));
    }
    for failed in &report.failures {
        eprintln!("  cube {}: {}", failed.pos, failed.error);
    }

    if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
