//! Headless runner for the Delve simulation.
//!
//! Loads configuration, generates a layered world, spawns the initial
//! population and drives the tick loop. The final world snapshot and run
//! totals are printed to stdout as JSON; everything else goes to the log.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `delve-config.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Generate terrain from the world seed
//! 4. Build the world and settle any unanchored terrain
//! 5. Spawn the initial units
//! 6. Run the tick loop
//! 7. Log the result and print the final snapshot

mod error;
mod run;
mod terrain_gen;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use delve_core::config::{LogFormat, LoggingConfig};
use delve_core::{SimulationConfig, World, WorldSnapshot};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::run::RunTotals;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "delve-config.yaml";

/// What the engine prints when a run finishes.
#[derive(Debug, Serialize)]
struct RunReport {
    totals: RunTotals,
    snapshot: WorldSnapshot,
}

fn main() -> ExitCode {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let loaded = load_config(&path);

    let logging = loaded
        .as_ref()
        .map(|(config, _)| config.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let result = loaded.and_then(|(config, found)| {
        if found {
            info!(path = %path.display(), "configuration loaded");
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
        }
        run(&config)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, category = ?e.category(), "delve-engine failed");
            ExitCode::FAILURE
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Human => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load the simulation configuration from `path`.
///
/// A missing file falls back to defaults; the flag reports whether the file
/// was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

fn run(config: &SimulationConfig) -> Result<(), EngineError> {
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        size_x = config.world.size_x,
        size_y = config.world.size_y,
        size_z = config.world.size_z,
        tick_seconds = config.time.tick_seconds,
        total_ticks = config.time.total_ticks,
        "delve-engine starting"
    );

    let grid = terrain_gen::generate(&config.world)?;
    let mut world = World::from_config(grid, config)?;
    info!(
        materials = world.terrain().materials().len(),
        "world created"
    );

    spawn_population(&mut world, config);
    info!(
        units = world.unit_count(),
        factions = world.active_factions().len(),
        "initial population spawned"
    );

    let totals = run::run_simulation(&mut world, &config.time)?;
    run::log_simulation_end(&world, &totals);

    let report = RunReport {
        totals,
        snapshot: world.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Spawn up to `population.initial_units` units.
///
/// Spawning stops at the first failure, which only happens when the world
/// has no standing position left or the population limits are reached.
fn spawn_population(world: &mut World, config: &SimulationConfig) {
    let population = &config.population;
    for _ in 0..population.initial_units {
        match world.spawn_unit(population.default_behaviour) {
            Ok(id) => debug!(unit = %id, "unit spawned"),
            Err(e) => {
                warn!(
                    error = %e,
                    spawned = world.unit_count(),
                    requested = population.initial_units,
                    "stopped spawning units"
                );
                break;
            }
        }
    }
}
