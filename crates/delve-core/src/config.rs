//! Run configuration, read from `delve-config.yaml`.
//!
//! [`SimulationConfig`] has one section per concern: world generation,
//! population, time, unit tunables and logging. Any key may be left out and
//! takes the default listed at the bottom of this module. Cross-field rules
//! are checked by [`SimulationConfig::validate`] after parsing.

use std::path::Path;

use delve_types::{ErrorCategory, is_valid_time_step};
use delve_units::UnitConfig;
use serde::{Deserialize, Serialize};

use crate::world::MAX_UNITS;

/// Why a configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The file is not valid YAML for this schema.
    #[error("malformed config: {source}")]
    Yaml {
        /// The parser's complaint.
        #[from]
        source: serde_yml::Error,
    },

    /// The values parsed but do not make sense together.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl ConfigError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } => ErrorCategory::InvalidState,
            Self::Yaml { .. } | Self::Invalid { .. } => ErrorCategory::InvalidArgument,
        }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `delve-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World generation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Population parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Tick length and run length.
    #[serde(default)]
    pub time: TimeConfig,

    /// Unit behaviour tunables.
    #[serde(default)]
    pub units: UnitConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file at the given path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        for (axis, size) in [("x", world.size_x), ("y", world.size_y), ("z", world.size_z)] {
            if size == 0 || size > MAX_WORLD_SIZE {
                return Err(invalid(format!(
                    "world.size_{axis} must be in 1..={MAX_WORLD_SIZE}, got {size}"
                )));
            }
        }
        if world.rock_layers >= world.size_z {
            return Err(invalid(format!(
                "world.rock_layers ({}) must leave at least one air layer (size_z {})",
                world.rock_layers, world.size_z
            )));
        }
        if !(0.0..=1.0).contains(&world.tree_density) {
            return Err(invalid(format!(
                "world.tree_density must be in [0, 1], got {}",
                world.tree_density
            )));
        }
        if !(0.0..=1.0).contains(&world.drop_chance) {
            return Err(invalid(format!(
                "world.drop_chance must be in [0, 1], got {}",
                world.drop_chance
            )));
        }
        let max_units = u32::try_from(MAX_UNITS).unwrap_or(u32::MAX);
        if self.population.initial_units > max_units {
            return Err(invalid(format!(
                "population.initial_units must be at most {max_units}, got {}",
                self.population.initial_units
            )));
        }
        if !is_valid_time_step(self.time.tick_seconds) {
            return Err(invalid(format!(
                "time.tick_seconds must be in [0, 0.2), got {}",
                self.time.tick_seconds
            )));
        }
        let units = &self.units;
        for (field, value) in [
            ("fall_speed", units.fall_speed),
            ("attack_duration", units.attack_duration),
            ("work_effort", units.work_effort),
            ("auto_rest_interval", units.auto_rest_interval),
            ("sprint_stamina_interval", units.sprint_stamina_interval),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!(
                    "units.{field} must be finite and positive, got {value}"
                )));
            }
        }
        for (field, value) in [
            ("dodge_chance", units.dodge_chance),
            ("block_chance", units.block_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("units.{field} must be in [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

/// Largest accepted world extent along any axis.
pub const MAX_WORLD_SIZE: u32 = 256;

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// World generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Cubes along x.
    #[serde(default = "default_size_xy")]
    pub size_x: u32,

    /// Cubes along y.
    #[serde(default = "default_size_xy")]
    pub size_y: u32,

    /// Cubes along z.
    #[serde(default = "default_size_z")]
    pub size_z: u32,

    /// Solid rock layers at the bottom of the world.
    #[serde(default = "default_rock_layers")]
    pub rock_layers: u32,

    /// Chance that a surface cube holds a tree.
    #[serde(default = "default_tree_density")]
    pub tree_density: f64,

    /// Number of workshops placed on the surface.
    #[serde(default = "default_workshop_count")]
    pub workshop_count: u32,

    /// Chance that a caved-in cube leaves a boulder or log behind.
    #[serde(default = "default_drop_chance")]
    pub drop_chance: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            size_x: default_size_xy(),
            size_y: default_size_xy(),
            size_z: default_size_z(),
            rock_layers: default_rock_layers(),
            tree_density: default_tree_density(),
            workshop_count: default_workshop_count(),
            drop_chance: default_drop_chance(),
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of units to spawn at simulation start.
    #[serde(default = "default_initial_units")]
    pub initial_units: u32,

    /// Whether spawned units start with autonomous behaviour.
    #[serde(default = "default_true")]
    pub default_behaviour: bool,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_units: default_initial_units(),
            default_behaviour: true,
        }
    }
}

/// Tick length and run length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Simulated seconds per tick, in `[0, 0.2)`.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Number of ticks the engine runs.
    #[serde(default = "default_total_ticks")]
    pub total_ticks: u64,

    /// Log a summary every this many ticks; 0 disables periodic summaries.
    #[serde(default = "default_summary_every")]
    pub summary_every: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            total_ticks: default_total_ticks(),
            summary_every: default_summary_every(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Human,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Delve".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_size_xy() -> u32 {
    20
}

const fn default_size_z() -> u32 {
    10
}

const fn default_rock_layers() -> u32 {
    3
}

const fn default_tree_density() -> f64 {
    0.05
}

const fn default_workshop_count() -> u32 {
    2
}

const fn default_drop_chance() -> f64 {
    delve_world::DEFAULT_DROP_CHANCE
}

const fn default_initial_units() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

const fn default_tick_seconds() -> f64 {
    0.1
}

const fn default_total_ticks() -> u64 {
    3000
}

const fn default_summary_every() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}
