//! World driver, factions, clock, and configuration for the Delve simulation.
//!
//! This crate owns the [`World`]: the terrain, every living unit, the
//! faction registry, and the clock. One call to [`World::advance_time`]
//! advances each unit in turn, resolves the strikes whose wind-up ended,
//! removes the dead, and lets loose materials fall.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and elapsed simulated seconds.
//! - [`config`] -- Configuration loading from `delve-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`CoreError`].
//! - [`faction`] -- Faction membership and capacity rules.
//! - [`snapshot`] -- Serializable tick summaries and world snapshots.
//! - [`world`] -- The [`World`] driver.
//!
//! [`CoreError`]: error::CoreError
//! [`World`]: world::World
//! [`World::advance_time`]: world::World::advance_time

pub mod clock;
pub mod config;
pub mod error;
pub mod faction;
pub mod snapshot;
pub mod world;

pub use clock::{ClockError, WorldClock};
pub use config::{ConfigError, SimulationConfig};
pub use error::CoreError;
pub use faction::{FactionRegistry, MAX_FACTIONS, MAX_UNITS_PER_FACTION};
pub use snapshot::{MaterialSummary, StrikeReport, TickSummary, UnitSummary, WorldSnapshot};
pub use world::{MAX_UNITS, World};
