//! Units of the Delve simulation and their behaviour.
//!
//! A [`Unit`] is an autonomous agent living in the voxel terrain. Its
//! behaviour is a continuous-time state machine advanced in small fixed
//! steps: each call to [`Unit::advance_time`] consumes the step through a
//! loop of sub-steps, so an activity that finishes early hands its leftover
//! time to whatever comes next in the same tick.
//!
//! # Modules
//!
//! - [`activity`] -- The [`Activity`] state with per-state timers.
//! - [`attributes`] -- Strength, agility, toughness, and weight with their
//!   clamping rules and derived maxima.
//! - [`behaviour`] -- `advance_time` and the dispatch loop: falling,
//!   movement, work, rest, and autonomous behaviour.
//! - [`combat`] -- Attack initiation and defence resolution.
//! - [`config`] -- [`UnitConfig`] tunables.
//! - [`error`] -- [`UnitError`].
//! - [`leveling`] -- Experience and level-ups.
//! - [`unit`] -- The [`Unit`] type, construction, and player commands.
//! - [`vitals`] -- Continuous hit points and stamina with rounded display.
//! - [`work`] -- What finishing a job does to the world.
//!
//! [`Activity`]: activity::Activity
//! [`Unit`]: unit::Unit
//! [`UnitConfig`]: config::UnitConfig
//! [`UnitError`]: error::UnitError

pub mod activity;
pub mod attributes;
pub mod behaviour;
pub mod combat;
pub mod config;
pub mod error;
pub mod leveling;
pub mod unit;
pub mod vitals;
pub mod work;

// Re-export primary types at crate root.
pub use activity::Activity;
pub use attributes::{Attributes, MAX_ATTRIBUTE, MIN_ATTRIBUTE};
pub use behaviour::{Strike, TickEvents};
pub use combat::{CombatProfile, DefenceOutcome};
pub use config::UnitConfig;
pub use error::UnitError;
pub use unit::Unit;
pub use vitals::Gauge;
pub use work::WorkOutcome;
