//! World clock for the Delve simulation.
//!
//! The clock counts ticks and the simulated seconds they covered. Ticks
//! have variable length: every [`WorldClock::advance`] call carries its own
//! time step, which must satisfy the same `[0, 0.2)` contract as unit
//! time advancement.

use delve_types::{ErrorCategory, is_valid_time_step};

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The time step was outside `[0, 0.2)`.
    #[error("time step {dt} is outside [0, 0.2)")]
    InvalidTimeStep {
        /// The rejected step.
        dt: f64,
    },
}

impl ClockError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::TickOverflow => ErrorCategory::InvalidState,
            Self::InvalidTimeStep { .. } => ErrorCategory::InvalidArgument,
        }
    }
}

/// Tick counter plus elapsed simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldClock {
    /// Number of completed ticks.
    tick: u64,

    /// Simulated seconds covered by those ticks.
    elapsed: f64,
}

impl WorldClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
        }
    }

    /// Restore a clock from saved values.
    pub const fn from_parts(tick: u64, elapsed: f64) -> Self {
        Self { tick, elapsed }
    }

    /// Check `dt` without advancing.
    pub fn check_step(dt: f64) -> Result<(), ClockError> {
        if is_valid_time_step(dt) {
            Ok(())
        } else {
            Err(ClockError::InvalidTimeStep { dt })
        }
    }

    /// Advance by one tick of `dt` seconds. Returns the new tick number.
    pub fn advance(&mut self, dt: f64) -> Result<u64, ClockError> {
        Self::check_step(dt)?;
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.elapsed += dt;
        Ok(self.tick)
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
