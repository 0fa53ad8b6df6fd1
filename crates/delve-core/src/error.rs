//! Error types for the `delve-core` crate.

use delve_types::{ErrorCategory, FactionId, UnitId};
use delve_units::UnitError;
use delve_world::WorldError;

use crate::clock::ClockError;

/// Errors returned by the world driver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// The world already holds the maximum number of units.
    #[error("world is full: at most {max} units")]
    UnitLimit {
        /// The cap.
        max: usize,
    },

    /// The faction already holds the maximum number of units.
    #[error("faction {faction} is full: at most {max} units")]
    FactionFull {
        /// The full faction.
        faction: FactionId,
        /// The cap.
        max: usize,
    },

    /// The world already holds the maximum number of factions.
    #[error("at most {max} factions per world")]
    FactionLimit {
        /// The cap.
        max: usize,
    },

    /// No faction with this id exists.
    #[error("faction {0} not found")]
    FactionNotFound(FactionId),

    /// No living unit with this id exists.
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    /// The unit is already part of the world.
    #[error("unit {0} is already in the world")]
    DuplicateUnit(UnitId),

    /// The world has no cube a unit could stand in.
    #[error("no standing position available")]
    NoStandingPosition,

    /// A unit operation failed.
    #[error("unit error: {source}")]
    Unit {
        /// The underlying unit error.
        #[from]
        source: UnitError,
    },

    /// A terrain operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl CoreError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnitLimit { .. }
            | Self::FactionFull { .. }
            | Self::FactionLimit { .. }
            | Self::NoStandingPosition => ErrorCategory::InvalidState,
            Self::FactionNotFound(_) | Self::UnitNotFound(_) | Self::DuplicateUnit(_) => {
                ErrorCategory::InvalidArgument
            }
            Self::Unit { source } => source.category(),
            Self::World { source } => source.category(),
            Self::Clock { source } => source.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use delve_types::CubeCoord;

    use super::*;

    #[test]
    fn categories_follow_the_wrapped_error() {
        let dead = CoreError::from(UnitError::Terminated { unit: UnitId::new() });
        assert_eq!(dead.category(), ErrorCategory::Terminated);
        let outside = CoreError::from(WorldError::OutOfBounds {
            coord: CubeCoord::new(-1, 0, 0),
        });
        assert_eq!(outside.category(), ErrorCategory::InvalidArgument);
        assert_eq!(
            CoreError::UnitLimit { max: 100 }.category(),
            ErrorCategory::InvalidState
        );
    }
}
