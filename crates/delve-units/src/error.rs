//! Error types for the `delve-units` crate.

use delve_types::{ActivityKind, CubeCoord, CubeOffset, ErrorCategory, FactionId, UnitId};
use delve_world::WorldError;

/// Errors returned by unit construction, commands, and time advancement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// The time step was outside `[0, 0.2)`.
    #[error("time step {dt} is outside [0, 0.2)")]
    InvalidTimeStep {
        /// The rejected step.
        dt: f64,
    },

    /// An attribute passed to a constructor was outside `[1, 200]`.
    #[error("{attribute} {value} is outside [1, 200]")]
    AttributeOutOfRange {
        /// Which attribute.
        attribute: &'static str,
        /// The rejected value.
        value: u32,
    },

    /// The name breaks the naming rules.
    #[error("invalid unit name {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A step offset had a component outside `-1..=1`.
    #[error("offset {offset:?} is not a single step")]
    InvalidOffset {
        /// The rejected offset.
        offset: CubeOffset,
    },

    /// The target cube is neither the unit's own cube nor adjacent to it.
    #[error("cube {to} is not adjacent to {from}")]
    NotAdjacent {
        /// The unit's cube.
        from: CubeCoord,
        /// The requested cube.
        to: CubeCoord,
    },

    /// Attacker and target belong to the same faction.
    #[error("units share faction {faction}")]
    SameFaction {
        /// The shared faction.
        faction: FactionId,
    },

    /// A unit tried to attack itself.
    #[error("unit {unit} cannot target itself")]
    SelfTarget {
        /// The unit.
        unit: UnitId,
    },

    /// The cube is not somewhere a unit can stand.
    #[error("cube {coord} is not a standing position")]
    NotStandingPosition {
        /// The rejected cube.
        coord: CubeCoord,
    },

    /// The unit is busy with something that forbids the request.
    #[error("cannot {action} while {activity}")]
    InvalidState {
        /// What the unit is doing.
        activity: ActivityKind,
        /// What was requested.
        action: &'static str,
    },

    /// Sprinting needs stamina.
    #[error("cannot sprint without stamina")]
    NoStamina,

    /// The unit has been terminated.
    #[error("unit {unit} is terminated")]
    Terminated {
        /// The dead unit.
        unit: UnitId,
    },

    /// The unit is not part of a world.
    #[error("unit {unit} is not attached to a world")]
    Detached {
        /// The detached unit.
        unit: UnitId,
    },

    /// The unit is already part of a world.
    #[error("unit {unit} is already attached to a world")]
    AlreadyAttached {
        /// The attached unit.
        unit: UnitId,
    },

    /// A terrain operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

impl UnitError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTimeStep { .. }
            | Self::AttributeOutOfRange { .. }
            | Self::InvalidName { .. }
            | Self::InvalidOffset { .. }
            | Self::NotAdjacent { .. }
            | Self::SameFaction { .. }
            | Self::SelfTarget { .. }
            | Self::NotStandingPosition { .. } => ErrorCategory::InvalidArgument,
            Self::InvalidState { .. }
            | Self::NoStamina
            | Self::Detached { .. }
            | Self::AlreadyAttached { .. } => ErrorCategory::InvalidState,
            Self::Terminated { .. } => ErrorCategory::Terminated,
            Self::World { source } => source.category(),
        }
    }
}
