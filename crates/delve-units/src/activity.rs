//! What a unit is doing right now.

use delve_types::{ActivityKind, CubeCoord, UnitId};
use serde::{Deserialize, Serialize};

/// The unit's current activity, with the timers that belong to it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Activity {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Following a route toward the destination.
    Moving,
    /// Working at `target` until `remaining` reaches zero.
    Working {
        /// The cube being worked on.
        target: CubeCoord,
        /// Seconds left.
        remaining: f64,
    },
    /// Recovering hit points, then stamina.
    Resting,
    /// Winding up a strike against `target`.
    Attacking {
        /// The unit under attack.
        target: UnitId,
        /// Seconds until the strike lands.
        remaining: f64,
    },
    /// Dropping toward the cube below.
    Falling,
}

impl Activity {
    /// The data-free tag of this activity.
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Idle => ActivityKind::Idle,
            Self::Moving => ActivityKind::Moving,
            Self::Working { .. } => ActivityKind::Working,
            Self::Resting => ActivityKind::Resting,
            Self::Attacking { .. } => ActivityKind::Attacking,
            Self::Falling => ActivityKind::Falling,
        }
    }

    /// Whether the unit is winding up an attack.
    pub const fn is_attacking(&self) -> bool {
        matches!(self, Self::Attacking { .. })
    }

    /// Whether the unit is falling.
    pub const fn is_falling(&self) -> bool {
        matches!(self, Self::Falling)
    }
}
