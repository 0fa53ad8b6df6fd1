//! Enumeration types for the Delve simulation.
//!
//! Terrain kinds with their wire codes, the two material kinds, the
//! coarse activity tag exposed in snapshots, and the error taxonomy.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The terrain kind of a single cube.
///
/// The integer codes (`0..=3`) are the format used to bootstrap a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open space. Passable.
    #[default]
    Air,
    /// Solid rock. Caves in to a boulder.
    Rock,
    /// Solid tree trunk. Caves in to a log.
    Tree,
    /// A crafting workshop. Passable.
    Workshop,
}

impl TerrainKind {
    /// Decode a bootstrap terrain code.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Air),
            1 => Some(Self::Rock),
            2 => Some(Self::Tree),
            3 => Some(Self::Workshop),
            _ => None,
        }
    }

    /// The bootstrap terrain code of this kind.
    pub const fn code(self) -> i32 {
        match self {
            Self::Air => 0,
            Self::Rock => 1,
            Self::Tree => 2,
            Self::Workshop => 3,
        }
    }

    /// Rock and trees are solid; air and workshops are passable.
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Rock | Self::Tree)
    }

    /// Inverse of [`is_solid`](Self::is_solid).
    pub const fn is_passable(self) -> bool {
        !self.is_solid()
    }
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// A carriable material that appears when solid terrain caves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Left behind by collapsing rock.
    Boulder,
    /// Left behind by a felled tree.
    Log,
}

impl MaterialKind {
    /// The material produced when `terrain` caves in, if any.
    pub const fn from_terrain(terrain: TerrainKind) -> Option<Self> {
        match terrain {
            TerrainKind::Rock => Some(Self::Boulder),
            TerrainKind::Tree => Some(Self::Log),
            TerrainKind::Air | TerrainKind::Workshop => None,
        }
    }
}

impl core::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Boulder => write!(f, "boulder"),
            Self::Log => write!(f, "log"),
        }
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Coarse tag of what a unit is doing, without per-state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Nothing in progress.
    Idle,
    /// Walking or sprinting toward a destination.
    Moving,
    /// Working at a cube.
    Working,
    /// Recovering hit points and stamina.
    Resting,
    /// Winding up a strike against another unit.
    Attacking,
    /// Falling toward the ground.
    Falling,
}

impl core::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Working => "working",
            Self::Resting => "resting",
            Self::Attacking => "attacking",
            Self::Falling => "falling",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// The category every error in the workspace maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A value passed in was out of range or otherwise unacceptable.
    InvalidArgument,
    /// The receiver is in a state that does not allow the operation.
    InvalidState,
    /// The operation targeted an entity that no longer exists.
    Terminated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_codes_roundtrip() {
        for kind in [TerrainKind::Air, TerrainKind::Rock, TerrainKind::Tree, TerrainKind::Workshop] {
            assert_eq!(TerrainKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(TerrainKind::from_code(4), None);
        assert_eq!(TerrainKind::from_code(-1), None);
    }

    #[test]
    fn only_rock_and_tree_are_solid() {
        assert!(TerrainKind::Rock.is_solid());
        assert!(TerrainKind::Tree.is_solid());
        assert!(TerrainKind::Air.is_passable());
        assert!(TerrainKind::Workshop.is_passable());
    }

    #[test]
    fn cave_in_materials() {
        assert_eq!(MaterialKind::from_terrain(TerrainKind::Rock), Some(MaterialKind::Boulder));
        assert_eq!(MaterialKind::from_terrain(TerrainKind::Tree), Some(MaterialKind::Log));
        assert_eq!(MaterialKind::from_terrain(TerrainKind::Air), None);
    }

    #[test]
    fn activity_display_is_lowercase() {
        assert_eq!(ActivityKind::Falling.to_string(), "falling");
    }
}
