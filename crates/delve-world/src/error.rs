//! Error types for the `delve-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use delve_types::{CubeCoord, ErrorCategory, MaterialId, TerrainKind};

/// Errors that can occur during grid and terrain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The coordinate lies outside the grid.
    #[error("cube {coord} is outside the world")]
    OutOfBounds {
        /// The offending coordinate.
        coord: CubeCoord,
    },

    /// A cave-in was requested on a cube that is not solid.
    #[error("cube {coord} is {kind:?}, not solid")]
    NotSolid {
        /// The targeted cube.
        coord: CubeCoord,
        /// Its current terrain kind.
        kind: TerrainKind,
    },

    /// Passable terrain cannot be turned solid once the world exists.
    #[error("cube {coord} cannot become {kind:?}")]
    SolidPlacement {
        /// The targeted cube.
        coord: CubeCoord,
        /// The requested solid kind.
        kind: TerrainKind,
    },

    /// A bootstrap terrain code was not one of `0..=3`.
    #[error("unknown terrain code {code} at {coord}")]
    UnknownTerrainCode {
        /// The unrecognised code.
        code: i32,
        /// Where it was found.
        coord: CubeCoord,
    },

    /// The bootstrap terrain array has a zero-length axis.
    #[error("terrain array is empty")]
    EmptyTerrain,

    /// The bootstrap terrain array is not a rectangular box.
    #[error("terrain array is ragged along {axis}: expected {expected}, found {found}")]
    RaggedTerrain {
        /// The axis whose length varies.
        axis: &'static str,
        /// Length of the first row along that axis.
        expected: usize,
        /// Length of a mismatching row.
        found: usize,
    },

    /// A grid dimension does not fit the coordinate type.
    #[error("terrain dimension {size} along {axis} is too large")]
    DimensionTooLarge {
        /// The axis that overflowed.
        axis: &'static str,
        /// The requested size.
        size: usize,
    },

    /// The material is not registered in the world.
    #[error("material not found: {0}")]
    MaterialNotFound(MaterialId),

    /// A material weight outside `10..=50`.
    #[error("material weight {0} is outside 10..=50")]
    MaterialWeight(u32),
}

impl WorldError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotSolid { .. } => ErrorCategory::InvalidState,
            Self::MaterialNotFound(_) => ErrorCategory::Terminated,
            Self::OutOfBounds { .. }
            | Self::SolidPlacement { .. }
            | Self::UnknownTerrainCode { .. }
            | Self::EmptyTerrain
            | Self::RaggedTerrain { .. }
            | Self::DimensionTooLarge { .. }
            | Self::MaterialWeight(_) => ErrorCategory::InvalidArgument,
        }
    }
}
