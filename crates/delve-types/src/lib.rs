//! Shared type definitions for the Delve simulation.
//!
//! This crate is the single source of truth for the value types used across
//! the Delve workspace: identifiers, positions, terrain and material kinds,
//! and the error taxonomy every other crate maps its errors onto.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for units, materials, and factions
//! - [`geometry`] -- Continuous [`Position`] vectors and integer [`CubeCoord`]s
//! - [`enums`] -- Terrain, material, and activity enumerations
//! - [`time`] -- The fixed time-step contract shared by every `advance_time`

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use enums::{ActivityKind, ErrorCategory, MaterialKind, TerrainKind};
pub use geometry::{CubeCoord, CubeOffset, Position};
pub use ids::{FactionId, MaterialId, UnitId};
pub use time::{MAX_TIME_STEP, is_valid_time_step};
