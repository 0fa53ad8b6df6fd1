//! The voxel world of the Delve simulation.
//!
//! This crate models the physical terrain: a dense grid of cubes tagged with
//! a terrain kind and an occupant set, the cave-in engine that keeps every
//! solid cube anchored to the world border, the materials those cave-ins
//! leave behind, and the incremental path search units use to route.
//!
//! # Modules
//!
//! - [`connectivity`] -- The [`BorderConnectivity`] oracle seam and a
//!   flood-fill reference implementation.
//! - [`error`] -- Error types for grid and terrain operations.
//! - [`grid`] -- The dense cube store with occupant bookkeeping and
//!   standing-position queries.
//! - [`listener`] -- Terrain change notification callbacks.
//! - [`material`] -- Boulders and logs, their registry, and falling.
//! - [`pathfinding`] -- Lazy, memoized breadth-first [`PathSearch`].
//! - [`terrain`] -- [`Terrain`], owning the grid, the oracle, and the
//!   material registry, with cave-in propagation.
//!
//! [`BorderConnectivity`]: connectivity::BorderConnectivity
//! [`PathSearch`]: pathfinding::PathSearch
//! [`Terrain`]: terrain::Terrain

pub mod connectivity;
pub mod error;
pub mod grid;
pub mod listener;
pub mod material;
pub mod pathfinding;
pub mod terrain;

// Re-export primary types at crate root.
pub use connectivity::{BorderConnectivity, FloodFillConnectivity};
pub use error::WorldError;
pub use grid::{Cube, Dimensions, Grid, Occupant};
pub use listener::{NoopListener, TerrainChangeListener};
pub use material::{MATERIAL_FALL_SPEED, Material, MaterialRegistry};
pub use pathfinding::PathSearch;
pub use terrain::{CaveInReport, DEFAULT_DROP_CHANCE, SpawnedMaterial, Terrain};
