//! The dense cube store.
//!
//! Cubes live in a flat `Vec` indexed `x`-major, then `y`, then `z`. Every
//! cube carries its terrain kind and the set of occupants (units and
//! materials) whose position currently floors to that cube.

use std::collections::BTreeSet;

use delve_types::{CubeCoord, CubeOffset, MaterialId, TerrainKind, UnitId};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Something that occupies a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// A unit standing, walking, or falling through the cube.
    Unit(UnitId),
    /// A material lying in (or falling through) the cube.
    Material(MaterialId),
}

/// One voxel of the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cube {
    /// Where this cube sits in the grid.
    pub coord: CubeCoord,
    /// The terrain that fills it.
    pub kind: TerrainKind,
    /// Units and materials currently inside it.
    pub occupants: BTreeSet<Occupant>,
}

/// Grid extent along each axis, in cubes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of cubes along x.
    pub x: i32,
    /// Number of cubes along y.
    pub y: i32,
    /// Number of cubes along z.
    pub z: i32,
}

impl Dimensions {
    /// Whether `coord` lies inside `[0, dim)` on every axis.
    pub const fn contains(self, coord: CubeCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && coord.x < self.x
            && coord.y < self.y
            && coord.z < self.z
    }

    /// Whether `coord` lies on one of the six outer faces of the grid.
    pub const fn is_border(self, coord: CubeCoord) -> bool {
        self.contains(coord)
            && (coord.x == 0
                || coord.y == 0
                || coord.z == 0
                || coord.x == self.x.saturating_sub(1)
                || coord.y == self.y.saturating_sub(1)
                || coord.z == self.z.saturating_sub(1))
    }

    /// Flat index of `coord`, or `None` outside the grid.
    #[allow(clippy::cast_sign_loss, clippy::arithmetic_side_effects)]
    pub const fn index(self, coord: CubeCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        // Components are non-negative and below their dimension, so idx < volume().
        let idx = (coord.x as usize * self.y as usize + coord.y as usize) * self.z as usize
            + coord.z as usize;
        Some(idx)
    }

    /// Total number of cubes.
    #[allow(clippy::cast_sign_loss)]
    pub const fn volume(self) -> usize {
        (self.x as usize)
            .saturating_mul(self.y as usize)
            .saturating_mul(self.z as usize)
    }

    /// Every coordinate in the grid, in flat-index order.
    pub fn coords(self) -> impl Iterator<Item = CubeCoord> {
        (0..self.x).flat_map(move |x| {
            (0..self.y).flat_map(move |y| (0..self.z).map(move |z| CubeCoord::new(x, y, z)))
        })
    }
}

/// Converts a bootstrap axis length to a grid dimension.
fn axis_len(axis: &'static str, size: usize) -> Result<i32, WorldError> {
    if size == 0 {
        return Err(WorldError::EmptyTerrain);
    }
    i32::try_from(size).map_err(|_err| WorldError::DimensionTooLarge { axis, size })
}

/// A dense 3-D array of [`Cube`]s with fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dims: Dimensions,
    cubes: Vec<Cube>,
}

impl Grid {
    /// Build a grid filled with a single terrain kind.
    pub fn filled(dims: Dimensions, kind: TerrainKind) -> Result<Self, WorldError> {
        if dims.x <= 0 || dims.y <= 0 || dims.z <= 0 {
            return Err(WorldError::EmptyTerrain);
        }
        let cubes = dims
            .coords()
            .map(|coord| Cube {
                coord,
                kind,
                occupants: BTreeSet::new(),
            })
            .collect();
        Ok(Self { dims, cubes })
    }

    /// Build a grid from nested terrain codes indexed `[x][y][z]`.
    ///
    /// Codes are `0` air, `1` rock, `2` tree, `3` workshop.
    pub fn from_codes(codes: &[Vec<Vec<i32>>]) -> Result<Self, WorldError> {
        let size_x = codes.len();
        let size_y = codes.first().map_or(0, Vec::len);
        let size_z = codes
            .first()
            .and_then(|plane| plane.first())
            .map_or(0, Vec::len);

        let dims = Dimensions {
            x: axis_len("x", size_x)?,
            y: axis_len("y", size_y)?,
            z: axis_len("z", size_z)?,
        };

        let mut cubes = Vec::with_capacity(dims.volume());
        for (x, plane) in (0..dims.x).zip(codes) {
            if plane.len() != size_y {
                return Err(WorldError::RaggedTerrain {
                    axis: "y",
                    expected: size_y,
                    found: plane.len(),
                });
            }
            for (y, column) in (0..dims.y).zip(plane) {
                if column.len() != size_z {
                    return Err(WorldError::RaggedTerrain {
                        axis: "z",
                        expected: size_z,
                        found: column.len(),
                    });
                }
                for (z, &code) in (0..dims.z).zip(column) {
                    let coord = CubeCoord::new(x, y, z);
                    let kind = TerrainKind::from_code(code)
                        .ok_or(WorldError::UnknownTerrainCode { code, coord })?;
                    cubes.push(Cube {
                        coord,
                        kind,
                        occupants: BTreeSet::new(),
                    });
                }
            }
        }
        Ok(Self { dims, cubes })
    }

    /// The grid extent.
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Whether `coord` lies inside the grid.
    pub const fn contains(&self, coord: CubeCoord) -> bool {
        self.dims.contains(coord)
    }

    /// The cube at `coord`.
    pub fn cube(&self, coord: CubeCoord) -> Option<&Cube> {
        self.dims.index(coord).and_then(|i| self.cubes.get(i))
    }

    fn cube_mut(&mut self, coord: CubeCoord) -> Result<&mut Cube, WorldError> {
        self.dims
            .index(coord)
            .and_then(|i| self.cubes.get_mut(i))
            .ok_or(WorldError::OutOfBounds { coord })
    }

    /// Iterate over every cube in flat-index order.
    pub fn cubes(&self) -> impl Iterator<Item = &Cube> {
        self.cubes.iter()
    }

    /// The terrain kind at `coord`.
    pub fn kind(&self, coord: CubeCoord) -> Option<TerrainKind> {
        self.cube(coord).map(|c| c.kind)
    }

    /// Whether `coord` is inside the grid and solid.
    pub fn is_solid(&self, coord: CubeCoord) -> bool {
        self.kind(coord).is_some_and(TerrainKind::is_solid)
    }

    /// Whether `coord` is inside the grid and passable.
    pub fn is_passable(&self, coord: CubeCoord) -> bool {
        self.kind(coord).is_some_and(TerrainKind::is_passable)
    }

    /// Whether any of the 26 neighbours of `coord` is solid.
    pub fn has_solid_neighbor(&self, coord: CubeCoord) -> bool {
        self.neighbors(coord).any(|n| self.is_solid(n))
    }

    /// Whether an agent can stand in `coord`.
    ///
    /// The cube must be passable and either lie on the ground layer or touch
    /// at least one solid cube.
    pub fn is_standing_position(&self, coord: CubeCoord) -> bool {
        self.is_passable(coord) && (coord.z == 0 || self.has_solid_neighbor(coord))
    }

    /// In-bounds 26-neighbours of `coord`, in lexicographic offset order.
    pub fn neighbors(&self, coord: CubeCoord) -> impl Iterator<Item = CubeCoord> + '_ {
        CubeOffset::ALL_26
            .into_iter()
            .filter_map(move |o| coord.offset(o))
            .filter(|n| self.contains(*n))
    }

    /// In-bounds face-sharing neighbours of `coord`.
    pub fn face_neighbors(&self, coord: CubeCoord) -> impl Iterator<Item = CubeCoord> + '_ {
        CubeOffset::FACE_6
            .into_iter()
            .filter_map(move |o| coord.offset(o))
            .filter(|n| self.contains(*n))
    }

    /// Neighbours of `coord` that are standing positions.
    pub fn standing_neighbors(&self, coord: CubeCoord) -> Vec<CubeCoord> {
        self.neighbors(coord)
            .filter(|n| self.is_standing_position(*n))
            .collect()
    }

    /// Every standing position in the grid.
    pub fn standing_positions(&self) -> Vec<CubeCoord> {
        self.dims
            .coords()
            .filter(|c| self.is_standing_position(*c))
            .collect()
    }

    /// The occupants of the cube at `coord`.
    pub fn occupants(&self, coord: CubeCoord) -> Option<&BTreeSet<Occupant>> {
        self.cube(coord).map(|c| &c.occupants)
    }

    /// Replace the kind at `coord`, returning the previous kind.
    ///
    /// Occupants are left in place.
    pub(crate) fn replace_kind(
        &mut self,
        coord: CubeCoord,
        kind: TerrainKind,
    ) -> Result<TerrainKind, WorldError> {
        let cube = self.cube_mut(coord)?;
        Ok(std::mem::replace(&mut cube.kind, kind))
    }

    /// Add `occupant` to the cube at `coord`.
    pub fn insert_occupant(
        &mut self,
        coord: CubeCoord,
        occupant: Occupant,
    ) -> Result<(), WorldError> {
        self.cube_mut(coord)?.occupants.insert(occupant);
        Ok(())
    }

    /// Remove `occupant` from the cube at `coord`; returns whether it was present.
    pub fn remove_occupant(
        &mut self,
        coord: CubeCoord,
        occupant: Occupant,
    ) -> Result<bool, WorldError> {
        Ok(self.cube_mut(coord)?.occupants.remove(&occupant))
    }
}
