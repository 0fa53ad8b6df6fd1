//! Continuous positions and integer cube coordinates.
//!
//! A [`Position`] is a point in world space measured in metres; each cube
//! of the grid is one metre wide, so flooring a position gives the
//! [`CubeCoord`] of the cube that contains it.

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing continuous positions.
pub const POSITION_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A continuous 3-vector in world space.
///
/// Also used for velocities, where the components are metres per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Component along the x axis.
    pub x: f64,
    /// Component along the y axis.
    pub y: f64,
    /// Component along the z axis (up).
    pub z: f64,
}

impl Position {
    /// The origin / zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a position from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The cube containing this position (component-wise floor).
    #[allow(clippy::cast_possible_truncation)]
    pub fn cube(self) -> CubeCoord {
        CubeCoord::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// Multiply every component by `factor`.
    pub const fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean length of the vector.
    pub fn length(self) -> f64 {
        self.z.mul_add(self.z, self.x.mul_add(self.x, self.y * self.y)).sqrt()
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Whether `other` lies within [`POSITION_EPSILON`] of this position.
    pub fn approx_eq(self, other: Self) -> bool {
        self.distance(other) <= POSITION_EPSILON
    }

    /// Whether every component is finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// CubeCoord
// ---------------------------------------------------------------------------

/// Integer coordinate of a single cube in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CubeCoord {
    /// Cube index along x.
    pub x: i32,
    /// Cube index along y.
    pub y: i32,
    /// Cube index along z.
    pub z: i32,
}

impl CubeCoord {
    /// Create a coordinate from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The centre point of this cube.
    pub fn center(self) -> Position {
        Position::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }

    /// The coordinate shifted by `offset`, or `None` on overflow.
    pub const fn offset(self, offset: CubeOffset) -> Option<Self> {
        let Some(x) = self.x.checked_add(offset.dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add(offset.dy) else {
            return None;
        };
        let Some(z) = self.z.checked_add(offset.dz) else {
            return None;
        };
        Some(Self::new(x, y, z))
    }

    /// Offset from `self` to `other`, if every component differs by at most 1.
    pub fn offset_to(self, other: Self) -> Option<CubeOffset> {
        let dx = other.x.checked_sub(self.x)?;
        let dy = other.y.checked_sub(self.y)?;
        let dz = other.z.checked_sub(self.z)?;
        if dx.abs() <= 1 && dy.abs() <= 1 && dz.abs() <= 1 {
            Some(CubeOffset::new(dx, dy, dz))
        } else {
            None
        }
    }

    /// Whether `other` is one of the 26 neighbours of this cube.
    ///
    /// A cube is not adjacent to itself.
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.offset_to(other).is_some()
    }

    /// Whether `other` is this cube or one of its 26 neighbours.
    pub fn is_same_or_adjacent(self, other: Self) -> bool {
        self.offset_to(other).is_some()
    }
}

impl core::fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// CubeOffset
// ---------------------------------------------------------------------------

/// A step between two cubes, each component in `-1..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CubeOffset {
    /// Step along x.
    pub dx: i32,
    /// Step along y.
    pub dy: i32,
    /// Step along z.
    pub dz: i32,
}

/// Builds the 26-neighbourhood in lexicographic `(dx, dy, dz)` order.
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
const fn all_neighbour_offsets() -> [CubeOffset; 26] {
    let mut out = [CubeOffset::new(0, 0, 0); 26];
    let mut i = 0;
    let mut dx = -1;
    while dx <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dz = -1;
            while dz <= 1 {
                if dx != 0 || dy != 0 || dz != 0 {
                    out[i] = CubeOffset::new(dx, dy, dz);
                    i += 1;
                }
                dz += 1;
            }
            dy += 1;
        }
        dx += 1;
    }
    out
}

impl CubeOffset {
    /// All 26 neighbour offsets, ordered lexicographically by `(dx, dy, dz)`.
    pub const ALL_26: [Self; 26] = all_neighbour_offsets();

    /// The 6 face-sharing neighbour offsets.
    pub const FACE_6: [Self; 6] = [
        Self::new(-1, 0, 0),
        Self::new(1, 0, 0),
        Self::new(0, -1, 0),
        Self::new(0, 1, 0),
        Self::new(0, 0, -1),
        Self::new(0, 0, 1),
    ];

    /// Create an offset from its components.
    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }

    /// Whether every component lies in `-1..=1`.
    pub const fn is_unit_step(self) -> bool {
        self.dx >= -1 && self.dx <= 1 && self.dy >= -1 && self.dy <= 1 && self.dz >= -1 && self.dz <= 1
    }

    /// Whether this is the zero offset.
    pub const fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0 && self.dz == 0
    }
}
