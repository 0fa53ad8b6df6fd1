//! The border-connectivity oracle.
//!
//! Terrain stays physically plausible only while every solid cube is joined
//! to the outer faces of the world through a chain of face-sharing solid
//! cubes. [`BorderConnectivity`] is the question the cave-in engine asks
//! after every removal; [`FloodFillConnectivity`] answers it by
//! breadth-first search from the solid border cells.

use std::collections::VecDeque;

use delve_types::{CubeCoord, CubeOffset};

use crate::grid::{Dimensions, Grid};

/// Answers whether a solid cube is still anchored to the world border.
pub trait BorderConnectivity: core::fmt::Debug {
    /// Whether `coord` is solid and reachable from a solid border cube
    /// through face-sharing solid cubes.
    fn is_solid_connected_to_border(&self, coord: CubeCoord) -> bool;

    /// Record that `coord` is no longer solid.
    fn mark_passable(&mut self, coord: CubeCoord);
}

/// Reference oracle that recomputes a full flood fill after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodFillConnectivity {
    dims: Dimensions,
    solid: Vec<bool>,
    connected: Vec<bool>,
}

impl FloodFillConnectivity {
    /// Build the oracle from the current solidity of `grid`.
    pub fn from_grid(grid: &Grid) -> Self {
        let solid = grid.cubes().map(|c| c.kind.is_solid()).collect::<Vec<_>>();
        let mut oracle = Self {
            dims: grid.dimensions(),
            connected: vec![false; solid.len()],
            solid,
        };
        oracle.recompute();
        oracle
    }

    fn is_solid_at(&self, coord: CubeCoord) -> bool {
        self.dims
            .index(coord)
            .and_then(|i| self.solid.get(i).copied())
            .unwrap_or(false)
    }

    /// Re-run the flood fill from every solid border cube.
    fn recompute(&mut self) {
        self.connected.iter_mut().for_each(|c| *c = false);

        let mut queue = VecDeque::new();
        for coord in self.dims.coords() {
            if !self.dims.is_border(coord) || !self.is_solid_at(coord) {
                continue;
            }
            if let Some(slot) = self.dims.index(coord).and_then(|i| self.connected.get_mut(i)) {
                *slot = true;
                queue.push_back(coord);
            }
        }

        while let Some(current) = queue.pop_front() {
            for offset in CubeOffset::FACE_6 {
                let Some(next) = current.offset(offset) else {
                    continue;
                };
                if !self.is_solid_at(next) {
                    continue;
                }
                let Some(slot) = self.dims.index(next).and_then(|i| self.connected.get_mut(i)) else {
                    continue;
                };
                if !*slot {
                    *slot = true;
                    queue.push_back(next);
                }
            }
        }
    }
}

impl BorderConnectivity for FloodFillConnectivity {
    fn is_solid_connected_to_border(&self, coord: CubeCoord) -> bool {
        self.dims
            .index(coord)
            .and_then(|i| self.connected.get(i).copied())
            .unwrap_or(false)
    }

    fn mark_passable(&mut self, coord: CubeCoord) {
        let Some(slot) = self.dims.index(coord).and_then(|i| self.solid.get_mut(i)) else {
            return;
        };
        if *slot {
            *slot = false;
            self.recompute();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    /// A 5x5x5 air box with a rock pillar on the floor and a floating rock.
    fn pillar_world() -> Grid {
        let mut codes = vec![vec![vec![0; 5]; 5]; 5];
        codes[2][2][0] = 1;
        codes[2][2][1] = 1;
        codes[2][2][2] = 1;
        // Floating, not touching anything.
        codes[1][1][3] = 1;
        Grid::from_codes(&codes).unwrap()
    }

    #[test]
    fn pillar_is_anchored_and_floater_is_not() {
        let oracle = FloodFillConnectivity::from_grid(&pillar_world());
        assert!(oracle.is_solid_connected_to_border(CubeCoord::new(2, 2, 2)));
        assert!(!oracle.is_solid_connected_to_border(CubeCoord::new(1, 1, 3)));
    }

    #[test]
    fn passable_cells_are_never_connected() {
        let oracle = FloodFillConnectivity::from_grid(&pillar_world());
        assert!(!oracle.is_solid_connected_to_border(CubeCoord::new(0, 0, 0)));
        assert!(!oracle.is_solid_connected_to_border(CubeCoord::new(9, 9, 9)));
    }

    #[test]
    fn removing_the_base_disconnects_the_pillar() {
        let mut oracle = FloodFillConnectivity::from_grid(&pillar_world());
        oracle.mark_passable(CubeCoord::new(2, 2, 0));
        assert!(!oracle.is_solid_connected_to_border(CubeCoord::new(2, 2, 1)));
        assert!(!oracle.is_solid_connected_to_border(CubeCoord::new(2, 2, 2)));
    }
}
