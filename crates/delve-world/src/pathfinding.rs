//! Incremental breadth-first path search.
//!
//! A [`PathSearch`] keeps a distance map from a destination outward over
//! standing positions. Exploration is lazy: each call to
//! [`next_hop`](PathSearch::next_hop) expands the frontier only until the
//! caller's cube has a distance, so the cost of a long route is spread over
//! the hops that walk it. The map is dropped whenever the destination or
//! the terrain changes.

use std::collections::{BTreeMap, VecDeque};

use delve_types::CubeCoord;

use crate::terrain::Terrain;

/// Per-unit memoized search state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSearch {
    destination: Option<CubeCoord>,
    distances: BTreeMap<CubeCoord, u32>,
    frontier: VecDeque<CubeCoord>,
    revision: u64,
}

impl PathSearch {
    /// Create an empty search.
    pub const fn new() -> Self {
        Self {
            destination: None,
            distances: BTreeMap::new(),
            frontier: VecDeque::new(),
            revision: 0,
        }
    }

    /// Forget everything explored so far.
    pub fn reset(&mut self) {
        self.destination = None;
        self.distances.clear();
        self.frontier.clear();
    }

    /// The destination the current map was built for.
    pub const fn destination(&self) -> Option<CubeCoord> {
        self.destination
    }

    /// Number of cubes with a known distance.
    pub fn explored(&self) -> usize {
        self.distances.len()
    }

    /// The neighbour of `from` to step into on the way to `destination`.
    ///
    /// Returns `None` when `from` already is the destination or when the
    /// destination cannot be reached; in the latter case the map is
    /// cleared. Among equally close neighbours the first in lexicographic
    /// offset order wins.
    pub fn next_hop(
        &mut self,
        terrain: &Terrain,
        from: CubeCoord,
        destination: CubeCoord,
    ) -> Option<CubeCoord> {
        if from == destination {
            return None;
        }
        if self.destination != Some(destination) || self.revision != terrain.revision() {
            self.reset();
            self.destination = Some(destination);
            self.revision = terrain.revision();
        }

        if self.distances.is_empty() {
            if !terrain.is_standing_position(destination) {
                self.reset();
                return None;
            }
            self.distances.insert(destination, 0);
            self.frontier.push_back(destination);
        }

        while !self.distances.contains_key(&from) {
            let Some(current) = self.frontier.pop_front() else {
                self.reset();
                return None;
            };
            let next = self
                .distances
                .get(&current)
                .copied()
                .unwrap_or(0)
                .saturating_add(1);
            for neighbor in terrain.standing_neighbors(current) {
                if !self.distances.contains_key(&neighbor) {
                    self.distances.insert(neighbor, next);
                    self.frontier.push_back(neighbor);
                }
            }
        }

        let mut best: Option<(u32, CubeCoord)> = None;
        for neighbor in terrain.standing_neighbors(from) {
            let Some(&distance) = self.distances.get(&neighbor) else {
                continue;
            };
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, neighbor));
            }
        }
        best.map(|(_, coord)| coord)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    /// 6x3x3 world with a rock floor and an optional one-high wall at x=3.
    fn corridor(wall: bool) -> Terrain {
        let mut codes = vec![vec![vec![1, 0, 0]; 3]; 6];
        if wall {
            for column in &mut codes[3] {
                column[1] = 1;
            }
        }
        Terrain::from_codes(&codes).unwrap()
    }

    /// Follow hops from `start` until arrival; returns the path.
    fn walk(search: &mut PathSearch, terrain: &Terrain, start: CubeCoord, goal: CubeCoord) -> Vec<CubeCoord> {
        let mut path = vec![start];
        let mut here = start;
        while here != goal && path.len() < 50 {
            let Some(next) = search.next_hop(terrain, here, goal) else {
                break;
            };
            assert!(here.is_adjacent(next));
            here = next;
            path.push(here);
        }
        path
    }

    #[test]
    fn straight_corridor_takes_shortest_route() {
        let terrain = corridor(false);
        let mut search = PathSearch::new();
        let path = walk(&mut search, &terrain, CubeCoord::new(0, 1, 1), CubeCoord::new(5, 1, 1));
        assert_eq!(path.last(), Some(&CubeCoord::new(5, 1, 1)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn climbs_over_a_wall() {
        let terrain = corridor(true);
        let mut search = PathSearch::new();
        let goal = CubeCoord::new(5, 1, 1);
        let path = walk(&mut search, &terrain, CubeCoord::new(0, 1, 1), goal);
        assert_eq!(path.last(), Some(&goal));
        assert!(path.iter().all(|c| terrain.is_standing_position(*c)));
        assert!(path.iter().any(|c| c.z == 2));
    }

    #[test]
    fn equal_distance_ties_go_to_lowest_offset() {
        let terrain = corridor(false);
        let goal = CubeCoord::new(2, 1, 1);

        let mut search = PathSearch::new();
        let hop = search.next_hop(&terrain, CubeCoord::new(0, 1, 1), goal);
        // Straight ahead and both diagonals are one step from the goal.
        for y in 0..3 {
            assert_eq!(search.distances.get(&CubeCoord::new(1, y, 1)), Some(&1));
        }
        assert_eq!(hop, Some(CubeCoord::new(1, 0, 1)));

        let mut search = PathSearch::new();
        let hop = search.next_hop(&terrain, CubeCoord::new(4, 1, 1), goal);
        assert_eq!(hop, Some(CubeCoord::new(3, 0, 1)));

        // A fresh search over the same terrain picks the same hop.
        let mut again = PathSearch::new();
        assert_eq!(again.next_hop(&terrain, CubeCoord::new(4, 1, 1), goal), hop);
    }

    #[test]
    fn unreachable_destination_clears_the_map() {
        let terrain = corridor(false);
        let mut search = PathSearch::new();
        // Two levels above the floor, nothing to stand on.
        let hop = search.next_hop(&terrain, CubeCoord::new(0, 1, 1), CubeCoord::new(5, 1, 2));
        assert_eq!(hop, None);
        assert_eq!(search.explored(), 0);
        assert_eq!(search.destination(), None);
    }

    #[test]
    fn terrain_change_invalidates_the_map() {
        let mut terrain = corridor(false);
        let mut search = PathSearch::new();
        let goal = CubeCoord::new(5, 1, 1);
        assert!(search.next_hop(&terrain, CubeCoord::new(0, 1, 1), goal).is_some());
        let explored = search.explored();
        assert!(explored > 0);

        let mut rng = SmallRng::seed_from_u64(1);
        terrain.cave_in(CubeCoord::new(5, 1, 0), &mut rng).unwrap();
        // The cached map is rebuilt from scratch for the new terrain.
        assert!(search.next_hop(&terrain, CubeCoord::new(0, 1, 1), goal).is_some());
        assert_eq!(search.destination(), Some(goal));
    }

    #[test]
    fn at_destination_returns_none() {
        let terrain = corridor(false);
        let mut search = PathSearch::new();
        let here = CubeCoord::new(2, 1, 1);
        assert_eq!(search.next_hop(&terrain, here, here), None);
    }
}
