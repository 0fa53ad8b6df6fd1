//! Deterministic layered terrain.
//!
//! The bottom `rock_layers` levels are solid rock. On the first level above
//! the rock each column grows a tree with probability `tree_density`, and up
//! to `workshop_count` of the remaining columns get a workshop. Everything
//! higher up is air. The same [`WorldConfig`] always yields the same grid.

use std::collections::BTreeMap;

use delve_core::config::WorldConfig;
use delve_types::TerrainKind;
use delve_world::Grid;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::EngineError;

/// Surface column `(x, y)`.
type Column = (u32, u32);

/// Build the grid described by `config`, seeded from `config.seed`.
pub fn generate(config: &WorldConfig) -> Result<Grid, EngineError> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    generate_with(config, &mut rng)
}

/// Build the grid described by `config` drawing from `rng`.
pub fn generate_with<R: Rng + ?Sized>(
    config: &WorldConfig,
    rng: &mut R,
) -> Result<Grid, EngineError> {
    let surface = surface_features(config, rng);
    let codes: Vec<Vec<Vec<i32>>> = (0..config.size_x)
        .map(|x| {
            (0..config.size_y)
                .map(|y| {
                    (0..config.size_z)
                        .map(|z| kind_at(config, &surface, (x, y), z).code())
                        .collect()
                })
                .collect()
        })
        .collect();
    let grid = Grid::from_codes(&codes)?;

    let trees = surface.values().filter(|k| **k == TerrainKind::Tree).count();
    debug!(
        size_x = config.size_x,
        size_y = config.size_y,
        size_z = config.size_z,
        rock_layers = config.rock_layers,
        trees,
        workshops = surface.len().saturating_sub(trees),
        "generated terrain"
    );
    Ok(grid)
}

/// Trees and workshops on the surface level, keyed by column.
fn surface_features<R: Rng + ?Sized>(
    config: &WorldConfig,
    rng: &mut R,
) -> BTreeMap<Column, TerrainKind> {
    let mut features = BTreeMap::new();
    let mut open = Vec::new();
    for x in 0..config.size_x {
        for y in 0..config.size_y {
            if rng.random::<f64>() < config.tree_density {
                features.insert((x, y), TerrainKind::Tree);
            } else {
                open.push((x, y));
            }
        }
    }

    open.shuffle(rng);
    let workshops = usize::try_from(config.workshop_count).unwrap_or(usize::MAX);
    for column in open.into_iter().take(workshops) {
        features.insert(column, TerrainKind::Workshop);
    }
    features
}

fn kind_at(
    config: &WorldConfig,
    surface: &BTreeMap<Column, TerrainKind>,
    column: Column,
    z: u32,
) -> TerrainKind {
    if z < config.rock_layers {
        TerrainKind::Rock
    } else if z == config.rock_layers {
        surface.get(&column).copied().unwrap_or(TerrainKind::Air)
    } else {
        TerrainKind::Air
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use delve_world::Terrain;

    use super::*;

    fn small() -> WorldConfig {
        WorldConfig {
            size_x: 8,
            size_y: 6,
            size_z: 5,
            rock_layers: 2,
            ..WorldConfig::default()
        }
    }

    fn count(grid: &Grid, kind: TerrainKind) -> usize {
        grid.cubes().filter(|c| c.kind == kind).count()
    }

    #[test]
    fn same_seed_same_grid() {
        let config = WorldConfig {
            tree_density: 0.3,
            ..small()
        };
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }

    #[test]
    fn rock_below_surface_air_above() {
        let grid = generate(&small()).unwrap();
        for cube in grid.cubes() {
            match cube.coord.z {
                0 | 1 => assert_eq!(cube.kind, TerrainKind::Rock),
                2 => assert_ne!(cube.kind, TerrainKind::Rock),
                _ => assert_eq!(cube.kind, TerrainKind::Air),
            }
        }
        assert_eq!(count(&grid, TerrainKind::Rock), 8 * 6 * 2);
    }

    #[test]
    fn places_exactly_the_requested_workshops() {
        let config = WorldConfig {
            tree_density: 0.0,
            workshop_count: 3,
            ..small()
        };
        let grid = generate(&config).unwrap();
        assert_eq!(count(&grid, TerrainKind::Workshop), 3);
        assert_eq!(count(&grid, TerrainKind::Tree), 0);
    }

    #[test]
    fn full_forest_leaves_no_room_for_workshops() {
        let config = WorldConfig {
            tree_density: 1.0,
            workshop_count: 3,
            ..small()
        };
        let grid = generate(&config).unwrap();
        assert_eq!(count(&grid, TerrainKind::Tree), 8 * 6);
        assert_eq!(count(&grid, TerrainKind::Workshop), 0);
    }

    #[test]
    fn generated_terrain_is_already_stable() {
        let config = WorldConfig {
            tree_density: 0.4,
            ..small()
        };
        let mut terrain = Terrain::new(generate(&config).unwrap());
        let mut rng = SmallRng::seed_from_u64(5);
        assert!(terrain.validate(&mut rng).unwrap().is_empty());
        assert!(terrain.random_standing_position(&mut rng).is_some());
    }
}
