//! The terrain consistency engine.
//!
//! [`Terrain`] owns the cube grid, the border-connectivity oracle, and the
//! registry of loose materials, and is the only way to turn solid cubes
//! into air. Every removal is followed by propagation: face neighbours that
//! lost their last anchor to the border cave in as well, repeatedly, until
//! the solid set is stable again.
//!
//! Propagation runs on an explicit work list rather than recursion, so a
//! long chain of collapses cannot grow the call stack.

use delve_types::{CubeCoord, MaterialId, MaterialKind, Position, TerrainKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::connectivity::{BorderConnectivity, FloodFillConnectivity};
use crate::error::WorldError;
use crate::grid::{Dimensions, Grid, Occupant};
use crate::listener::{NoopListener, TerrainChangeListener};
use crate::material::{MATERIAL_FALL_SPEED, Material, MaterialRegistry};

/// Chance that a caved-in cube leaves a material behind.
pub const DEFAULT_DROP_CHANCE: f64 = 0.25;

/// A material created by a cave-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedMaterial {
    /// The cube that collapsed.
    pub coord: CubeCoord,
    /// The new material.
    pub id: MaterialId,
    /// Boulder for rock, log for tree.
    pub kind: MaterialKind,
}

/// Everything that changed during one cave-in, including the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveInReport {
    /// Cubes turned to air, in collapse order.
    pub collapsed: Vec<CubeCoord>,
    /// Materials that appeared.
    pub spawned: Vec<SpawnedMaterial>,
}

impl CaveInReport {
    /// Whether nothing collapsed.
    pub const fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    /// Append another report to this one.
    pub fn merge(&mut self, other: Self) {
        self.collapsed.extend(other.collapsed);
        self.spawned.extend(other.spawned);
    }
}

/// The world's terrain: grid, connectivity oracle, and loose materials.
pub struct Terrain {
    grid: Grid,
    connectivity: Box<dyn BorderConnectivity>,
    materials: MaterialRegistry,
    listener: Box<dyn TerrainChangeListener>,
    revision: u64,
    drop_chance: f64,
}

impl core::fmt::Debug for Terrain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Terrain")
            .field("dimensions", &self.grid.dimensions())
            .field("materials", &self.materials.len())
            .field("revision", &self.revision)
            .field("drop_chance", &self.drop_chance)
            .finish_non_exhaustive()
    }
}

impl Terrain {
    /// Wrap a grid with a flood-fill oracle and no listener.
    ///
    /// The terrain is not validated; call [`validate`](Self::validate) to
    /// collapse any solid region that starts out unanchored.
    pub fn new(grid: Grid) -> Self {
        let connectivity = Box::new(FloodFillConnectivity::from_grid(&grid));
        Self {
            grid,
            connectivity,
            materials: MaterialRegistry::new(),
            listener: Box::new(NoopListener),
            revision: 0,
            drop_chance: DEFAULT_DROP_CHANCE,
        }
    }

    /// Build terrain from nested `[x][y][z]` terrain codes.
    pub fn from_codes(codes: &[Vec<Vec<i32>>]) -> Result<Self, WorldError> {
        Ok(Self::new(Grid::from_codes(codes)?))
    }

    /// Replace the connectivity oracle.
    ///
    /// The oracle must describe the same solid set as the grid.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Box<dyn BorderConnectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Install a terrain change listener.
    #[must_use]
    pub fn with_listener<L: TerrainChangeListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Box::new(listener);
        self
    }

    /// Set the material drop chance, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_drop_chance(mut self, chance: f64) -> Self {
        self.drop_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Cave in every solid cube that is not anchored to the border.
    pub fn validate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<CaveInReport, WorldError> {
        let loose: Vec<CubeCoord> = self
            .grid
            .dimensions()
            .coords()
            .filter(|c| self.grid.is_solid(*c) && !self.connectivity.is_solid_connected_to_border(*c))
            .collect();

        let mut report = CaveInReport::default();
        for coord in loose {
            // An earlier cascade may already have taken it.
            if self.grid.is_solid(coord) {
                report.merge(self.cave_in(coord, rng)?);
            }
        }
        if !report.is_empty() {
            debug!(collapsed = report.collapsed.len(), "validated initial terrain");
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The underlying grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Grid extent.
    pub const fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    /// Loose materials lying in the world.
    pub const fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Counter bumped on every terrain kind change.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The material drop chance.
    pub const fn drop_chance(&self) -> f64 {
        self.drop_chance
    }

    /// Whether `coord` lies inside the world.
    pub const fn contains(&self, coord: CubeCoord) -> bool {
        self.grid.contains(coord)
    }

    /// Terrain kind at `coord`.
    pub fn kind(&self, coord: CubeCoord) -> Option<TerrainKind> {
        self.grid.kind(coord)
    }

    /// Whether `coord` is solid.
    pub fn is_solid(&self, coord: CubeCoord) -> bool {
        self.grid.is_solid(coord)
    }

    /// Whether `coord` is inside the world and passable.
    pub fn is_passable(&self, coord: CubeCoord) -> bool {
        self.grid.is_passable(coord)
    }

    /// Whether an agent can stand in `coord`.
    pub fn is_standing_position(&self, coord: CubeCoord) -> bool {
        self.grid.is_standing_position(coord)
    }

    /// Whether any 26-neighbour of `coord` is solid.
    pub fn has_solid_neighbor(&self, coord: CubeCoord) -> bool {
        self.grid.has_solid_neighbor(coord)
    }

    /// Standing positions adjacent to `coord`.
    pub fn standing_neighbors(&self, coord: CubeCoord) -> Vec<CubeCoord> {
        self.grid.standing_neighbors(coord)
    }

    /// Whether `coord` is solid and anchored to the border.
    pub fn is_solid_connected_to_border(&self, coord: CubeCoord) -> bool {
        self.connectivity.is_solid_connected_to_border(coord)
    }

    /// A uniformly chosen standing position, if any exists.
    pub fn random_standing_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CubeCoord> {
        let candidates = self.grid.standing_positions();
        if candidates.is_empty() {
            return None;
        }
        candidates.get(rng.random_range(0..candidates.len())).copied()
    }

    // -----------------------------------------------------------------------
    // Cave-ins
    // -----------------------------------------------------------------------

    /// Kind at `coord`, which must be solid.
    fn solid_kind(&self, coord: CubeCoord) -> Result<TerrainKind, WorldError> {
        let kind = self.grid.kind(coord).ok_or(WorldError::OutOfBounds { coord })?;
        if kind.is_solid() {
            Ok(kind)
        } else {
            Err(WorldError::NotSolid { coord, kind })
        }
    }

    /// Turn the solid cube at `coord` into air and cascade.
    ///
    /// Each collapsed cube independently leaves a boulder (rock) or log
    /// (tree) with the configured drop chance.
    pub fn cave_in<R: Rng + ?Sized>(
        &mut self,
        coord: CubeCoord,
        rng: &mut R,
    ) -> Result<CaveInReport, WorldError> {
        let kind = self.solid_kind(coord)?;
        let mut report = CaveInReport::default();
        self.clear(coord, TerrainKind::Air, true, rng, &mut report)?;
        self.propagate(coord, rng, &mut report)?;
        debug!(
            x = coord.x,
            y = coord.y,
            z = coord.z,
            ?kind,
            collapsed = report.collapsed.len(),
            spawned = report.spawned.len(),
            "cave-in"
        );
        Ok(report)
    }

    /// Harvest the solid cube at `coord`.
    ///
    /// Like [`cave_in`](Self::cave_in), but the harvested cube always leaves
    /// exactly one material.
    pub fn collapse<R: Rng + ?Sized>(
        &mut self,
        coord: CubeCoord,
        rng: &mut R,
    ) -> Result<CaveInReport, WorldError> {
        let kind = self.solid_kind(coord)?;
        let mut report = self.cave_in(coord, rng)?;
        let dropped = report.spawned.iter().any(|s| s.coord == coord);
        if let Some(material) = MaterialKind::from_terrain(kind).filter(|_| !dropped) {
            let spawned = self.spawn_material(material, coord, rng)?;
            report.spawned.push(spawned);
        }
        Ok(report)
    }

    /// Change the kind of a cube to a passable kind.
    ///
    /// Replacing a solid cube cascades exactly like a cave-in but never
    /// drops a material for the replaced cube itself. Passable cubes can
    /// never become solid.
    pub fn set_kind<R: Rng + ?Sized>(
        &mut self,
        coord: CubeCoord,
        kind: TerrainKind,
        rng: &mut R,
    ) -> Result<CaveInReport, WorldError> {
        let previous = self.grid.kind(coord).ok_or(WorldError::OutOfBounds { coord })?;
        let mut report = CaveInReport::default();
        if previous == kind {
            return Ok(report);
        }
        if kind.is_solid() {
            return Err(WorldError::SolidPlacement { coord, kind });
        }
        self.clear(coord, kind, false, rng, &mut report)?;
        if previous.is_solid() {
            self.propagate(coord, rng, &mut report)?;
        } else {
            // Passable to passable is not a collapse.
            report.collapsed.clear();
        }
        Ok(report)
    }

    /// Replace one cube, keeping grid, oracle, and listener in step.
    fn clear<R: Rng + ?Sized>(
        &mut self,
        coord: CubeCoord,
        kind: TerrainKind,
        may_drop: bool,
        rng: &mut R,
        report: &mut CaveInReport,
    ) -> Result<(), WorldError> {
        let previous = self.grid.replace_kind(coord, kind)?;
        if previous.is_solid() {
            self.connectivity.mark_passable(coord);
        }
        self.revision = self.revision.wrapping_add(1);
        self.listener.notify(coord);
        report.collapsed.push(coord);
        trace!(x = coord.x, y = coord.y, z = coord.z, ?previous, ?kind, "cube replaced");

        if !may_drop {
            return Ok(());
        }
        let Some(material) = MaterialKind::from_terrain(previous) else {
            return Ok(());
        };
        if rng.random::<f64>() < self.drop_chance {
            let spawned = self.spawn_material(material, coord, rng)?;
            report.spawned.push(spawned);
        }
        Ok(())
    }

    /// Cave in every unanchored solid cube reachable from `origin`.
    fn propagate<R: Rng + ?Sized>(
        &mut self,
        origin: CubeCoord,
        rng: &mut R,
        report: &mut CaveInReport,
    ) -> Result<(), WorldError> {
        let mut pending: Vec<CubeCoord> = self.grid.face_neighbors(origin).collect();
        while let Some(coord) = pending.pop() {
            if !self.grid.is_solid(coord) || self.connectivity.is_solid_connected_to_border(coord) {
                continue;
            }
            self.clear(coord, TerrainKind::Air, true, rng, report)?;
            pending.extend(self.grid.face_neighbors(coord));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Materials and occupants
    // -----------------------------------------------------------------------

    fn spawn_material<R: Rng + ?Sized>(
        &mut self,
        kind: MaterialKind,
        coord: CubeCoord,
        rng: &mut R,
    ) -> Result<SpawnedMaterial, WorldError> {
        let material = Material::random(kind, coord.center(), rng);
        let id = material.id;
        self.place_material(material)?;
        Ok(SpawnedMaterial { coord, id, kind })
    }

    /// Put a material into the world at its current position.
    pub fn place_material(&mut self, material: Material) -> Result<MaterialId, WorldError> {
        let coord = material.cube();
        let id = material.id;
        self.grid.insert_occupant(coord, Occupant::Material(id))?;
        self.materials.insert(material);
        Ok(id)
    }

    /// Remove a material from the world and hand it to the caller.
    pub fn take_material(&mut self, id: MaterialId) -> Result<Material, WorldError> {
        let coord = self
            .materials
            .get(id)
            .map(Material::cube)
            .ok_or(WorldError::MaterialNotFound(id))?;
        self.grid.remove_occupant(coord, Occupant::Material(id))?;
        self.materials
            .remove(id)
            .ok_or(WorldError::MaterialNotFound(id))
    }

    /// Register `occupant` in the cube at `coord`.
    pub fn insert_occupant(&mut self, coord: CubeCoord, occupant: Occupant) -> Result<(), WorldError> {
        self.grid.insert_occupant(coord, occupant)
    }

    /// Remove `occupant` from the cube at `coord`.
    pub fn remove_occupant(&mut self, coord: CubeCoord, occupant: Occupant) -> Result<bool, WorldError> {
        self.grid.remove_occupant(coord, occupant)
    }

    /// Move `occupant` between cubes.
    pub fn move_occupant(
        &mut self,
        occupant: Occupant,
        from: CubeCoord,
        to: CubeCoord,
    ) -> Result<(), WorldError> {
        if from == to {
            return Ok(());
        }
        if !self.grid.contains(to) {
            return Err(WorldError::OutOfBounds { coord: to });
        }
        self.grid.remove_occupant(from, occupant)?;
        self.grid.insert_occupant(to, occupant)
    }

    /// Whether a material in `coord` has nothing to rest on.
    fn material_unsupported(&self, coord: CubeCoord) -> bool {
        let below = CubeCoord::new(coord.x, coord.y, coord.z.saturating_sub(1));
        coord.z > 0 && self.grid.is_passable(below)
    }

    /// Let every unsupported material fall for `dt` seconds.
    ///
    /// Materials land on the centre of the first cube with solid ground
    /// below, or on the ground layer.
    pub fn advance_materials(&mut self, dt: f64) -> Result<(), WorldError> {
        for id in self.materials.ids() {
            let Some(material) = self.materials.get(id) else {
                continue;
            };
            let from = material.cube();
            if !material.is_falling() && !self.material_unsupported(from) {
                continue;
            }

            let mut position = material.position;
            position.z = MATERIAL_FALL_SPEED.mul_add(-dt, position.z);
            let mut velocity = Position::new(0.0, 0.0, -MATERIAL_FALL_SPEED);
            let mut to = position.cube();
            if to.z < 0 {
                to.z = 0;
            }
            if position.z <= to.center().z && !self.material_unsupported(to) {
                position = to.center();
                velocity = Position::ZERO;
                trace!(material = %id, x = to.x, y = to.y, z = to.z, "material landed");
            }

            self.move_occupant(Occupant::Material(id), from, to)?;
            if let Some(material) = self.materials.get_mut(id) {
                material.position = position;
                material.velocity = velocity;
            }
        }
        Ok(())
    }
}
