//! The world driver.
//!
//! [`World`] owns the terrain, the living units, the factions, the clock,
//! and the random generator. Units hold no references back into the world;
//! the driver lends them the terrain for each operation.
//!
//! Each call to [`World::advance_time`] runs these phases:
//!
//! 1. **Clock** -- validate the step and count the tick.
//! 2. **Units** -- advance every living unit in id order, collecting strikes,
//!    completed work, level-ups, and deaths.
//! 3. **Strikes** -- have each struck unit defend, provided it is still
//!    alive, not falling, and within reach of its attacker.
//! 4. **Cleanup** -- drop dead units from the registry and their factions.
//! 5. **Materials** -- let unsupported boulders and logs fall.

use std::collections::BTreeMap;

use delve_types::{CubeCoord, CubeOffset, FactionId, TerrainKind, UnitId};
use delve_units::{DefenceOutcome, Strike, Unit, UnitConfig, WorkOutcome};
use delve_world::{CaveInReport, Grid, Terrain};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::clock::WorldClock;
use crate::config::SimulationConfig;
use crate::error::CoreError;
use crate::faction::FactionRegistry;
use crate::snapshot::{MaterialSummary, StrikeReport, TickSummary, UnitSummary, WorldSnapshot};

/// Maximum number of living units in one world.
pub const MAX_UNITS: usize = 100;

/// A voxel world with its inhabitants.
#[derive(Debug)]
pub struct World {
    terrain: Terrain,
    units: BTreeMap<UnitId, Unit>,
    factions: FactionRegistry,
    clock: WorldClock,
    rng: SmallRng,
    unit_config: UnitConfig,
    spawned: u64,
}

impl World {
    /// Create a world around `terrain`, seeding its random generator.
    pub fn new(terrain: Terrain, seed: u64) -> Self {
        Self {
            terrain,
            units: BTreeMap::new(),
            factions: FactionRegistry::new(),
            clock: WorldClock::new(),
            rng: SmallRng::seed_from_u64(seed),
            unit_config: UnitConfig::default(),
            spawned: 0,
        }
    }

    /// Build a world from nested `[x][y][z]` terrain codes.
    pub fn from_codes(codes: &[Vec<Vec<i32>>], seed: u64) -> Result<Self, CoreError> {
        Ok(Self::new(Terrain::from_codes(codes)?, seed))
    }

    /// Build a world from a generated grid and the simulation configuration.
    ///
    /// Solid regions that start out unanchored cave in immediately.
    pub fn from_config(grid: Grid, config: &SimulationConfig) -> Result<Self, CoreError> {
        let terrain = Terrain::new(grid).with_drop_chance(config.world.drop_chance);
        let mut world = Self::new(terrain, config.world.seed).with_unit_config(config.units);
        let report = world.terrain.validate(&mut world.rng)?;
        if !report.is_empty() {
            debug!(
                collapsed = report.collapsed.len(),
                spawned = report.spawned.len(),
                "settled generated terrain"
            );
        }
        Ok(world)
    }

    /// Use `config` for units spawned from now on.
    #[must_use]
    pub const fn with_unit_config(mut self, config: UnitConfig) -> Self {
        self.unit_config = config;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The terrain.
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// The clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// The faction registry.
    pub const fn factions(&self) -> &FactionRegistry {
        &self.factions
    }

    /// Tunables used for spawned units.
    pub const fn unit_config(&self) -> &UnitConfig {
        &self.unit_config
    }

    /// Look up a living unit.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Every living unit, in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of living units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Factions with at least one living member.
    pub fn active_factions(&self) -> Vec<FactionId> {
        self.factions.active_factions()
    }

    fn unit_ref(&self, id: UnitId) -> Result<&Unit, CoreError> {
        self.units.get(&id).ok_or(CoreError::UnitNotFound(id))
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, CoreError> {
        self.units.get_mut(&id).ok_or(CoreError::UnitNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Add a detached unit to the world.
    ///
    /// A unit without a faction joins one picked by
    /// [`FactionRegistry::assign`]; a unit that already names a faction must
    /// name one of this world's factions with room to spare.
    pub fn add_unit(&mut self, mut unit: Unit) -> Result<UnitId, CoreError> {
        if self.units.len() >= MAX_UNITS {
            return Err(CoreError::UnitLimit { max: MAX_UNITS });
        }
        let id = unit.id();
        if self.units.contains_key(&id) {
            return Err(CoreError::DuplicateUnit(id));
        }
        if let Some(faction) = unit.faction() {
            self.factions.check_room(faction)?;
        }

        unit.attach(&mut self.terrain)?;
        let faction = match unit.faction() {
            Some(faction) => faction,
            None => match self.factions.assign() {
                Ok(faction) => faction,
                Err(err) => {
                    unit.detach(&mut self.terrain)?;
                    return Err(err);
                }
            },
        };
        self.factions.add_member(faction, id)?;
        unit.set_faction(Some(faction));
        debug!(unit = %id, name = unit.name(), %faction, cube = %unit.cube(), "unit added");
        self.units.insert(id, unit);
        Ok(id)
    }

    /// Create a unit with random attributes on a random standing position.
    pub fn spawn_unit(&mut self, default_behaviour: bool) -> Result<UnitId, CoreError> {
        if self.units.len() >= MAX_UNITS {
            return Err(CoreError::UnitLimit { max: MAX_UNITS });
        }
        let cube = self
            .terrain
            .random_standing_position(&mut self.rng)
            .ok_or(CoreError::NoStandingPosition)?;
        let name = spawn_name(self.spawned);
        let mut unit = Unit::random(&name, cube, self.unit_config, &mut self.rng)?;
        if default_behaviour {
            unit.start_default_behaviour();
        }
        let id = self.add_unit(unit)?;
        self.spawned = self.spawned.saturating_add(1);
        Ok(id)
    }

    /// Take a unit out of the world and hand it back, detached.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<Unit, CoreError> {
        let mut unit = self.units.remove(&id).ok_or(CoreError::UnitNotFound(id))?;
        if unit.is_attached() {
            unit.detach(&mut self.terrain)?;
        }
        self.factions.remove_member(id);
        unit.set_faction(None);
        debug!(unit = %id, "unit removed");
        Ok(unit)
    }

    // -----------------------------------------------------------------------
    // Unit commands
    // -----------------------------------------------------------------------

    /// Step a unit into an adjacent cube.
    pub fn move_to_adjacent(&mut self, id: UnitId, offset: CubeOffset) -> Result<(), CoreError> {
        let unit = self.units.get_mut(&id).ok_or(CoreError::UnitNotFound(id))?;
        unit.move_to_adjacent(offset, &self.terrain)?;
        Ok(())
    }

    /// Send a unit to a destination cube.
    pub fn move_to(&mut self, id: UnitId, destination: CubeCoord) -> Result<(), CoreError> {
        let unit = self.units.get_mut(&id).ok_or(CoreError::UnitNotFound(id))?;
        unit.move_to(destination, &self.terrain)?;
        Ok(())
    }

    /// Have a unit work at a cube.
    pub fn work(&mut self, id: UnitId, target: CubeCoord) -> Result<(), CoreError> {
        let unit = self.units.get_mut(&id).ok_or(CoreError::UnitNotFound(id))?;
        unit.work(target, &self.terrain)?;
        Ok(())
    }

    /// Have a unit rest.
    pub fn rest(&mut self, id: UnitId) -> Result<(), CoreError> {
        self.unit_mut(id)?.rest()?;
        Ok(())
    }

    /// Turn sprinting on or off for a unit.
    pub fn set_sprinting(&mut self, id: UnitId, sprinting: bool) -> Result<(), CoreError> {
        self.unit_mut(id)?.set_sprinting(sprinting)?;
        Ok(())
    }

    /// Enable or disable a unit's autonomous behaviour.
    pub fn set_default_behaviour(&mut self, id: UnitId, enabled: bool) -> Result<(), CoreError> {
        let unit = self.unit_mut(id)?;
        if enabled {
            unit.start_default_behaviour();
        } else {
            unit.stop_default_behaviour();
        }
        Ok(())
    }

    /// Have `attacker` start an attack on `target`.
    pub fn attack(&mut self, attacker: UnitId, target: UnitId) -> Result<(), CoreError> {
        let profile = self.unit_ref(target)?.combat_profile();
        self.unit_mut(attacker)?.attack(&profile)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Living units in `coord`.
    pub fn units_at(&self, coord: CubeCoord) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.cube() == coord)
            .map(Unit::id)
            .collect()
    }

    /// Other living units in the same or an adjacent cube.
    pub fn adjacent_units(&self, id: UnitId) -> Result<Vec<UnitId>, CoreError> {
        let cube = self.unit_ref(id)?.cube();
        Ok(self
            .units
            .values()
            .filter(|u| u.id() != id && u.cube().is_same_or_adjacent(cube))
            .map(Unit::id)
            .collect())
    }

    /// Nearby units that `id` is allowed to attack.
    pub fn adjacent_enemies(&self, id: UnitId) -> Result<Vec<UnitId>, CoreError> {
        let faction = self.unit_ref(id)?.faction();
        Ok(self
            .adjacent_units(id)?
            .into_iter()
            .filter(|other| {
                faction.is_none() || self.units.get(other).and_then(Unit::faction) != faction
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Terrain changes
    // -----------------------------------------------------------------------

    /// Cave in a solid cube, cascading to unanchored neighbours.
    pub fn cave_in(&mut self, coord: CubeCoord) -> Result<CaveInReport, CoreError> {
        Ok(self.terrain.cave_in(coord, &mut self.rng)?)
    }

    /// Collapse a solid cube, always leaving a material behind.
    pub fn collapse(&mut self, coord: CubeCoord) -> Result<CaveInReport, CoreError> {
        Ok(self.terrain.collapse(coord, &mut self.rng)?)
    }

    /// Change a cube's terrain kind.
    pub fn set_kind(&mut self, coord: CubeCoord, kind: TerrainKind) -> Result<CaveInReport, CoreError> {
        Ok(self.terrain.set_kind(coord, kind, &mut self.rng)?)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the whole world by `dt` seconds, `0 <= dt < 0.2`.
    pub fn advance_time(&mut self, dt: f64) -> Result<TickSummary, CoreError> {
        let tick = self.clock.advance(dt)?;
        let mut summary = TickSummary {
            tick,
            elapsed: self.clock.elapsed(),
            ..TickSummary::default()
        };

        let mut strikes = Vec::new();
        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        for id in ids {
            let Some(unit) = self.units.get_mut(&id) else {
                continue;
            };
            if unit.is_terminated() {
                continue;
            }
            let events = unit.advance_time(dt, &mut self.terrain, &mut self.rng)?;
            strikes.extend(events.strikes);
            summary.work_completed = summary.work_completed.saturating_add(events.work.len());
            let collapsed = events
                .work
                .iter()
                .map(|w| match w {
                    WorkOutcome::Collapsed(report) => report.collapsed.len(),
                    _ => 0,
                })
                .fold(0_usize, usize::saturating_add);
            summary.cubes_collapsed = summary.cubes_collapsed.saturating_add(collapsed);
            summary.level_ups = summary.level_ups.saturating_add(events.level_ups);
            summary.fall_damage = summary.fall_damage.saturating_add(events.fall_damage);
            if events.terminated {
                summary.deaths.push(id);
            }
        }

        for strike in strikes {
            let report = self.resolve_strike(strike)?;
            if matches!(report.outcome, Some(DefenceOutcome::Killed { .. })) {
                summary.deaths.push(report.target);
            }
            summary.strikes.push(report);
        }

        for id in &summary.deaths {
            self.units.remove(id);
            self.factions.remove_member(*id);
            debug!(unit = %id, tick, "unit died");
        }

        self.terrain.advance_materials(dt)?;
        summary.units_alive = self.units.len();
        Ok(summary)
    }

    /// Let the target of `strike` defend itself, if it still can.
    fn resolve_strike(&mut self, strike: Strike) -> Result<StrikeReport, CoreError> {
        let mut report = StrikeReport {
            attacker: strike.attacker,
            target: strike.target,
            outcome: None,
        };
        let Some(attacker) = self.units.get(&strike.attacker) else {
            return Ok(report);
        };
        if attacker.is_terminated() {
            return Ok(report);
        }
        let profile = attacker.combat_profile();
        let Some(target) = self.units.get_mut(&strike.target) else {
            return Ok(report);
        };
        let in_reach = target.cube().is_same_or_adjacent(profile.cube());
        if target.is_terminated() || target.activity().is_falling() || !in_reach {
            debug!(attacker = %strike.attacker, target = %strike.target, "strike missed");
            return Ok(report);
        }
        let outcome = target.defend(&profile, &mut self.terrain, &mut self.rng)?;
        debug!(
            attacker = %strike.attacker,
            target = %strike.target,
            damage = outcome.damage(),
            "strike resolved"
        );
        report.outcome = Some(outcome);
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// A serializable picture of the world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.clock.tick(),
            elapsed: self.clock.elapsed(),
            dimensions: self.terrain.dimensions(),
            terrain_revision: self.terrain.revision(),
            active_factions: self.factions.active_factions(),
            units: self.units.values().map(UnitSummary::from).collect(),
            materials: self
                .terrain
                .materials()
                .iter()
                .map(MaterialSummary::from)
                .collect(),
        }
    }
}

/// Name for the `index`-th spawned unit: `Unit A`, ..., `Unit Z`, `Unit AA`.
fn spawn_name(index: u64) -> String {
    let mut letters = Vec::new();
    let mut rest = index;
    loop {
        let digit = u8::try_from(rest % 26).unwrap_or(0);
        letters.push(char::from(b'A'.saturating_add(digit)));
        if rest < 26 {
            break;
        }
        rest = (rest / 26).saturating_sub(1);
    }
    let suffix: String = letters.into_iter().rev().collect();
    format!("Unit {suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use delve_units::{Attributes, UnitError};

    use super::*;

    fn floor_world() -> World {
        World::from_codes(&vec![vec![vec![1, 0, 0]; 6]; 6], 7).unwrap()
    }

    fn unit_at(name: &str, cube: CubeCoord) -> Unit {
        let attributes = Attributes::new(50, 50, 50, 50).unwrap();
        Unit::new(name, cube, attributes, UnitConfig::default()).unwrap()
    }

    #[test]
    fn spawn_names_are_valid_and_distinct() {
        assert_eq!(spawn_name(0), "Unit A");
        assert_eq!(spawn_name(25), "Unit Z");
        assert_eq!(spawn_name(26), "Unit AA");
        assert_eq!(spawn_name(27), "Unit AB");
        assert_eq!(spawn_name(26 * 27), "Unit AAA");
        for i in 0..200 {
            assert!(delve_units::unit::validate_name(&spawn_name(i)).is_ok());
        }
    }

    #[test]
    fn add_unit_attaches_and_assigns_faction() {
        let mut world = floor_world();
        let id = world.add_unit(unit_at("Ada", CubeCoord::new(1, 1, 1))).unwrap();
        let unit = world.unit(id).unwrap();
        assert!(unit.is_attached());
        let faction = unit.faction().unwrap();
        assert_eq!(world.active_factions(), vec![faction]);
        assert_eq!(world.units_at(CubeCoord::new(1, 1, 1)), vec![id]);
    }

    #[test]
    fn add_unit_rejects_solid_cubes() {
        let mut world = floor_world();
        let err = world.add_unit(unit_at("Ada", CubeCoord::new(1, 1, 0))).unwrap_err();
        assert_eq!(
            err,
            CoreError::from(UnitError::NotStandingPosition {
                coord: CubeCoord::new(1, 1, 0)
            })
        );
        assert!(world.factions().is_empty());
    }

    #[test]
    fn remove_unit_clears_everything() {
        let mut world = floor_world();
        let id = world.spawn_unit(false).unwrap();
        let cube = world.unit(id).unwrap().cube();
        let unit = world.remove_unit(id).unwrap();
        assert!(!unit.is_attached());
        assert!(unit.faction().is_none());
        assert!(world.units_at(cube).is_empty());
        assert!(world.active_factions().is_empty());
        assert_eq!(world.remove_unit(id).unwrap_err(), CoreError::UnitNotFound(id));
    }

    #[test]
    fn adjacency_queries_respect_factions() {
        let mut world = floor_world();
        let a = world.add_unit(unit_at("Ada", CubeCoord::new(1, 1, 1))).unwrap();
        let b = world.add_unit(unit_at("Bea", CubeCoord::new(2, 2, 1))).unwrap();
        let mut friend = unit_at("Cid", CubeCoord::new(1, 2, 1));
        friend.set_faction(world.unit(a).unwrap().faction());
        let c = world.add_unit(friend).unwrap();
        let _far = world.add_unit(unit_at("Dee", CubeCoord::new(5, 5, 1))).unwrap();

        let mut near = world.adjacent_units(a).unwrap();
        near.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(near, expected);
        assert_eq!(world.adjacent_enemies(a).unwrap(), vec![b]);
    }

    #[test]
    fn advance_time_rejects_bad_steps() {
        let mut world = floor_world();
        assert!(matches!(
            world.advance_time(0.25),
            Err(CoreError::Clock { .. })
        ));
        assert_eq!(world.clock().tick(), 0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut world = floor_world();
        world.spawn_unit(true).unwrap();
        world.advance_time(0.1).unwrap();
        let snapshot = world.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.units.len(), 1);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"units\""));
    }
}
