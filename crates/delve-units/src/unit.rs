//! The unit type, its construction, and the commands a player can issue.
//!
//! A unit is created detached, gets attached to terrain by the world that
//! owns it, and ends terminated when its hit points run out. Units never
//! hold references into the world: every operation that needs the grid
//! receives the [`Terrain`] explicitly.

use core::f64::consts::{FRAC_PI_2, TAU};

use delve_types::{ActivityKind, CubeCoord, CubeOffset, FactionId, Position, UnitId};
use delve_world::{Material, Occupant, PathSearch, Terrain};
use rand::Rng;

use crate::activity::Activity;
use crate::attributes::Attributes;
use crate::config::UnitConfig;
use crate::error::UnitError;
use crate::vitals::Gauge;

/// Check a unit name.
///
/// Names are at least two characters long, start with an uppercase letter,
/// and contain only letters, spaces, and single or double quotes.
pub fn validate_name(name: &str) -> Result<(), UnitError> {
    let mut chars = name.chars();
    let starts_upper = chars.next().is_some_and(char::is_uppercase);
    let valid = starts_upper
        && name.chars().count() >= 2
        && name
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '\'' || c == '"');
    if valid {
        Ok(())
    } else {
        Err(UnitError::InvalidName {
            name: name.to_owned(),
        })
    }
}

/// An autonomous agent in the voxel world.
#[derive(Debug, Clone)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    pub(crate) hp: Gauge,
    pub(crate) stamina: Gauge,
    pub(crate) position: Position,
    pub(crate) next_position: Position,
    pub(crate) destination: Position,
    pub(crate) velocity: Position,
    pub(crate) orientation: f64,
    pub(crate) activity: Activity,
    pub(crate) min_rest: f64,
    pub(crate) auto_rest: f64,
    pub(crate) sprinting: bool,
    pub(crate) experience: u32,
    pub(crate) inventory: Option<Material>,
    pub(crate) faction: Option<FactionId>,
    pub(crate) default_behaviour: bool,
    pub(crate) path: PathSearch,
    pub(crate) attached: bool,
    pub(crate) terminated: bool,
    pub(crate) config: UnitConfig,
}

impl Unit {
    /// Create a detached unit standing at the centre of `cube`.
    pub fn new(
        name: &str,
        cube: CubeCoord,
        attributes: Attributes,
        config: UnitConfig,
    ) -> Result<Self, UnitError> {
        validate_name(name)?;
        if cube.x < 0 || cube.y < 0 || cube.z < 0 {
            return Err(UnitError::NotStandingPosition { coord: cube });
        }
        let max = attributes.max_hp();
        let position = cube.center();
        Ok(Self {
            id: UnitId::new(),
            name: name.to_owned(),
            attributes,
            hp: Gauge::full(max),
            stamina: Gauge::full(max),
            position,
            next_position: position,
            destination: position,
            velocity: Position::ZERO,
            orientation: FRAC_PI_2,
            activity: Activity::Idle,
            min_rest: 0.0,
            auto_rest: 0.0,
            sprinting: false,
            experience: 0,
            inventory: None,
            faction: None,
            default_behaviour: false,
            path: PathSearch::new(),
            attached: false,
            terminated: false,
            config,
        })
    }

    /// Create a detached unit with random attributes in `[25, 100]`.
    pub fn random<R: Rng + ?Sized>(
        name: &str,
        cube: CubeCoord,
        config: UnitConfig,
        rng: &mut R,
    ) -> Result<Self, UnitError> {
        Self::new(name, cube, Attributes::random(rng), config)
    }

    // -----------------------------------------------------------------------
    // Getters
    // -----------------------------------------------------------------------

    /// Unique identifier.
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary attributes.
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Strength.
    pub const fn strength(&self) -> u32 {
        self.attributes.strength()
    }

    /// Agility.
    pub const fn agility(&self) -> u32 {
        self.attributes.agility()
    }

    /// Toughness.
    pub const fn toughness(&self) -> u32 {
        self.attributes.toughness()
    }

    /// Weight.
    pub const fn weight(&self) -> u32 {
        self.attributes.weight()
    }

    /// Hit points.
    pub const fn hp(&self) -> &Gauge {
        &self.hp
    }

    /// Stamina.
    pub const fn stamina(&self) -> &Gauge {
        &self.stamina
    }

    /// Continuous position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The cube the unit is in.
    pub fn cube(&self) -> CubeCoord {
        self.position.cube()
    }

    /// The point the unit is currently heading for.
    pub const fn next_position(&self) -> Position {
        self.next_position
    }

    /// The final target of the current route.
    pub const fn destination(&self) -> Position {
        self.destination
    }

    /// Current velocity, excluding the sprint multiplier.
    pub const fn velocity(&self) -> Position {
        self.velocity
    }

    /// Facing angle in `[0, 2π)`.
    pub const fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Current activity.
    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Current activity tag.
    pub const fn activity_kind(&self) -> ActivityKind {
        self.activity.kind()
    }

    /// Whether sprinting is switched on.
    pub const fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    /// Experience towards the next level.
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// The carried material, if any.
    pub const fn inventory(&self) -> Option<&Material> {
        self.inventory.as_ref()
    }

    /// Faction membership.
    pub const fn faction(&self) -> Option<FactionId> {
        self.faction
    }

    /// Whether autonomous behaviour is enabled.
    pub const fn default_behaviour(&self) -> bool {
        self.default_behaviour
    }

    /// Seconds of uninterruptible rest left.
    pub const fn min_rest_remaining(&self) -> f64 {
        self.min_rest
    }

    /// Seconds of activity since the last rest.
    pub const fn auto_rest_elapsed(&self) -> f64 {
        self.auto_rest
    }

    /// Whether the unit is part of a world.
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the unit has died.
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Behaviour tunables.
    pub const fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Walking speed toward `target` before sprinting.
    ///
    /// Climbing one level halves the base speed; descending multiplies it
    /// by 1.2.
    pub fn walking_speed(&self, target: CubeCoord) -> f64 {
        let base = self.attributes.base_speed();
        match target.z.saturating_sub(self.cube().z) {
            1 => 0.5 * base,
            -1 => 1.2 * base,
            _ => base,
        }
    }

    /// Whether the unit has reached its next position.
    pub fn at_next_position(&self) -> bool {
        self.position.approx_eq(self.next_position)
    }

    /// Whether the unit has reached its destination.
    pub fn at_destination(&self) -> bool {
        self.position.approx_eq(self.destination)
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Change the name.
    pub fn rename(&mut self, name: &str) -> Result<(), UnitError> {
        validate_name(name)?;
        name.clone_into(&mut self.name);
        Ok(())
    }

    /// Set strength (clamped) and refresh the maxima.
    pub fn set_strength(&mut self, value: u32) {
        self.attributes.set_strength(value);
        self.refresh_maxima();
    }

    /// Set agility (clamped) and refresh the maxima.
    pub fn set_agility(&mut self, value: u32) {
        self.attributes.set_agility(value);
        self.refresh_maxima();
    }

    /// Set toughness (clamped) and refresh the maxima.
    pub fn set_toughness(&mut self, value: u32) {
        self.attributes.set_toughness(value);
        self.refresh_maxima();
    }

    /// Set weight (clamped) and refresh the maxima.
    pub fn set_weight(&mut self, value: u32) {
        self.attributes.set_weight(value);
        self.refresh_maxima();
    }

    pub(crate) fn refresh_maxima(&mut self) {
        let max = self.attributes.max_hp();
        self.hp.set_max(max);
        self.stamina.set_max(max);
    }

    /// Record faction membership; the world keeps the faction registry.
    pub const fn set_faction(&mut self, faction: Option<FactionId>) {
        self.faction = faction;
    }

    /// Turn sprinting on or off.
    pub fn set_sprinting(&mut self, sprinting: bool) -> Result<(), UnitError> {
        self.ensure_alive()?;
        if sprinting && self.stamina.displayed() == 0 {
            return Err(UnitError::NoStamina);
        }
        self.sprinting = sprinting;
        Ok(())
    }

    /// Enable autonomous behaviour.
    pub const fn start_default_behaviour(&mut self) {
        self.default_behaviour = true;
    }

    /// Disable autonomous behaviour.
    pub const fn stop_default_behaviour(&mut self) {
        self.default_behaviour = false;
    }

    /// Point the unit at `target`.
    pub(crate) fn face(&mut self, target: Position) {
        let delta = target - self.position;
        if delta.x.abs() > f64::EPSILON || delta.y.abs() > f64::EPSILON {
            self.orientation = delta.y.atan2(delta.x).rem_euclid(TAU);
        }
    }

    /// Move to `position`, keeping the grid's occupant sets in step.
    pub(crate) fn set_position(
        &mut self,
        position: Position,
        terrain: &mut Terrain,
    ) -> Result<(), UnitError> {
        let from = self.cube();
        let to = position.cube();
        terrain.move_occupant(Occupant::Unit(self.id), from, to)?;
        self.position = position;
        Ok(())
    }

    /// Stop where the unit stands.
    pub(crate) fn halt(&mut self) {
        self.next_position = self.position;
        self.destination = self.position;
        self.velocity = Position::ZERO;
        self.path.reset();
    }

    pub(crate) const fn ensure_alive(&self) -> Result<(), UnitError> {
        if self.terminated {
            return Err(UnitError::Terminated { unit: self.id });
        }
        Ok(())
    }

    pub(crate) const fn reject_if(&self, busy: bool, action: &'static str) -> Result<(), UnitError> {
        if busy {
            return Err(UnitError::InvalidState {
                activity: self.activity.kind(),
                action,
            });
        }
        Ok(())
    }

    const fn in_forced_rest(&self) -> bool {
        self.min_rest > 0.0
    }

    // -----------------------------------------------------------------------
    // World membership
    // -----------------------------------------------------------------------

    /// Register the unit in the cube it stands in.
    pub fn attach(&mut self, terrain: &mut Terrain) -> Result<(), UnitError> {
        self.ensure_alive()?;
        if self.attached {
            return Err(UnitError::AlreadyAttached { unit: self.id });
        }
        let cube = self.cube();
        if !terrain.is_passable(cube) {
            return Err(UnitError::NotStandingPosition { coord: cube });
        }
        terrain.insert_occupant(cube, Occupant::Unit(self.id))?;
        self.attached = true;
        Ok(())
    }

    /// Remove the unit from its cube.
    pub fn detach(&mut self, terrain: &mut Terrain) -> Result<(), UnitError> {
        if !self.attached {
            return Err(UnitError::Detached { unit: self.id });
        }
        terrain.remove_occupant(self.cube(), Occupant::Unit(self.id))?;
        self.attached = false;
        Ok(())
    }

    pub(crate) const fn ensure_attached(&self) -> Result<(), UnitError> {
        if !self.attached {
            return Err(UnitError::Detached { unit: self.id });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Step into the neighbouring cube at `offset`.
    ///
    /// The zero offset is accepted and does nothing. The step replaces any
    /// route in progress.
    pub fn move_to_adjacent(
        &mut self,
        offset: CubeOffset,
        terrain: &Terrain,
    ) -> Result<(), UnitError> {
        self.ensure_alive()?;
        if !offset.is_unit_step() {
            return Err(UnitError::InvalidOffset { offset });
        }
        if offset.is_zero() {
            return Ok(());
        }
        self.reject_if(
            self.activity.is_falling() || self.activity.is_attacking() || self.in_forced_rest(),
            "move",
        )?;
        self.reject_if(
            matches!(self.activity, Activity::Moving) && !self.at_next_position(),
            "change course mid-step",
        )?;
        let here = self.cube();
        let target = here
            .offset(offset)
            .ok_or(UnitError::InvalidOffset { offset })?;
        if !terrain.is_standing_position(target) {
            return Err(UnitError::NotStandingPosition { coord: target });
        }
        self.path.reset();
        self.begin_hop(target);
        self.destination = self.next_position;
        Ok(())
    }

    /// Travel to `destination` along a computed route.
    pub fn move_to(&mut self, destination: CubeCoord, terrain: &Terrain) -> Result<(), UnitError> {
        self.ensure_alive()?;
        self.reject_if(
            self.activity.is_falling() || self.activity.is_attacking() || self.in_forced_rest(),
            "move",
        )?;
        if !terrain.is_standing_position(destination) {
            return Err(UnitError::NotStandingPosition { coord: destination });
        }
        self.destination = destination.center();
        if !self.at_destination() || !self.at_next_position() {
            self.activity = Activity::Moving;
        }
        Ok(())
    }

    /// Start heading for the centre of the adjacent cube `target`.
    pub(crate) fn begin_hop(&mut self, target: CubeCoord) {
        let goal = target.center();
        let speed = self.walking_speed(target);
        let delta = goal - self.position;
        let distance = delta.length();
        self.velocity = if distance > 0.0 {
            delta.scale(speed / distance)
        } else {
            Position::ZERO
        };
        self.next_position = goal;
        self.activity = Activity::Moving;
        self.face(goal);
    }

    /// Work at `target`, which must be the unit's own cube or adjacent to it.
    pub fn work(&mut self, target: CubeCoord, terrain: &Terrain) -> Result<(), UnitError> {
        self.ensure_alive()?;
        self.reject_if(
            self.activity.is_falling() || self.activity.is_attacking() || self.in_forced_rest(),
            "work",
        )?;
        let here = self.cube();
        if !terrain.contains(target) || !here.is_same_or_adjacent(target) {
            return Err(UnitError::NotAdjacent {
                from: here,
                to: target,
            });
        }
        self.activity = Activity::Working {
            target,
            remaining: self.config.work_effort / f64::from(self.strength()),
        };
        self.face(target.center());
        Ok(())
    }

    /// Start resting.
    ///
    /// Does nothing when hit points and stamina are already full. Otherwise
    /// the first `0.2 / (toughness / 200)` seconds, the time it takes to
    /// recover one hit point, cannot be interrupted.
    pub fn rest(&mut self) -> Result<(), UnitError> {
        self.ensure_alive()?;
        self.reject_if(
            self.activity.is_falling() || self.activity.is_attacking(),
            "rest",
        )?;
        if self.hp.is_full() && self.stamina.is_full() {
            return Ok(());
        }
        self.begin_forced_rest();
        Ok(())
    }

    pub(crate) fn begin_forced_rest(&mut self) {
        self.activity = Activity::Resting;
        self.min_rest = self.min_rest_duration();
        self.auto_rest = 0.0;
    }

    /// Seconds needed to recover one hit point.
    pub fn min_rest_duration(&self) -> f64 {
        0.2 / (f64::from(self.toughness()) / 200.0)
    }
}
