//! Time advancement and the activity dispatcher.
//!
//! [`Unit::advance_time`] runs a loop of sub-steps. Each sub-step looks at
//! the unit's state in a fixed priority order and either finishes the tick
//! or hands the unconsumed part of it to the next sub-step:
//!
//! 1. Falling, always first.
//! 2. Starting to fall, when the unit has lost its footing.
//! 3. Attacking, counting down to the strike.
//! 4. Uninterruptible rest.
//! 5. Automatic rest after a long stretch of activity.
//! 6. Moving along the route.
//! 7. Working, counting down to the work effect.
//! 8. Resting, hit points before stamina.
//! 9. Autonomous behaviour when idle and enabled.
//! 10. Idling, which counts toward the next automatic rest.

use delve_types::{CubeCoord, Position, UnitId, is_valid_time_step};
use delve_world::Terrain;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::error::UnitError;
use crate::unit::Unit;
use crate::work::WorkOutcome;

/// Upper bound on sub-steps in a single call.
const MAX_SUB_STEPS: usize = 64;

/// An attack whose wind-up finished this tick.
///
/// The world resolves it by having the target defend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    /// The unit that attacked.
    pub attacker: UnitId,
    /// The unit being struck.
    pub target: UnitId,
}

/// What happened to a unit during one `advance_time` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Attacks that landed.
    pub strikes: Vec<Strike>,
    /// Completed jobs.
    pub work: Vec<WorkOutcome>,
    /// Levels gained.
    pub level_ups: u32,
    /// Hit points lost to falling.
    pub fall_damage: u32,
    /// Whether the unit died.
    pub terminated: bool,
}

/// Result of one sub-step.
enum Step {
    /// Continue with this many seconds left.
    Continue(f64),
    /// The tick is used up.
    Done,
}

impl Unit {
    /// Advance the unit by `dt` seconds, `0 <= dt < 0.2`.
    pub fn advance_time<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        terrain: &mut Terrain,
        rng: &mut R,
    ) -> Result<TickEvents, UnitError> {
        if !is_valid_time_step(dt) {
            return Err(UnitError::InvalidTimeStep { dt });
        }
        self.ensure_alive()?;
        self.ensure_attached()?;

        let mut events = TickEvents::default();
        let mut remaining = dt;
        for _ in 0..MAX_SUB_STEPS {
            match self.step(remaining, terrain, rng, &mut events)? {
                Step::Continue(left) => remaining = left.max(0.0),
                Step::Done => return Ok(events),
            }
            if self.terminated {
                return Ok(events);
            }
        }
        tracing::warn!(
            unit = %self.id,
            remaining,
            activity = %self.activity.kind(),
            "sub-step limit reached"
        );
        Ok(events)
    }

    fn step<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        terrain: &mut Terrain,
        rng: &mut R,
        events: &mut TickEvents,
    ) -> Result<Step, UnitError> {
        if self.activity.is_falling() {
            return self.fall_step(dt, terrain, events);
        }
        if self.has_lost_footing(terrain) {
            self.start_fall();
            return Ok(Step::Continue(dt));
        }
        if let Activity::Attacking { target, remaining } = self.activity {
            return Ok(self.attack_step(target, remaining, dt, events));
        }
        if self.min_rest > 0.0 {
            return Ok(self.forced_rest_step(dt));
        }
        if self.auto_rest >= self.config.auto_rest_interval {
            self.auto_rest = 0.0;
            self.rest()?;
            return Ok(Step::Continue(dt));
        }
        if self.wants_to_move() {
            return self.move_step(dt, terrain, rng, events);
        }
        match self.activity {
            Activity::Working { target, remaining } => {
                self.work_step(target, remaining, dt, terrain, rng, events)
            }
            Activity::Resting => Ok(self.rest_step(dt)),
            _ if self.default_behaviour => {
                self.act_autonomously(terrain, rng);
                Ok(Step::Done)
            }
            _ => {
                self.auto_rest += dt;
                Ok(Step::Done)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Falling
    // -----------------------------------------------------------------------

    /// Above the ground layer with nothing solid around.
    fn has_lost_footing(&self, terrain: &Terrain) -> bool {
        let cube = self.cube();
        cube.z > 0 && !terrain.has_solid_neighbor(cube)
    }

    fn start_fall(&mut self) {
        let cube = self.cube();
        let below = CubeCoord::new(cube.x, cube.y, cube.z.saturating_sub(1)).center();
        self.activity = Activity::Falling;
        self.min_rest = 0.0;
        self.path.reset();
        self.next_position = below;
        self.destination = below;
        self.velocity = Position::new(0.0, 0.0, -self.config.fall_speed);
        tracing::debug!(unit = %self.id, x = cube.x, y = cube.y, z = cube.z, "unit started falling");
    }

    fn fall_step(
        &mut self,
        dt: f64,
        terrain: &mut Terrain,
        events: &mut TickEvents,
    ) -> Result<Step, UnitError> {
        if !self.at_next_position() {
            let arrived = self.glide(dt, self.config.fall_speed, terrain)?;
            return Ok(arrived.map_or(Step::Done, Step::Continue));
        }

        let damage = self.config.fall_damage;
        events.fall_damage = events.fall_damage.saturating_add(damage);
        if self.take_damage(damage, terrain)? {
            events.terminated = true;
            return Ok(Step::Done);
        }
        if self.has_lost_footing(terrain) {
            self.start_fall();
            return Ok(Step::Continue(dt));
        }
        self.halt();
        if damage > 0 {
            self.begin_forced_rest();
        } else {
            self.activity = Activity::Idle;
        }
        tracing::debug!(unit = %self.id, hp = self.hp.displayed(), "unit landed");
        Ok(Step::Done)
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    fn wants_to_move(&self) -> bool {
        match self.activity {
            Activity::Moving => true,
            Activity::Idle => !self.at_next_position() || !self.at_destination(),
            _ => false,
        }
    }

    /// Move toward the next position at `speed` for up to `time` seconds.
    ///
    /// Returns the unused time if the next position was reached.
    fn glide(
        &mut self,
        time: f64,
        speed: f64,
        terrain: &mut Terrain,
    ) -> Result<Option<f64>, UnitError> {
        let distance = self.position.distance(self.next_position);
        if speed <= 0.0 {
            return Ok(None);
        }
        let needed = distance / speed;
        if needed <= time {
            self.set_position(self.next_position, terrain)?;
            return Ok(Some(time - needed));
        }
        let step = (self.next_position - self.position).scale(speed * time / distance);
        self.set_position(self.position + step, terrain)?;
        Ok(None)
    }

    /// Walk or sprint along the current hop.
    fn travel(&mut self, dt: f64, terrain: &mut Terrain) -> Result<Option<f64>, UnitError> {
        let mut walk = self.velocity.length();
        if walk <= 0.0 {
            self.begin_hop(self.next_position.cube());
            walk = self.velocity.length();
        }

        let mut time = dt;
        if self.sprinting {
            let interval = self.config.sprint_stamina_interval;
            let available = self.stamina.current() * interval;
            let sprint_time = time.min(available);
            if sprint_time <= 0.0 {
                self.sprinting = false;
            } else {
                let arrived = self.glide(sprint_time, 2.0 * walk, terrain)?;
                let used = sprint_time - arrived.unwrap_or(0.0);
                if arrived.is_none() && available <= time {
                    self.stamina.drain(self.stamina.current());
                    self.sprinting = false;
                } else {
                    self.stamina.drain(used / interval);
                }
                if arrived.is_some() {
                    return Ok(Some(dt - used));
                }
                time -= sprint_time;
            }
        }
        if time <= 0.0 {
            return Ok(None);
        }
        self.glide(time, walk, terrain)
    }

    fn move_step<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        terrain: &mut Terrain,
        rng: &mut R,
        events: &mut TickEvents,
    ) -> Result<Step, UnitError> {
        if self.at_destination() {
            self.activity = Activity::Idle;
            self.halt();
            return Ok(Step::Continue(dt));
        }

        if self.at_next_position() {
            let here = self.cube();
            let goal = self.destination.cube();
            if let Some(next) = self.path.next_hop(terrain, here, goal) {
                tracing::trace!(unit = %self.id, x = next.x, y = next.y, z = next.z, "next hop");
                self.begin_hop(next);
            } else {
                tracing::debug!(unit = %self.id, x = goal.x, y = goal.y, z = goal.z, "destination unreachable");
                self.activity = Activity::Idle;
                self.halt();
            }
            return Ok(Step::Continue(dt));
        }

        if !terrain.is_passable(self.next_position.cube()) {
            self.activity = Activity::Idle;
            self.halt();
            return Ok(Step::Continue(dt));
        }

        match self.travel(dt, terrain)? {
            None => {
                self.auto_rest += dt;
                Ok(Step::Done)
            }
            Some(left) => {
                self.auto_rest += dt - left;
                self.velocity = Position::ZERO;
                self.gain_experience(1, rng, events);
                if self.at_destination() {
                    self.activity = Activity::Idle;
                    self.path.reset();
                }
                Ok(Step::Continue(left))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timed activities
    // -----------------------------------------------------------------------

    fn attack_step(&mut self, target: UnitId, remaining: f64, dt: f64, events: &mut TickEvents) -> Step {
        self.auto_rest += dt.min(remaining);
        if remaining > dt {
            self.activity = Activity::Attacking {
                target,
                remaining: remaining - dt,
            };
            return Step::Done;
        }
        self.activity = Activity::Idle;
        events.strikes.push(Strike {
            attacker: self.id,
            target,
        });
        Step::Continue(dt - remaining)
    }

    fn work_step<R: Rng + ?Sized>(
        &mut self,
        target: CubeCoord,
        remaining: f64,
        dt: f64,
        terrain: &mut Terrain,
        rng: &mut R,
        events: &mut TickEvents,
    ) -> Result<Step, UnitError> {
        self.auto_rest += dt.min(remaining);
        if remaining > dt {
            self.activity = Activity::Working {
                target,
                remaining: remaining - dt,
            };
            return Ok(Step::Done);
        }
        self.activity = Activity::Idle;
        let outcome = self.work_effect(target, terrain, rng)?;
        events.work.push(outcome);
        Ok(Step::Continue(dt - remaining))
    }

    /// Recover hit points first, then stamina; returns unused time.
    fn recover(&mut self, time: f64) -> f64 {
        let toughness = f64::from(self.toughness());
        let hp_rate = (toughness / 200.0) / 0.2;
        let stamina_rate = (toughness / 100.0) / 0.2;
        let left = self.hp.recover(hp_rate, time);
        self.stamina.recover(stamina_rate, left)
    }

    fn fully_recovered(&self) -> bool {
        self.hp.is_full() && self.stamina.is_full()
    }

    fn forced_rest_step(&mut self, dt: f64) -> Step {
        self.activity = Activity::Resting;
        let slice = dt.min(self.min_rest);
        let unused = self.recover(slice);
        self.min_rest = (self.min_rest - slice).max(0.0);
        if self.fully_recovered() {
            self.min_rest = 0.0;
            self.activity = Activity::Idle;
            return Step::Continue(dt - slice + unused);
        }
        if dt > slice {
            Step::Continue(dt - slice)
        } else {
            Step::Done
        }
    }

    fn rest_step(&mut self, dt: f64) -> Step {
        let unused = self.recover(dt);
        if !self.fully_recovered() {
            return Step::Done;
        }
        self.activity = Activity::Idle;
        if unused > 0.0 {
            Step::Continue(unused)
        } else {
            Step::Done
        }
    }

    // -----------------------------------------------------------------------
    // Autonomous behaviour
    // -----------------------------------------------------------------------

    /// Pick one of: travel somewhere, work nearby, or rest.
    fn act_autonomously<R: Rng + ?Sized>(&mut self, terrain: &Terrain, rng: &mut R) {
        let result = match rng.random_range(0..3_u8) {
            0 => match terrain.random_standing_position(rng) {
                Some(destination) => {
                    let sprint = rng.random_bool(0.5);
                    self.move_to(destination, terrain).map(|()| {
                        self.sprinting = sprint && self.stamina.displayed() > 0;
                    })
                }
                None => Ok(()),
            },
            1 => {
                let here = self.cube();
                let options: Vec<CubeCoord> = terrain.grid().neighbors(here).collect();
                if options.is_empty() {
                    Ok(())
                } else {
                    let target = options
                        .get(rng.random_range(0..options.len()))
                        .copied()
                        .unwrap_or(here);
                    self.work(target, terrain)
                }
            }
            _ => self.rest(),
        };
        if let Err(err) = result {
            tracing::debug!(unit = %self.id, %err, "autonomous action rejected");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use delve_types::{ActivityKind, CubeOffset};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::attributes::Attributes;
    use crate::config::UnitConfig;

    /// 6x6x4 world: rock floor at z=0, air above.
    fn floor_terrain() -> Terrain {
        Terrain::from_codes(&vec![vec![vec![1, 0, 0, 0]; 6]; 6]).unwrap()
    }

    fn spawn(terrain: &mut Terrain, cube: CubeCoord) -> Unit {
        let attributes = Attributes::new(50, 50, 50, 50).unwrap();
        let mut unit = Unit::new("Walker", cube, attributes, UnitConfig::default()).unwrap();
        unit.attach(terrain).unwrap();
        unit
    }

    #[test]
    fn rejects_bad_time_steps() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(1, 1, 1));
        let mut rng = SmallRng::seed_from_u64(1);
        for dt in [-0.01, 0.2, 1.0] {
            assert_eq!(
                unit.advance_time(dt, &mut terrain, &mut rng).err(),
                Some(UnitError::InvalidTimeStep { dt })
            );
        }
    }

    #[test]
    fn detached_units_cannot_advance() {
        let mut terrain = floor_terrain();
        let attributes = Attributes::new(50, 50, 50, 50).unwrap();
        let mut unit = Unit::new("Ghost", CubeCoord::new(1, 1, 1), attributes, UnitConfig::default()).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            unit.advance_time(0.1, &mut terrain, &mut rng),
            Err(UnitError::Detached { .. })
        ));
    }

    #[test]
    fn single_step_arrives_at_cube_centre() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(1, 1, 1));
        let mut rng = SmallRng::seed_from_u64(2);
        unit.move_to_adjacent(CubeOffset::new(1, 0, 0), &terrain).unwrap();
        for _ in 0..10 {
            unit.advance_time(0.19, &mut terrain, &mut rng).unwrap();
        }
        assert!(unit.position().approx_eq(Position::new(2.5, 1.5, 1.5)));
        assert_eq!(unit.activity_kind(), ActivityKind::Idle);
        assert_eq!(unit.experience(), 1);
        let occupants = terrain.grid().occupants(CubeCoord::new(2, 1, 1)).unwrap();
        assert_eq!(occupants.len(), 1);
    }

    #[test]
    fn next_position_is_self_or_neighbour_centre() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(0, 0, 1));
        let mut rng = SmallRng::seed_from_u64(3);
        unit.move_to(CubeCoord::new(5, 4, 1), &terrain).unwrap();
        for _ in 0..200 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
            let next = unit.next_position();
            let ok = next.approx_eq(unit.position())
                || (unit.cube().is_same_or_adjacent(next.cube())
                    && next.approx_eq(next.cube().center()));
            assert!(ok);
        }
        assert!(unit.position().approx_eq(CubeCoord::new(5, 4, 1).center()));
        assert_eq!(unit.experience(), 5);
    }

    #[test]
    fn sprinting_is_faster_and_costs_stamina() {
        let mut terrain = floor_terrain();
        let mut walker = spawn(&mut terrain, CubeCoord::new(0, 1, 1));
        let mut sprinter = spawn(&mut terrain, CubeCoord::new(0, 3, 1));
        let mut rng = SmallRng::seed_from_u64(4);
        walker.move_to(CubeCoord::new(5, 1, 1), &terrain).unwrap();
        sprinter.move_to(CubeCoord::new(5, 3, 1), &terrain).unwrap();
        sprinter.set_sprinting(true).unwrap();
        for _ in 0..10 {
            walker.advance_time(0.1, &mut terrain, &mut rng).unwrap();
            sprinter.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        }
        assert!(sprinter.position().x > walker.position().x);
        // One second of sprinting costs ten stamina points.
        assert!((sprinter.stamina().current() - 190.0).abs() < 1e-6);
        assert!(walker.stamina().is_full());
        assert!(sprinter.is_sprinting());
    }

    #[test]
    fn losing_footing_falls_and_hurts() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(2, 2, 3));
        let mut rng = SmallRng::seed_from_u64(5);
        unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        assert_eq!(unit.activity_kind(), ActivityKind::Falling);
        let mut damage = 0;
        for _ in 0..20 {
            damage += unit.advance_time(0.1, &mut terrain, &mut rng).unwrap().fall_damage;
            if unit.activity_kind() != ActivityKind::Falling {
                break;
            }
        }
        assert_eq!(damage, 20);
        assert_eq!(unit.hp().displayed(), 180);
        assert_eq!(unit.cube(), CubeCoord::new(2, 2, 1));
        assert_eq!(unit.experience(), 0);
    }

    #[test]
    fn landing_hurt_starts_forced_rest() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(2, 2, 2));
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
            if unit.activity_kind() == ActivityKind::Resting {
                break;
            }
        }
        assert_eq!(unit.hp().displayed(), 190);
        assert_eq!(unit.activity_kind(), ActivityKind::Resting);
        assert!(unit.min_rest_remaining() > 0.0);
        assert!((unit.min_rest_remaining() - unit.min_rest_duration()).abs() < 1e-12);

        assert!(matches!(
            unit.move_to(CubeCoord::new(4, 4, 1), &terrain),
            Err(UnitError::InvalidState { .. })
        ));
        assert!(matches!(
            unit.move_to_adjacent(CubeOffset::new(1, 0, 0), &terrain),
            Err(UnitError::InvalidState { .. })
        ));

        // 0.8 s of forced rest for toughness 50.
        for _ in 0..9 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        }
        assert!(unit.min_rest_remaining().abs() < f64::EPSILON);
        unit.move_to(CubeCoord::new(4, 4, 1), &terrain).unwrap();
    }

    #[test]
    fn harmless_landing_leaves_unit_idle() {
        let mut terrain = floor_terrain();
        let attributes = Attributes::new(50, 50, 50, 50).unwrap();
        let config = UnitConfig {
            fall_damage: 0,
            ..UnitConfig::default()
        };
        let mut unit = Unit::new("Feather", CubeCoord::new(2, 2, 2), attributes, config).unwrap();
        unit.attach(&mut terrain).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        }
        assert_eq!(unit.cube(), CubeCoord::new(2, 2, 1));
        assert_eq!(unit.activity_kind(), ActivityKind::Idle);
        assert!(unit.min_rest_remaining().abs() < f64::EPSILON);
        assert!(unit.hp().is_full());
    }

    #[test]
    fn work_finishes_and_collapses_rock() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(1, 1, 1));
        let mut rng = SmallRng::seed_from_u64(6);
        let target = CubeCoord::new(2, 1, 0);
        unit.work(target, &terrain).unwrap();
        let mut outcomes = Vec::new();
        // 500 / 50 = 10 s of work.
        for _ in 0..101 {
            outcomes.extend(unit.advance_time(0.1, &mut terrain, &mut rng).unwrap().work);
        }
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], WorkOutcome::Collapsed(_)));
        assert!(!terrain.is_solid(target));
        assert_eq!(terrain.materials().boulders().count(), 1);
    }

    #[test]
    fn resting_heals_hp_before_stamina() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(1, 1, 1));
        let mut rng = SmallRng::seed_from_u64(7);
        unit.hp.drain(10.0);
        unit.stamina.drain(10.0);
        unit.rest().unwrap();
        // HP heals 1.25/s; after 4 s it has regained 5 points, stamina none.
        for _ in 0..40 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        }
        assert!((unit.hp().current() - 195.0).abs() < 1e-6);
        assert!((unit.stamina().current() - 190.0).abs() < 1e-9);
        assert_eq!(unit.activity_kind(), ActivityKind::Resting);
        // HP is full after 8 s; the last 2 s give stamina 2.5/s.
        for _ in 0..60 {
            unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        }
        assert!(unit.hp().is_full());
        assert!((unit.stamina().current() - 195.0).abs() < 1e-6);
    }

    #[test]
    fn forced_rest_blocks_movement_until_one_point_healed() {
        let terrain = floor_terrain();
        let mut unit = Unit::new(
            "Sleepy",
            CubeCoord::new(1, 1, 1),
            Attributes::new(50, 50, 50, 50).unwrap(),
            UnitConfig::default(),
        )
        .unwrap();
        unit.hp.drain(3.0);
        unit.rest().unwrap();
        assert!(matches!(
            unit.move_to_adjacent(CubeOffset::new(1, 0, 0), &terrain),
            Err(UnitError::InvalidState { .. })
        ));
    }

    #[test]
    fn auto_rest_kicks_in_after_three_minutes() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(1, 1, 1));
        let mut rng = SmallRng::seed_from_u64(8);
        unit.hp.drain(1.0);
        unit.auto_rest = 179.95;
        unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        assert_eq!(unit.activity_kind(), ActivityKind::Idle);
        unit.advance_time(0.1, &mut terrain, &mut rng).unwrap();
        assert_eq!(unit.activity_kind(), ActivityKind::Resting);
        assert!(unit.auto_rest_elapsed() < 0.2);
    }

    #[test]
    fn default_behaviour_keeps_invariants() {
        let mut terrain = floor_terrain();
        let mut unit = spawn(&mut terrain, CubeCoord::new(2, 2, 1));
        let mut rng = SmallRng::seed_from_u64(9);
        unit.start_default_behaviour();
        for _ in 0..2000 {
            unit.advance_time(0.15, &mut terrain, &mut rng).unwrap();
            assert!(unit.hp().current() <= f64::from(unit.hp().max()));
            assert!(unit.stamina().current() >= 0.0);
            assert!(terrain.contains(unit.cube()));
        }
    }
}
