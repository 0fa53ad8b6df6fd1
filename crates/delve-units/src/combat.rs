//! Attacks, defence, damage, and death.
//!
//! Combat is resolved in two halves. [`Unit::attack`] starts a one-second
//! wind-up on the attacker; when it runs out the attacker's tick reports a
//! [`Strike`](crate::behaviour::Strike) and the world calls
//! [`Unit::defend`] on the target with the attacker's [`CombatProfile`].
//! The profile is a plain snapshot, so the two units are never borrowed at
//! the same time.

use delve_types::{ActivityKind, CubeCoord, FactionId, MaterialId, Position, UnitId};
use delve_world::{Occupant, Terrain};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::error::UnitError;
use crate::unit::Unit;

/// The parts of a unit that combat rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    /// The unit.
    pub id: UnitId,
    /// Where it stands.
    pub position: Position,
    /// Its faction, if any.
    pub faction: Option<FactionId>,
    /// Current strength.
    pub strength: u32,
    /// Current agility.
    pub agility: u32,
    /// What it is doing.
    pub activity: ActivityKind,
    /// Whether it is dead.
    pub terminated: bool,
}

impl CombatProfile {
    /// The cube the unit occupies.
    pub fn cube(&self) -> CubeCoord {
        self.position.cube()
    }

    const fn is_busy(&self) -> bool {
        matches!(self.activity, ActivityKind::Attacking | ActivityKind::Falling)
    }
}

/// How a defence played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DefenceOutcome {
    /// The defender jumped to a neighbouring cube.
    Dodged {
        /// Cube before the dodge.
        from: CubeCoord,
        /// Cube after the dodge.
        to: CubeCoord,
    },
    /// The defender parried the blow.
    Blocked,
    /// The defender was hurt and survived.
    Hit {
        /// Hit points lost.
        damage: u32,
    },
    /// The blow was fatal.
    Killed {
        /// Hit points lost.
        damage: u32,
    },
}

impl DefenceOutcome {
    /// Hit points lost, zero for dodges and blocks.
    pub const fn damage(&self) -> u32 {
        match self {
            Self::Dodged { .. } | Self::Blocked => 0,
            Self::Hit { damage } | Self::Killed { damage } => *damage,
        }
    }
}

impl Unit {
    /// Snapshot of this unit for combat checks.
    pub fn combat_profile(&self) -> CombatProfile {
        CombatProfile {
            id: self.id,
            position: self.position,
            faction: self.faction,
            strength: self.strength(),
            agility: self.agility(),
            activity: self.activity.kind(),
            terminated: self.terminated,
        }
    }

    /// Start attacking `target`.
    ///
    /// Both units must be free of attacks and falls, stand in the same or
    /// adjacent cubes, and belong to different factions. Cancels any
    /// uninterruptible rest.
    pub fn attack(&mut self, target: &CombatProfile) -> Result<(), UnitError> {
        self.ensure_alive()?;
        if target.terminated {
            return Err(UnitError::Terminated { unit: target.id });
        }
        self.reject_if(
            self.activity.is_attacking() || self.activity.is_falling(),
            "attack",
        )?;
        if target.is_busy() {
            return Err(UnitError::InvalidState {
                activity: target.activity,
                action: "be attacked",
            });
        }
        if target.id == self.id {
            return Err(UnitError::SelfTarget { unit: self.id });
        }
        let here = self.cube();
        if !here.is_same_or_adjacent(target.cube()) {
            return Err(UnitError::NotAdjacent {
                from: here,
                to: target.cube(),
            });
        }
        if let Some(faction) = self.faction.filter(|f| target.faction == Some(*f)) {
            return Err(UnitError::SameFaction { faction });
        }

        self.min_rest = 0.0;
        self.activity = Activity::Attacking {
            target: target.id,
            remaining: self.config.attack_duration,
        };
        self.face(target.position);
        tracing::debug!(attacker = %self.id, target = %target.id, "attack started");
        Ok(())
    }

    /// Resolve a strike from `attacker`.
    ///
    /// The defender first tries to dodge, then to block, and otherwise takes
    /// damage equal to the attacker's strength. Whatever happens the
    /// defender stops moving and turns toward the attacker.
    pub fn defend<R: Rng + ?Sized>(
        &mut self,
        attacker: &CombatProfile,
        terrain: &mut Terrain,
        rng: &mut R,
    ) -> Result<DefenceOutcome, UnitError> {
        self.ensure_alive()?;
        self.ensure_attached()?;
        self.reject_if(self.activity.is_falling(), "defend")?;

        self.min_rest = 0.0;
        self.activity = Activity::Idle;
        self.halt();
        self.face(attacker.position);

        let agility = f64::from(self.agility());
        let strength = f64::from(self.strength());
        let attacker_agility = f64::from(attacker.agility);
        let attacker_strength = f64::from(attacker.strength);

        let dodge = self.config.dodge_chance * (agility / attacker_agility);
        if rng.random::<f64>() < dodge {
            let from = self.cube();
            let options = terrain.standing_neighbors(from);
            if !options.is_empty() {
                let pick = rng.random_range(0..options.len());
                if let Some(&to) = options.get(pick) {
                    self.set_position(to.center(), terrain)?;
                    self.halt();
                    tracing::debug!(defender = %self.id, attacker = %attacker.id, %to, "dodged");
                    return Ok(DefenceOutcome::Dodged { from, to });
                }
            }
        }

        let block = self.config.block_chance
            * ((strength + agility) / (attacker_strength + attacker_agility));
        if rng.random::<f64>() < block {
            tracing::debug!(defender = %self.id, attacker = %attacker.id, "blocked");
            return Ok(DefenceOutcome::Blocked);
        }

        let damage = self.hp.displayed().min(attacker.strength);
        if self.take_damage(damage, terrain)? {
            return Ok(DefenceOutcome::Killed { damage });
        }
        self.begin_forced_rest();
        tracing::debug!(defender = %self.id, attacker = %attacker.id, damage, "hit");
        Ok(DefenceOutcome::Hit { damage })
    }

    /// Lose `amount` hit points; returns whether the unit died.
    pub fn take_damage(&mut self, amount: u32, terrain: &mut Terrain) -> Result<bool, UnitError> {
        self.ensure_alive()?;
        if self.hp.displayed() <= amount {
            self.terminate(terrain)?;
            return Ok(true);
        }
        self.hp.drain(f64::from(amount));
        Ok(false)
    }

    /// Kill the unit.
    ///
    /// The unit leaves its cube and drops whatever it carries there.
    /// Returns the dropped material, if any.
    pub fn terminate(&mut self, terrain: &mut Terrain) -> Result<Option<MaterialId>, UnitError> {
        self.ensure_alive()?;
        let cube = self.cube();
        if self.attached {
            terrain.remove_occupant(cube, Occupant::Unit(self.id))?;
            self.attached = false;
        }
        let dropped = match self.inventory.take() {
            Some(mut material) => {
                material.position = cube.center();
                material.velocity = Position::ZERO;
                Some(terrain.place_material(material)?)
            }
            None => None,
        };
        self.hp.drain(self.hp.current());
        self.terminated = true;
        self.activity = Activity::Idle;
        self.min_rest = 0.0;
        self.sprinting = false;
        self.default_behaviour = false;
        self.halt();
        tracing::debug!(unit = %self.id, name = %self.name, %cube, "unit terminated");
        Ok(dropped)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use delve_types::{MaterialKind, TerrainKind};
    use delve_world::Material;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::attributes::Attributes;
    use crate::config::UnitConfig;

    fn floor_terrain() -> Terrain {
        Terrain::from_codes(&vec![vec![vec![1, 0, 0]; 5]; 5]).unwrap()
    }

    fn fighter(terrain: &mut Terrain, name: &str, cube: CubeCoord) -> Unit {
        let attributes = Attributes::new(50, 50, 50, 50).unwrap();
        let mut unit = Unit::new(name, cube, attributes, UnitConfig::default()).unwrap();
        unit.attach(terrain).unwrap();
        unit
    }

    #[test]
    fn attack_requires_adjacency() {
        let mut terrain = floor_terrain();
        let mut a = fighter(&mut terrain, "Alpha", CubeCoord::new(0, 0, 1));
        let b = fighter(&mut terrain, "Bravo", CubeCoord::new(3, 3, 1));
        assert!(matches!(
            a.attack(&b.combat_profile()),
            Err(UnitError::NotAdjacent { .. })
        ));
    }

    #[test]
    fn attack_rejects_self_and_allies() {
        let mut terrain = floor_terrain();
        let mut a = fighter(&mut terrain, "Alpha", CubeCoord::new(1, 1, 1));
        let mut b = fighter(&mut terrain, "Bravo", CubeCoord::new(2, 1, 1));
        let me = a.combat_profile();
        assert_eq!(a.attack(&me), Err(UnitError::SelfTarget { unit: a.id() }));

        let faction = FactionId::new();
        a.set_faction(Some(faction));
        b.set_faction(Some(faction));
        assert_eq!(
            a.attack(&b.combat_profile()),
            Err(UnitError::SameFaction { faction })
        );
    }

    #[test]
    fn attack_rejects_busy_parties() {
        let mut terrain = floor_terrain();
        let mut a = fighter(&mut terrain, "Alpha", CubeCoord::new(1, 1, 1));
        let mut b = fighter(&mut terrain, "Bravo", CubeCoord::new(2, 1, 1));
        let mut c = fighter(&mut terrain, "Charlie", CubeCoord::new(1, 2, 1));
        a.attack(&b.combat_profile()).unwrap();
        assert_eq!(a.activity_kind(), ActivityKind::Attacking);
        // The attacker cannot start a second attack.
        assert!(matches!(
            a.attack(&c.combat_profile()),
            Err(UnitError::InvalidState { .. })
        ));
        // Nobody can attack a unit that is attacking.
        assert!(matches!(
            c.attack(&a.combat_profile()),
            Err(UnitError::InvalidState { .. })
        ));
        // The target may still strike back.
        b.attack(&c.combat_profile()).unwrap();
    }

    #[test]
    fn attack_cancels_forced_rest() {
        let mut terrain = floor_terrain();
        let mut a = fighter(&mut terrain, "Alpha", CubeCoord::new(1, 1, 1));
        let b = fighter(&mut terrain, "Bravo", CubeCoord::new(2, 1, 1));
        a.hp.drain(5.0);
        a.rest().unwrap();
        assert!(a.min_rest_remaining() > 0.0);
        a.attack(&b.combat_profile()).unwrap();
        assert!(a.min_rest_remaining().abs() < f64::EPSILON);
        assert!(a.orientation().abs() < 1e-9);
    }

    #[test]
    fn defend_outcomes_are_exclusive() {
        let mut terrain = floor_terrain();
        let mut rng = SmallRng::seed_from_u64(42);
        let attacker = fighter(&mut terrain, "Alpha", CubeCoord::new(2, 2, 1));
        let mut target = fighter(&mut terrain, "Bravo", CubeCoord::new(2, 3, 1));
        let profile = attacker.combat_profile();
        let (mut dodged, mut blocked, mut hit) = (0, 0, 0);
        for _ in 0..1000 {
            if target.is_terminated() {
                break;
            }
            let before_cube = target.cube();
            let before_hp = target.hp().displayed();
            match target.defend(&profile, &mut terrain, &mut rng).unwrap() {
                DefenceOutcome::Dodged { from, to } => {
                    assert_eq!(from, before_cube);
                    assert_eq!(target.cube(), to);
                    assert!(from.is_adjacent(to));
                    assert_eq!(target.hp().displayed(), before_hp);
                    dodged += 1;
                }
                DefenceOutcome::Blocked => {
                    assert_eq!(target.cube(), before_cube);
                    assert_eq!(target.hp().displayed(), before_hp);
                    blocked += 1;
                }
                DefenceOutcome::Hit { damage } | DefenceOutcome::Killed { damage } => {
                    assert_eq!(damage, before_hp.min(50));
                    hit += 1;
                }
            }
            assert!(target.at_next_position());
            assert!(target.at_destination());
            // Heal back up so the loop keeps running.
            target.hp.fill(200.0);
            target.min_rest = 0.0;
        }
        assert!(dodged > 0 && blocked > 0 && hit > 0);
        assert_eq!(dodged + blocked + hit, 1000);
    }

    #[test]
    fn lethal_hit_terminates_and_drops_inventory() {
        let mut terrain = floor_terrain();
        let mut rng = SmallRng::seed_from_u64(3);
        let config = UnitConfig {
            dodge_chance: 0.0,
            block_chance: 0.0,
            ..UnitConfig::default()
        };
        let attacker = fighter(&mut terrain, "Alpha", CubeCoord::new(2, 2, 1));
        let mut target = Unit::new(
            "Bravo",
            CubeCoord::new(2, 3, 1),
            Attributes::new(50, 50, 50, 50).unwrap(),
            config,
        )
        .unwrap();
        target.attach(&mut terrain).unwrap();
        let boulder = Material::new(MaterialKind::Boulder, Position::ZERO, 20).unwrap();
        let boulder_id = boulder.id;
        target.inventory = Some(boulder);
        target.hp.drain(160.0);

        let outcome = target
            .defend(&attacker.combat_profile(), &mut terrain, &mut rng)
            .unwrap();
        assert_eq!(outcome, DefenceOutcome::Killed { damage: 40 });
        assert!(target.is_terminated());
        assert!(target.inventory().is_none());
        let dropped = terrain.materials().get(boulder_id).unwrap();
        assert_eq!(dropped.cube(), CubeCoord::new(2, 3, 1));
        let occupants = terrain.grid().occupants(CubeCoord::new(2, 3, 1)).unwrap();
        assert!(!occupants.contains(&Occupant::Unit(target.id())));
        assert_eq!(terrain.kind(CubeCoord::new(2, 3, 1)), Some(TerrainKind::Air));
    }

    #[test]
    fn surviving_a_hit_starts_forced_rest() {
        let mut terrain = floor_terrain();
        let mut rng = SmallRng::seed_from_u64(5);
        let config = UnitConfig {
            dodge_chance: 0.0,
            block_chance: 0.0,
            ..UnitConfig::default()
        };
        let attacker = fighter(&mut terrain, "Alpha", CubeCoord::new(2, 2, 1));
        let mut target =
            Unit::new("Bravo", CubeCoord::new(2, 3, 1), Attributes::new(50, 50, 50, 50).unwrap(), config)
                .unwrap();
        target.attach(&mut terrain).unwrap();
        let outcome = target
            .defend(&attacker.combat_profile(), &mut terrain, &mut rng)
            .unwrap();
        assert_eq!(outcome.damage(), 50);
        assert_eq!(target.hp().displayed(), 150);
        assert_eq!(target.activity_kind(), ActivityKind::Resting);
    }

    #[test]
    fn terminated_units_reject_everything() {
        let mut terrain = floor_terrain();
        let mut unit = fighter(&mut terrain, "Alpha", CubeCoord::new(2, 2, 1));
        let other = fighter(&mut terrain, "Bravo", CubeCoord::new(2, 3, 1));
        unit.terminate(&mut terrain).unwrap();
        let dead = Err(UnitError::Terminated { unit: unit.id() });
        assert_eq!(unit.rest(), dead);
        assert_eq!(unit.attack(&other.combat_profile()), dead);
        assert_eq!(unit.terminate(&mut terrain), Err(UnitError::Terminated { unit: unit.id() }));
    }
}
