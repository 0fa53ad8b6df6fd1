//! Experience and level-ups.
//!
//! Units earn one point per completed hop. Every
//! [`UnitConfig::experience_per_level`](crate::config::UnitConfig) points
//! raise one of strength, agility, or toughness by one, picked uniformly
//! among those still below the cap.

use rand::Rng;

use crate::attributes::MAX_ATTRIBUTE;
use crate::behaviour::TickEvents;
use crate::unit::Unit;

/// The attributes a level-up can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trainable {
    Strength,
    Agility,
    Toughness,
}

impl Unit {
    /// Add experience and apply any level-ups; returns levels gained.
    pub fn add_experience<R: Rng + ?Sized>(&mut self, points: u32, rng: &mut R) -> u32 {
        self.experience = self.experience.saturating_add(points);
        let per_level = self.config.experience_per_level;
        if per_level == 0 {
            return 0;
        }
        let mut levels = 0_u32;
        while self.experience >= per_level {
            self.experience = self.experience.saturating_sub(per_level);
            self.level_up(rng);
            levels = levels.saturating_add(1);
        }
        levels
    }

    pub(crate) fn gain_experience<R: Rng + ?Sized>(
        &mut self,
        points: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        let levels = self.add_experience(points, rng);
        events.level_ups = events.level_ups.saturating_add(levels);
    }

    /// Raise one uncapped trainable attribute by one.
    fn level_up<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let open: Vec<Trainable> = [
            (Trainable::Strength, self.strength()),
            (Trainable::Agility, self.agility()),
            (Trainable::Toughness, self.toughness()),
        ]
        .into_iter()
        .filter(|&(_, value)| value < MAX_ATTRIBUTE)
        .map(|(which, _)| which)
        .collect();
        if open.is_empty() {
            return;
        }
        let Some(&which) = open.get(rng.random_range(0..open.len())) else {
            return;
        };
        match which {
            Trainable::Strength => self.set_strength(self.strength().saturating_add(1)),
            Trainable::Agility => self.set_agility(self.agility().saturating_add(1)),
            Trainable::Toughness => self.set_toughness(self.toughness().saturating_add(1)),
        }
        tracing::debug!(unit = %self.id, attribute = ?which, "level up");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use delve_types::CubeCoord;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::attributes::Attributes;
    use crate::config::UnitConfig;
    use crate::unit::Unit;

    fn unit(strength: u32, agility: u32, toughness: u32) -> Unit {
        let attributes = Attributes::new(strength, agility, toughness, 200).unwrap();
        Unit::new("Learner", CubeCoord::new(0, 0, 0), attributes, UnitConfig::default()).unwrap()
    }

    fn trained(unit: &Unit) -> u32 {
        unit.strength() + unit.agility() + unit.toughness()
    }

    #[test]
    fn ten_points_make_a_level() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut u = unit(50, 50, 50);
        assert_eq!(u.add_experience(9, &mut rng), 0);
        assert_eq!(trained(&u), 150);
        assert_eq!(u.add_experience(1, &mut rng), 1);
        assert_eq!(trained(&u), 151);
        assert_eq!(u.experience(), 0);
        assert_eq!(u.add_experience(25, &mut rng), 2);
        assert_eq!(u.experience(), 5);
        assert_eq!(trained(&u), 153);
    }

    #[test]
    fn capped_attributes_are_skipped() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut u = unit(200, 200, 50);
        u.add_experience(100, &mut rng);
        assert_eq!(u.strength(), 200);
        assert_eq!(u.agility(), 200);
        assert_eq!(u.toughness(), 60);
    }

    #[test]
    fn fully_capped_unit_is_unchanged() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut u = unit(200, 200, 200);
        assert_eq!(u.add_experience(30, &mut rng), 3);
        assert_eq!(trained(&u), 600);
    }

    #[test]
    fn toughness_gain_raises_max_hp() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut u = unit(200, 200, 100);
        let before = u.hp().max();
        u.add_experience(10, &mut rng);
        assert_eq!(u.toughness(), 101);
        assert!(u.hp().max() > before);
    }
}
