//! Primary attributes.
//!
//! Strength, agility, toughness, and weight all live in `[1, 200]`. Weight
//! has an additional floor of `(strength + agility) / 2`: a strong, agile
//! unit is never lighter than its muscles. Constructors reject values out
//! of range; setters clamp.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::UnitError;

/// Lowest value of any attribute.
pub const MIN_ATTRIBUTE: u32 = 1;

/// Highest value of any attribute.
pub const MAX_ATTRIBUTE: u32 = 200;

/// Lowest attribute value a randomly generated unit starts with.
pub const MIN_INITIAL_ATTRIBUTE: u32 = 25;

/// Highest attribute value a randomly generated unit starts with.
pub const MAX_INITIAL_ATTRIBUTE: u32 = 100;

/// The four primary attributes of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    strength: u32,
    agility: u32,
    toughness: u32,
    weight: u32,
}

fn check(attribute: &'static str, value: u32) -> Result<u32, UnitError> {
    if (MIN_ATTRIBUTE..=MAX_ATTRIBUTE).contains(&value) {
        Ok(value)
    } else {
        Err(UnitError::AttributeOutOfRange { attribute, value })
    }
}

const fn clamp(value: u32) -> u32 {
    if value < MIN_ATTRIBUTE {
        MIN_ATTRIBUTE
    } else if value > MAX_ATTRIBUTE {
        MAX_ATTRIBUTE
    } else {
        value
    }
}

impl Attributes {
    /// Create attributes, each of which must lie in `[1, 200]`.
    ///
    /// Weight below `(strength + agility) / 2` is raised to that floor.
    pub fn new(strength: u32, agility: u32, toughness: u32, weight: u32) -> Result<Self, UnitError> {
        let mut attributes = Self {
            strength: check("strength", strength)?,
            agility: check("agility", agility)?,
            toughness: check("toughness", toughness)?,
            weight: check("weight", weight)?,
        };
        attributes.apply_weight_floor();
        Ok(attributes)
    }

    /// Draw every attribute uniformly from `[25, 100]`, then apply the weight floor.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let range = MIN_INITIAL_ATTRIBUTE..=MAX_INITIAL_ATTRIBUTE;
        let mut attributes = Self {
            strength: rng.random_range(range.clone()),
            agility: rng.random_range(range.clone()),
            toughness: rng.random_range(range.clone()),
            weight: rng.random_range(range),
        };
        attributes.apply_weight_floor();
        attributes
    }

    /// The minimum weight for the current strength and agility.
    pub const fn weight_floor(&self) -> u32 {
        self.strength.saturating_add(self.agility) / 2
    }

    const fn apply_weight_floor(&mut self) {
        let floor = self.weight_floor();
        if self.weight < floor {
            self.weight = floor;
        }
    }

    /// Strength.
    pub const fn strength(&self) -> u32 {
        self.strength
    }

    /// Agility.
    pub const fn agility(&self) -> u32 {
        self.agility
    }

    /// Toughness.
    pub const fn toughness(&self) -> u32 {
        self.toughness
    }

    /// Weight.
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Set strength, clamped to `[1, 200]`; weight follows the floor.
    pub const fn set_strength(&mut self, value: u32) {
        self.strength = clamp(value);
        self.apply_weight_floor();
    }

    /// Set agility, clamped to `[1, 200]`; weight follows the floor.
    pub const fn set_agility(&mut self, value: u32) {
        self.agility = clamp(value);
        self.apply_weight_floor();
    }

    /// Set toughness, clamped to `[1, 200]`.
    pub const fn set_toughness(&mut self, value: u32) {
        self.toughness = clamp(value);
    }

    /// Set weight, clamped to `[1, 200]` and to the floor.
    pub const fn set_weight(&mut self, value: u32) {
        self.weight = clamp(value);
        self.apply_weight_floor();
    }

    /// Maximum hit points (and stamina): `200 * ceil(w/100) * ceil(t/100)`.
    pub const fn max_hp(&self) -> u32 {
        200_u32
            .saturating_mul(self.weight.div_ceil(100))
            .saturating_mul(self.toughness.div_ceil(100))
    }

    /// Walking speed on level ground in cubes per second.
    pub fn base_speed(&self) -> f64 {
        let drive = f64::from(self.strength) + f64::from(self.agility);
        1.5 * drive / (200.0 * f64::from(self.weight) / 100.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn constructor_rejects_out_of_range() {
        assert_eq!(
            Attributes::new(0, 50, 50, 50).err(),
            Some(UnitError::AttributeOutOfRange { attribute: "strength", value: 0 })
        );
        assert!(Attributes::new(50, 50, 201, 50).is_err());
        assert!(Attributes::new(200, 200, 200, 200).is_ok());
    }

    #[test]
    fn weight_is_raised_to_floor() {
        let a = Attributes::new(100, 60, 50, 10).unwrap();
        assert_eq!(a.weight(), 80);
    }

    #[test]
    fn setters_clamp_and_follow_floor() {
        let mut a = Attributes::new(50, 50, 50, 50).unwrap();
        a.set_toughness(500);
        assert_eq!(a.toughness(), 200);
        a.set_strength(0);
        assert_eq!(a.strength(), 1);
        a.set_strength(150);
        assert_eq!(a.weight(), 100);
        a.set_weight(20);
        assert_eq!(a.weight(), 100);
    }

    #[test]
    fn max_hp_rounds_up_per_hundred() {
        assert_eq!(Attributes::new(50, 50, 50, 50).unwrap().max_hp(), 200);
        assert_eq!(Attributes::new(50, 50, 101, 50).unwrap().max_hp(), 400);
        assert_eq!(Attributes::new(50, 50, 150, 150).unwrap().max_hp(), 800);
    }

    #[test]
    fn base_speed_of_balanced_unit() {
        let a = Attributes::new(50, 50, 50, 50).unwrap();
        assert!((a.base_speed() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn random_attributes_stay_in_initial_range() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100 {
            let a = Attributes::random(&mut rng);
            assert!((25..=100).contains(&a.strength()));
            assert!((25..=100).contains(&a.toughness()));
            assert!(a.weight() >= a.weight_floor());
        }
    }
}
