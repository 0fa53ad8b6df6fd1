//! Tunables for unit behaviour.
//!
//! [`UnitConfig`] bundles every constant the state machine uses so the
//! world driver can load overrides from `delve-config.yaml` under the
//! `units` key. The defaults reproduce the classic rules exactly.

use serde::{Deserialize, Serialize};

/// Configuration for unit timers, combat odds, and movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Hit points lost per cube fallen (default: 10).
    pub fall_damage: u32,

    /// Falling speed in cubes per second (default: 3.0).
    pub fall_speed: f64,

    /// Seconds between starting an attack and the strike (default: 1.0).
    pub attack_duration: f64,

    /// Work effort; a job takes `work_effort / strength` seconds (default: 500).
    pub work_effort: f64,

    /// Seconds of activity after which a unit rests on its own (default: 180).
    pub auto_rest_interval: f64,

    /// Seconds of sprinting that cost one stamina point (default: 0.1).
    pub sprint_stamina_interval: f64,

    /// Base dodge chance, scaled by the agility ratio (default: 0.20).
    pub dodge_chance: f64,

    /// Base block chance, scaled by the strength+agility ratio (default: 0.25).
    pub block_chance: f64,

    /// Experience points needed per level (default: 10).
    pub experience_per_level: u32,

    /// Weight gained from an equipment upgrade at a workshop (default: 5).
    pub upgrade_weight: u32,

    /// Toughness gained from an equipment upgrade at a workshop (default: 10).
    pub upgrade_toughness: u32,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            fall_damage: 10,
            fall_speed: 3.0,
            attack_duration: 1.0,
            work_effort: 500.0,
            auto_rest_interval: 180.0,
            sprint_stamina_interval: 0.1,
            dodge_chance: 0.20,
            block_chance: 0.25,
            experience_per_level: 10,
            upgrade_weight: 5,
            upgrade_toughness: 10,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: UnitConfig = serde_json::from_str(r#"{"fall_damage": 4}"#).unwrap();
        assert_eq!(config.fall_damage, 4);
        assert_eq!(config.experience_per_level, 10);
        assert!((config.attack_duration - 1.0).abs() < f64::EPSILON);
    }
}
