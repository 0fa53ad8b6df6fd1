//! Serializable views of the world: per-tick summaries and full snapshots.

use delve_types::{ActivityKind, CubeCoord, FactionId, MaterialId, MaterialKind, Position, UnitId};
use delve_units::{DefenceOutcome, Unit};
use delve_world::{Dimensions, Material};
use serde::{Deserialize, Serialize};

/// How one strike was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeReport {
    /// The unit that attacked.
    pub attacker: UnitId,
    /// The unit that was struck.
    pub target: UnitId,
    /// The defence result; `None` when the target had died, was falling,
    /// or had moved out of reach.
    pub outcome: Option<DefenceOutcome>,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Simulated seconds elapsed at the end of the tick.
    pub elapsed: f64,
    /// Number of living units at end of tick.
    pub units_alive: usize,
    /// Strikes resolved this tick.
    pub strikes: Vec<StrikeReport>,
    /// Units that died this tick.
    pub deaths: Vec<UnitId>,
    /// Jobs completed this tick.
    pub work_completed: usize,
    /// Cubes that caved in as a result of work this tick.
    pub cubes_collapsed: usize,
    /// Levels gained this tick.
    pub level_ups: u32,
    /// Hit points lost to falling this tick.
    pub fall_damage: u32,
}

/// Public state of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// The unit.
    pub id: UnitId,
    /// Its name.
    pub name: String,
    /// Its faction.
    pub faction: Option<FactionId>,
    /// Exact position.
    pub position: Position,
    /// Occupied cube.
    pub cube: CubeCoord,
    /// Current activity.
    pub activity: ActivityKind,
    /// Displayed hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Displayed stamina.
    pub stamina: u32,
    /// Experience toward the next level.
    pub experience: u32,
    /// Strength.
    pub strength: u32,
    /// Agility.
    pub agility: u32,
    /// Toughness.
    pub toughness: u32,
    /// Weight.
    pub weight: u32,
    /// What it carries.
    pub carrying: Option<MaterialKind>,
}

impl From<&Unit> for UnitSummary {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            name: unit.name().to_owned(),
            faction: unit.faction(),
            position: unit.position(),
            cube: unit.cube(),
            activity: unit.activity_kind(),
            hp: unit.hp().displayed(),
            max_hp: unit.hp().max(),
            stamina: unit.stamina().displayed(),
            experience: unit.experience(),
            strength: unit.strength(),
            agility: unit.agility(),
            toughness: unit.toughness(),
            weight: unit.weight(),
            carrying: unit.inventory().map(|m| m.kind),
        }
    }
}

/// Public state of one loose material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    /// The material.
    pub id: MaterialId,
    /// Boulder or log.
    pub kind: MaterialKind,
    /// Its weight.
    pub weight: u32,
    /// Exact position.
    pub position: Position,
    /// Whether it is falling.
    pub falling: bool,
}

impl From<&Material> for MaterialSummary {
    fn from(material: &Material) -> Self {
        Self {
            id: material.id,
            kind: material.kind,
            weight: material.weight,
            position: material.position,
            falling: material.is_falling(),
        }
    }
}

/// Everything an observer needs to draw the world, minus the terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Completed ticks.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    /// World extent.
    pub dimensions: Dimensions,
    /// Terrain revision counter.
    pub terrain_revision: u64,
    /// Factions with members.
    pub active_factions: Vec<FactionId>,
    /// Living units.
    pub units: Vec<UnitSummary>,
    /// Loose materials.
    pub materials: Vec<MaterialSummary>,
}
