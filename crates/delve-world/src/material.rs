//! Boulders and logs.
//!
//! Materials appear when solid terrain caves in. While lying in the world
//! they live in the [`MaterialRegistry`] and in the occupant set of their
//! cube; a unit that picks one up takes ownership of the value until it
//! drops it again.

use std::collections::BTreeMap;

use delve_types::{CubeCoord, MaterialId, MaterialKind, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Lightest possible material weight.
pub const MIN_MATERIAL_WEIGHT: u32 = 10;

/// Heaviest possible material weight.
pub const MAX_MATERIAL_WEIGHT: u32 = 50;

/// Speed at which unsupported materials fall, in cubes per second.
pub const MATERIAL_FALL_SPEED: f64 = 3.0;

/// A boulder or log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier.
    pub id: MaterialId,
    /// Boulder or log.
    pub kind: MaterialKind,
    /// Weight in `10..=50`.
    pub weight: u32,
    /// Current position; the centre of a cube unless falling.
    pub position: Position,
    /// Current velocity; zero unless falling.
    pub velocity: Position,
}

impl Material {
    /// Create a material with an explicit weight.
    pub fn new(kind: MaterialKind, position: Position, weight: u32) -> Result<Self, WorldError> {
        if !(MIN_MATERIAL_WEIGHT..=MAX_MATERIAL_WEIGHT).contains(&weight) {
            return Err(WorldError::MaterialWeight(weight));
        }
        Ok(Self {
            id: MaterialId::new(),
            kind,
            weight,
            position,
            velocity: Position::ZERO,
        })
    }

    /// Create a material with a uniformly random weight.
    pub fn random<R: Rng + ?Sized>(kind: MaterialKind, position: Position, rng: &mut R) -> Self {
        Self {
            id: MaterialId::new(),
            kind,
            weight: rng.random_range(MIN_MATERIAL_WEIGHT..=MAX_MATERIAL_WEIGHT),
            position,
            velocity: Position::ZERO,
        }
    }

    /// The cube this material is in.
    pub fn cube(&self) -> CubeCoord {
        self.position.cube()
    }

    /// Whether the material is currently falling.
    pub const fn is_falling(&self) -> bool {
        self.velocity.z < 0.0
    }
}

/// Every material lying loose in the world, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialRegistry {
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            materials: BTreeMap::new(),
        }
    }

    /// Register a material, replacing any entry with the same id.
    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.id, material);
    }

    /// Remove and return a material.
    pub fn remove(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.remove(&id)
    }

    /// Look up a material.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Look up a material mutably.
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    /// Whether the material is registered.
    pub fn contains(&self, id: MaterialId) -> bool {
        self.materials.contains_key(&id)
    }

    /// Number of registered materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no materials are registered.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate over all materials in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// All material ids in id order.
    pub fn ids(&self) -> Vec<MaterialId> {
        self.materials.keys().copied().collect()
    }

    /// All materials of the given kind.
    pub fn of_kind(&self, kind: MaterialKind) -> impl Iterator<Item = &Material> {
        self.iter().filter(move |m| m.kind == kind)
    }

    /// All boulders.
    pub fn boulders(&self) -> impl Iterator<Item = &Material> {
        self.of_kind(MaterialKind::Boulder)
    }

    /// All logs.
    pub fn logs(&self) -> impl Iterator<Item = &Material> {
        self.of_kind(MaterialKind::Log)
    }

    /// Materials whose position lies in `coord`.
    pub fn materials_at(&self, coord: CubeCoord) -> impl Iterator<Item = &Material> {
        self.iter().filter(move |m| m.cube() == coord)
    }

    /// The first material of `kind` in `coord`, in id order.
    pub fn first_of_kind_at(&self, coord: CubeCoord, kind: MaterialKind) -> Option<&Material> {
        self.materials_at(coord).find(|m| m.kind == kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn random_weight_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let m = Material::random(MaterialKind::Log, Position::ZERO, &mut rng);
            assert!((MIN_MATERIAL_WEIGHT..=MAX_MATERIAL_WEIGHT).contains(&m.weight));
        }
    }

    #[test]
    fn explicit_weight_is_validated() {
        assert_eq!(
            Material::new(MaterialKind::Boulder, Position::ZERO, 9).err(),
            Some(WorldError::MaterialWeight(9))
        );
        assert!(Material::new(MaterialKind::Boulder, Position::ZERO, 50).is_ok());
    }

    #[test]
    fn registry_queries_by_kind_and_cube() {
        let mut registry = MaterialRegistry::new();
        let here = CubeCoord::new(1, 1, 1);
        let boulder = Material::new(MaterialKind::Boulder, here.center(), 20).unwrap();
        let log = Material::new(MaterialKind::Log, here.center(), 20).unwrap();
        let far_log = Material::new(MaterialKind::Log, CubeCoord::new(3, 3, 3).center(), 20).unwrap();
        let boulder_id = boulder.id;
        registry.insert(boulder);
        registry.insert(log);
        registry.insert(far_log);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.boulders().count(), 1);
        assert_eq!(registry.logs().count(), 2);
        assert_eq!(registry.materials_at(here).count(), 2);
        assert_eq!(
            registry.first_of_kind_at(here, MaterialKind::Boulder).map(|m| m.id),
            Some(boulder_id)
        );
        assert!(registry.remove(boulder_id).is_some());
        assert!(!registry.contains(boulder_id));
    }
}
