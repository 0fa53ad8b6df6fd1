//! What finishing a job does to the world.

use delve_types::{CubeCoord, MaterialId, MaterialKind, Position, TerrainKind};
use delve_world::{CaveInReport, Terrain};
use rand::Rng;

use crate::error::UnitError;
use crate::unit::Unit;

/// The effect of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    /// The carried material was put down in the work cube.
    Dropped {
        /// The material.
        material: MaterialId,
    },
    /// A boulder and a log were used up at a workshop.
    Upgraded {
        /// The consumed boulder.
        boulder: MaterialId,
        /// The consumed log.
        log: MaterialId,
    },
    /// A material was picked up from the work cube.
    PickedUp {
        /// The material.
        material: MaterialId,
    },
    /// The worked rock or tree caved in.
    Collapsed(CaveInReport),
    /// There was nothing to do.
    Nothing,
}

impl Unit {
    /// Apply the effect of finishing work at `target`.
    ///
    /// The first rule that applies wins:
    ///
    /// 1. Carrying something and the target is not solid: drop it there.
    /// 2. The target is a workshop holding a boulder and a log: consume both
    ///    and upgrade equipment.
    /// 3. Hands free and a boulder or log lies at the target: pick it up,
    ///    boulders first.
    /// 4. The target is rock or a tree: collapse it.
    pub(crate) fn work_effect<R: Rng + ?Sized>(
        &mut self,
        target: CubeCoord,
        terrain: &mut Terrain,
        rng: &mut R,
    ) -> Result<WorkOutcome, UnitError> {
        let outcome = self.apply_work(target, terrain, rng)?;
        tracing::debug!(unit = %self.id, %target, outcome = ?outcome, "work finished");
        Ok(outcome)
    }

    fn apply_work<R: Rng + ?Sized>(
        &mut self,
        target: CubeCoord,
        terrain: &mut Terrain,
        rng: &mut R,
    ) -> Result<WorkOutcome, UnitError> {
        let solid = terrain.is_solid(target);
        if let Some(mut material) = self.inventory.take_if(|_| !solid) {
            material.position = target.center();
            material.velocity = Position::ZERO;
            let material = terrain.place_material(material)?;
            return Ok(WorkOutcome::Dropped { material });
        }

        if terrain.kind(target) == Some(TerrainKind::Workshop) {
            let materials = terrain.materials();
            let boulder = materials.first_of_kind_at(target, MaterialKind::Boulder).map(|m| m.id);
            let log = materials.first_of_kind_at(target, MaterialKind::Log).map(|m| m.id);
            if let (Some(boulder), Some(log)) = (boulder, log) {
                terrain.take_material(boulder)?;
                terrain.take_material(log)?;
                self.set_weight(self.weight().saturating_add(self.config.upgrade_weight));
                self.set_toughness(self.toughness().saturating_add(self.config.upgrade_toughness));
                return Ok(WorkOutcome::Upgraded { boulder, log });
            }
        }

        if self.inventory.is_none() {
            let materials = terrain.materials();
            let found = materials
                .first_of_kind_at(target, MaterialKind::Boulder)
                .or_else(|| materials.first_of_kind_at(target, MaterialKind::Log))
                .map(|m| m.id);
            if let Some(id) = found {
                let material = terrain.take_material(id)?;
                self.inventory = Some(material);
                return Ok(WorkOutcome::PickedUp { material: id });
            }
        }

        if solid {
            let report = terrain.collapse(target, rng)?;
            return Ok(WorkOutcome::Collapsed(report));
        }

        Ok(WorkOutcome::Nothing)
    }
}
