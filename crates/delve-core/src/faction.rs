//! Faction membership and capacity rules.
//!
//! A world holds at most [`MAX_FACTIONS`] factions of at most
//! [`MAX_UNITS_PER_FACTION`] units each. Factions are kept in creation
//! order so automatic assignment is deterministic.

use std::collections::BTreeSet;

use delve_types::{FactionId, UnitId};

use crate::error::CoreError;

/// Maximum number of factions in one world.
pub const MAX_FACTIONS: usize = 5;

/// Maximum number of units in one faction.
pub const MAX_UNITS_PER_FACTION: usize = 50;

/// One faction and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Faction {
    id: FactionId,
    members: BTreeSet<UnitId>,
}

/// Every faction in a world, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactionRegistry {
    factions: Vec<Faction>,
}

impl FactionRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            factions: Vec::new(),
        }
    }

    /// Number of factions, including empty ones.
    pub const fn len(&self) -> usize {
        self.factions.len()
    }

    /// Whether no faction exists yet.
    pub const fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    /// Create an empty faction.
    pub fn create(&mut self) -> Result<FactionId, CoreError> {
        if self.factions.len() >= MAX_FACTIONS {
            return Err(CoreError::FactionLimit { max: MAX_FACTIONS });
        }
        let id = FactionId::new();
        self.factions.push(Faction {
            id,
            members: BTreeSet::new(),
        });
        tracing::debug!(faction = %id, count = self.factions.len(), "faction created");
        Ok(id)
    }

    /// Whether `faction` exists.
    pub fn contains(&self, faction: FactionId) -> bool {
        self.find(faction).is_some()
    }

    /// Members of `faction`.
    pub fn members(&self, faction: FactionId) -> Option<&BTreeSet<UnitId>> {
        self.find(faction).map(|f| &f.members)
    }

    /// The faction `unit` belongs to.
    pub fn faction_of(&self, unit: UnitId) -> Option<FactionId> {
        self.factions
            .iter()
            .find(|f| f.members.contains(&unit))
            .map(|f| f.id)
    }

    /// Factions with at least one member, in creation order.
    pub fn active_factions(&self) -> Vec<FactionId> {
        self.factions
            .iter()
            .filter(|f| !f.members.is_empty())
            .map(|f| f.id)
            .collect()
    }

    /// Every faction id, in creation order.
    pub fn ids(&self) -> Vec<FactionId> {
        self.factions.iter().map(|f| f.id).collect()
    }

    /// Check that `faction` exists and has room for one more member.
    pub fn check_room(&self, faction: FactionId) -> Result<(), CoreError> {
        let entry = self.find(faction).ok_or(CoreError::FactionNotFound(faction))?;
        if entry.members.len() >= MAX_UNITS_PER_FACTION {
            return Err(CoreError::FactionFull {
                faction,
                max: MAX_UNITS_PER_FACTION,
            });
        }
        Ok(())
    }

    /// Add `unit` to `faction`.
    pub fn add_member(&mut self, faction: FactionId, unit: UnitId) -> Result<(), CoreError> {
        self.check_room(faction)?;
        if let Some(entry) = self.factions.iter_mut().find(|f| f.id == faction) {
            entry.members.insert(unit);
        }
        Ok(())
    }

    /// Remove `unit` from whichever faction holds it.
    pub fn remove_member(&mut self, unit: UnitId) -> Option<FactionId> {
        let entry = self.factions.iter_mut().find(|f| f.members.contains(&unit))?;
        entry.members.remove(&unit);
        Some(entry.id)
    }

    /// Pick the faction a new unit should join.
    ///
    /// While fewer than [`MAX_FACTIONS`] factions exist a new one is
    /// created; afterwards the smallest faction with room is chosen, the
    /// oldest winning ties.
    pub fn assign(&mut self) -> Result<FactionId, CoreError> {
        if self.factions.len() < MAX_FACTIONS {
            return self.create();
        }
        self.factions
            .iter()
            .filter(|f| f.members.len() < MAX_UNITS_PER_FACTION)
            .min_by_key(|f| f.members.len())
            .map(|f| f.id)
            .ok_or(CoreError::FactionLimit { max: MAX_FACTIONS })
    }

    fn find(&self, faction: FactionId) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == faction)
    }
}
