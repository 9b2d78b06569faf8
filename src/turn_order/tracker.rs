//! Faction population tracking
//!
//! The scheduler never looks at units directly. It asks a [`PopulationSource`]
//! how many units of each faction can still act this turn. [`Roster`] is an
//! in-memory implementation for headless runs and tests.
//!
//! Auto-controlled units (berserk, or handed to the AI) never take a queued
//! slot. They act together once the queue has run dry, before the next turn
//! is built.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TurnError};
use crate::core::types::UnitId;
use crate::turn_order::faction::{Faction, PopulationSnapshot};

/// Anything that can count eligible units per faction
pub trait PopulationSource {
    /// Units of `faction` that are alive, controllable and have not acted
    fn eligible(&self, faction: Faction) -> u32;

    /// Auto-controlled units still waiting for the end-of-turn phase
    fn auto_pending(&self) -> u32 {
        0
    }

    fn snapshot(&self) -> PopulationSnapshot {
        let mut snapshot = PopulationSnapshot::default();
        for faction in Faction::PRIORITY {
            snapshot[faction] = self.eligible(faction);
        }
        snapshot
    }
}

impl PopulationSource for PopulationSnapshot {
    fn eligible(&self, faction: Faction) -> u32 {
        self[faction]
    }
}

/// A unit as the scheduler's roster sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterUnit {
    pub id: UnitId,
    pub faction: Faction,
    pub alive: bool,
    /// Has taken (or passed) its action this turn
    pub acted: bool,
    /// False under control-denying states such as sleep
    pub controllable: bool,
    /// Acts on its own (berserk or AI-driven) in the end-of-turn phase
    pub auto_controlled: bool,
    /// Carried by another unit and acting through it
    pub fused: bool,
}

impl RosterUnit {
    pub fn new(faction: Faction) -> Self {
        Self {
            id: UnitId::new(),
            faction,
            alive: true,
            acted: false,
            controllable: true,
            auto_controlled: false,
            fused: false,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.alive && !self.acted && self.controllable && !self.auto_controlled && !self.fused
    }

    /// Still owed an action in the end-of-turn auto phase
    pub fn awaits_auto_phase(&self) -> bool {
        self.alive && !self.acted && self.auto_controlled && !self.fused
    }
}

/// Every unit on the map, in spawn order
#[derive(Debug, Clone, Default)]
pub struct Roster {
    units: Vec<RosterUnit>,
    index: AHashMap<UnitId, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster with `counts` fresh units per faction
    pub fn with_counts(counts: &PopulationSnapshot) -> Self {
        let mut roster = Self::new();
        for (faction, n) in counts.iter() {
            for _ in 0..n {
                roster.spawn(faction);
            }
        }
        roster
    }

    /// Add a new unit; returns its id
    pub fn spawn(&mut self, faction: Faction) -> UnitId {
        let unit = RosterUnit::new(faction);
        let id = unit.id;
        self.index.insert(id, self.units.len());
        self.units.push(unit);
        id
    }

    pub fn get(&self, id: UnitId) -> Option<&RosterUnit> {
        self.index.get(&id).map(|&i| &self.units[i])
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut RosterUnit> {
        let i = *self.index.get(&id).ok_or(TurnError::UnitNotFound(id))?;
        Ok(&mut self.units[i])
    }

    pub fn kill(&mut self, id: UnitId) -> Result<Faction> {
        let unit = self.unit_mut(id)?;
        unit.alive = false;
        Ok(unit.faction)
    }

    /// Move a unit to another side; returns the faction it left
    pub fn set_affiliation(&mut self, id: UnitId, faction: Faction) -> Result<Faction> {
        let unit = self.unit_mut(id)?;
        let previous = unit.faction;
        unit.faction = faction;
        Ok(previous)
    }

    pub fn mark_acted(&mut self, id: UnitId) -> Result<Faction> {
        let unit = self.unit_mut(id)?;
        unit.acted = true;
        Ok(unit.faction)
    }

    pub fn set_controllable(&mut self, id: UnitId, controllable: bool) -> Result<()> {
        self.unit_mut(id)?.controllable = controllable;
        Ok(())
    }

    /// Hand a unit to (or take it back from) automatic control
    pub fn set_auto_controlled(&mut self, id: UnitId, auto_controlled: bool) -> Result<()> {
        self.unit_mut(id)?.auto_controlled = auto_controlled;
        Ok(())
    }

    pub fn set_fused(&mut self, id: UnitId, fused: bool) -> Result<()> {
        self.unit_mut(id)?.fused = fused;
        Ok(())
    }

    /// Clear every living unit's acted flag at a new-turn boundary
    pub fn begin_turn(&mut self) {
        for unit in self.units.iter_mut().filter(|u| u.alive) {
            unit.acted = false;
        }
    }

    /// Mark every unit of `faction` as acted ("End Turn"); returns how many changed
    pub fn end_faction_turn(&mut self, faction: Faction) -> usize {
        let mut changed = 0;
        for unit in self
            .units
            .iter_mut()
            .filter(|u| u.alive && u.faction == faction && !u.acted)
        {
            unit.acted = true;
            changed += 1;
        }
        changed
    }

    /// First eligible unit of `faction` in spawn order
    pub fn next_ready(&self, faction: Faction) -> Option<UnitId> {
        self.units
            .iter()
            .find(|u| u.faction == faction && u.is_eligible())
            .map(|u| u.id)
    }

    /// Units due to act in the end-of-turn auto phase, priority then spawn order
    pub fn auto_actors(&self) -> Vec<UnitId> {
        Faction::PRIORITY
            .into_iter()
            .flat_map(|faction| {
                self.units
                    .iter()
                    .filter(move |u| u.faction == faction && u.awaits_auto_phase())
            })
            .map(|u| u.id)
            .collect()
    }

    /// Living units of `faction`
    pub fn units_of(&self, faction: Faction) -> impl Iterator<Item = &RosterUnit> + '_ {
        self.units
            .iter()
            .filter(move |u| u.alive && u.faction == faction)
    }

    /// Number of living units of `faction`
    pub fn alive_count(&self, faction: Faction) -> usize {
        self.units_of(faction).count()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).expect("roster holds more than u32::MAX units")
}

impl PopulationSource for Roster {
    fn eligible(&self, faction: Faction) -> u32 {
        count_u32(
            self.units
                .iter()
                .filter(|u| u.faction == faction && u.is_eligible())
                .count(),
        )
    }

    fn auto_pending(&self) -> u32 {
        count_u32(self.units.iter().filter(|u| u.awaits_auto_phase()).count())
    }
}
