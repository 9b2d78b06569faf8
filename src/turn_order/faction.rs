//! Factions and per-faction counters
//!
//! Every tie in the scheduler is broken by the fixed order Player > Enemy > Ally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the three independently scheduled groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
    Ally,
}

impl Faction {
    /// All factions in tie-break priority order
    pub const PRIORITY: [Faction; 3] = [Faction::Player, Faction::Enemy, Faction::Ally];

    /// Single-letter tag used when rendering queues
    pub fn symbol(self) -> char {
        match self {
            Faction::Player => 'P',
            Faction::Enemy => 'E',
            Faction::Ally => 'A',
        }
    }

    /// Inverse of [`Faction::symbol`]
    pub fn from_symbol(symbol: char) -> Option<Faction> {
        match symbol.to_ascii_uppercase() {
            'P' => Some(Faction::Player),
            'E' => Some(Faction::Enemy),
            'A' => Some(Faction::Ally),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Faction::Player => "Player",
            Faction::Enemy => "Enemy",
            Faction::Ally => "Ally",
        };
        f.write_str(name)
    }
}

/// A `u32` per faction, indexable by [`Faction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FactionCounts {
    pub player: u32,
    pub enemy: u32,
    pub ally: u32,
}

impl FactionCounts {
    pub fn new(player: u32, enemy: u32, ally: u32) -> Self {
        Self {
            player,
            enemy,
            ally,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.player) + u64::from(self.enemy) + u64::from(self.ally)
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Iterate `(faction, count)` in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Faction, u32)> + '_ {
        Faction::PRIORITY.iter().map(move |&f| (f, self[f]))
    }
}

impl Index<Faction> for FactionCounts {
    type Output = u32;

    fn index(&self, faction: Faction) -> &u32 {
        match faction {
            Faction::Player => &self.player,
            Faction::Enemy => &self.enemy,
            Faction::Ally => &self.ally,
        }
    }
}

impl IndexMut<Faction> for FactionCounts {
    fn index_mut(&mut self, faction: Faction) -> &mut u32 {
        match faction {
            Faction::Player => &mut self.player,
            Faction::Enemy => &mut self.enemy,
            Faction::Ally => &mut self.ally,
        }
    }
}

impl fmt::Display for FactionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}/E{}/A{}", self.player, self.enemy, self.ally)
    }
}

/// Per-faction count of units eligible to act at a point in time
pub type PopulationSnapshot = FactionCounts;
