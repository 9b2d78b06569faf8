//! Turn queue: one faction token per not-yet-resolved unit action
//!
//! The head is the imminent slot. The queue is only ever popped from the
//! head, appended to at the tail, or trimmed. Nothing in here reorders
//! surviving tokens.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::turn_order::faction::{Faction, FactionCounts};

/// Ordered sequence of faction tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnQueue {
    slots: VecDeque<Faction>,
}

impl TurnQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn front(&self) -> Option<Faction> {
        self.slots.front().copied()
    }

    pub fn pop_front(&mut self) -> Option<Faction> {
        self.slots.pop_front()
    }

    pub fn push(&mut self, faction: Faction) {
        self.slots.push_back(faction);
    }

    /// Append `n` tokens of `faction` to the tail
    pub fn push_many(&mut self, faction: Faction, n: u32) {
        self.slots.extend(std::iter::repeat(faction).take(n as usize));
    }

    pub fn iter(&self) -> impl Iterator<Item = Faction> + '_ {
        self.slots.iter().copied()
    }

    /// Number of tokens belonging to `faction`
    pub fn count(&self, faction: Faction) -> u32 {
        let n = self.slots.iter().filter(|&&f| f == faction).count();
        u32::try_from(n).expect("turn queue holds more than u32::MAX tokens of one faction")
    }

    /// Token counts for every faction
    pub fn counts(&self) -> FactionCounts {
        let mut counts = FactionCounts::default();
        for &faction in &self.slots {
            counts[faction] += 1;
        }
        counts
    }

    /// Remove `n` tokens of `faction`, tail first
    ///
    /// # Panics
    /// If fewer than `n` tokens of `faction` are queued. The queue and the
    /// roster have drifted apart and continuing would schedule silently wrong.
    pub fn remove_from_tail(&mut self, faction: Faction, n: u32) {
        let present = self.count(faction);
        assert!(
            present >= n,
            "turn queue desync: asked to remove {} {} tokens but only {} are queued",
            n,
            faction,
            present
        );

        let mut left = n;
        let mut idx = self.slots.len();
        while left > 0 && idx > 0 {
            idx -= 1;
            if self.slots[idx] == faction {
                self.slots.remove(idx);
                left -= 1;
            }
        }
    }

    /// Remove every token of `faction`; returns how many were removed
    pub fn remove_all(&mut self, faction: Faction) -> usize {
        let before = self.slots.len();
        self.slots.retain(|&f| f != faction);
        before - self.slots.len()
    }

    /// First `n` upcoming tokens, head first
    pub fn preview(&self, n: usize) -> Vec<Faction> {
        self.slots.iter().take(n).copied().collect()
    }

    pub fn to_vec(&self) -> Vec<Faction> {
        self.slots.iter().copied().collect()
    }
}

impl From<Vec<Faction>> for TurnQueue {
    fn from(slots: Vec<Faction>) -> Self {
        Self {
            slots: slots.into(),
        }
    }
}

impl FromIterator<Faction> for TurnQueue {
    fn from_iter<I: IntoIterator<Item = Faction>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// Renders as symbols, e.g. `PEPEPP`
impl fmt::Display for TurnQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for faction in &self.slots {
            write!(f, "{}", faction.symbol())?;
        }
        Ok(())
    }
}
