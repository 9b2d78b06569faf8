//! Queue builder: turns a population snapshot into a full turn order
//!
//! Factions are interleaved in proportion to how many units they have left
//! to place. The most recently placed faction (the "leader") keeps the next
//! slot only while it is still owed proportionally more appearances than
//! every rival. Otherwise the rival with the largest population-weighted
//! wait (`remaining * from_last_turn`) takes it, ties going to the faction
//! earlier in priority order.
//!
//! Integer arithmetic throughout so the same snapshot always yields the
//! same sequence.

use serde::{Deserialize, Serialize};

use crate::turn_order::faction::{Faction, FactionCounts, PopulationSnapshot};
use crate::turn_order::queue::TurnQueue;

/// Run-length bookkeeping at the tail of a built queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive slots held by the most recently placed faction.
    /// Nonzero for at most one faction.
    pub streak: FactionCounts,
    /// Slots placed since each faction last received one
    pub from_last_turn: FactionCounts,
}

impl StreakState {
    /// The faction currently holding a streak, if any
    pub fn leader(&self) -> Option<Faction> {
        Faction::PRIORITY
            .into_iter()
            .find(|&f| self.streak[f] > 0)
    }

    /// Record that `faction` received the next slot
    fn record(&mut self, faction: Faction) {
        for other in Faction::PRIORITY {
            if other == faction {
                self.streak[other] += 1;
                self.from_last_turn[other] = 0;
            } else {
                self.streak[other] = 0;
                self.from_last_turn[other] += 1;
            }
        }
    }
}

/// Working state while a queue is being filled
struct Builder {
    remaining: FactionCounts,
    streaks: StreakState,
    queue: TurnQueue,
}

impl Builder {
    fn new(snapshot: &PopulationSnapshot) -> Self {
        Self {
            remaining: *snapshot,
            streaks: StreakState::default(),
            queue: TurnQueue::with_capacity(snapshot.total() as usize),
        }
    }

    fn place(&mut self, faction: Faction) {
        self.queue.push(faction);
        self.remaining[faction] -= 1;
        self.streaks.record(faction);
    }

    /// Factions other than `exclude` that still have units to place
    fn rivals(&self, exclude: Option<Faction>) -> impl Iterator<Item = Faction> + '_ {
        Faction::PRIORITY
            .into_iter()
            .filter(move |&f| Some(f) != exclude && self.remaining[f] > 0)
    }

    /// Whether the leader is still owed more than `streak + 1` times every rival
    fn leader_keeps_slot(&self, leader: Faction) -> bool {
        let owed = u64::from(self.remaining[leader]);
        let factor = u64::from(self.streaks.streak[leader]) + 1;
        self.rivals(Some(leader))
            .all(|rival| owed > factor * u64::from(self.remaining[rival]))
    }

    /// Rival with the largest `remaining * from_last_turn`, first in priority on ties
    fn most_overdue(&self, exclude: Option<Faction>) -> Option<Faction> {
        let mut best: Option<(Faction, u64)> = None;
        for rival in self.rivals(exclude) {
            let weight =
                u64::from(self.remaining[rival]) * u64::from(self.streaks.from_last_turn[rival]);
            match best {
                Some((_, top)) if weight <= top => {}
                _ => best = Some((rival, weight)),
            }
        }
        best.map(|(faction, _)| faction)
    }

    fn next_faction(&self) -> Option<Faction> {
        let leader = self.streaks.leader();
        if let Some(leader) = leader {
            if self.remaining[leader] > 0 && self.leader_keeps_slot(leader) {
                return Some(leader);
            }
        }
        self.most_overdue(leader)
    }

    fn run(mut self) -> (TurnQueue, StreakState) {
        // Seed: every populated faction gets one slot, in priority order
        for faction in Faction::PRIORITY {
            if self.remaining[faction] > 0 {
                self.place(faction);
            }
        }

        while let Some(faction) = self.next_faction() {
            self.place(faction);
        }

        debug_assert!(self.remaining.is_zero());
        (self.queue, self.streaks)
    }
}

/// Build the full turn order for a new turn
pub fn build(snapshot: &PopulationSnapshot) -> TurnQueue {
    build_with_state(snapshot).0
}

/// Build the turn order and return the streak state left at its tail
pub fn build_with_state(snapshot: &PopulationSnapshot) -> (TurnQueue, StreakState) {
    Builder::new(snapshot).run()
}
