//! Turn controller: the stateful face of the scheduler
//!
//! The turn engine asks [`TurnController::peek_next`] which faction may act,
//! calls [`TurnController::advance`] once per resolved slot, and reports every
//! roster change through [`TurnController::notify`]. When the queue runs dry
//! the engine first lets auto-controlled units act if
//! [`TurnController::auto_phase`] says any are waiting, then starts a new turn
//! with [`TurnController::on_new_turn`].
//!
//! Caller obligation: every population-affecting event between two
//! `advance()` calls must be reconciled before the next `advance()`.

use serde::{Deserialize, Serialize};

use crate::core::config::SchedulerConfig;
use crate::core::error::Result;
use crate::core::types::TurnNumber;
use crate::turn_order::builder::{build_with_state, StreakState};
use crate::turn_order::faction::Faction;
use crate::turn_order::queue::TurnQueue;
use crate::turn_order::reconciler::{reconcile, ReconcileReport};
use crate::turn_order::tracker::PopulationSource;

/// Absolute and relative turn counts; the only persisted scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnCounters {
    pub turn: TurnNumber,
    pub relative_turn: TurnNumber,
}

impl TurnCounters {
    fn increment(&mut self) {
        self.turn += 1;
        self.relative_turn += 1;
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Whether scheduling can continue without a new turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    Empty,
    NonEmpty,
}

/// Result of starting a new turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewTurn {
    /// Queue built with this many slots
    Scheduled(usize),
    /// Nobody can act; the surrounding game should treat the match as over
    NoEligibleUnits,
}

/// Roster changes the engine reports to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterEvent {
    /// A unit of `faction` finished (or passed) its action and was marked acted
    ActionResolved { faction: Faction },
    /// A unit died or left the map
    UnitRemoved { faction: Faction },
    /// A reinforcement joined mid-turn
    ReinforcementArrived { faction: Faction },
    /// A unit switched sides
    AffiliationChanged { from: Faction, to: Faction },
    /// A faction ended its turn early; its units were marked acted
    FactionTurnEnded { faction: Faction },
}

/// Owns one match's queue, streak state and turn counters
#[derive(Debug, Clone, Default)]
pub struct TurnController {
    config: SchedulerConfig,
    queue: TurnQueue,
    streaks: StreakState,
    counters: TurnCounters,
}

impl TurnController {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Resume with counters restored from a save
    pub fn with_counters(config: SchedulerConfig, counters: TurnCounters) -> Self {
        Self {
            config,
            counters,
            ..Self::default()
        }
    }

    /// Faction owning the imminent slot, or `None` when a new turn is due
    pub fn peek_next(&self) -> Option<Faction> {
        self.queue.front()
    }

    pub fn state(&self) -> QueueState {
        if self.queue.is_empty() {
            QueueState::Empty
        } else {
            QueueState::NonEmpty
        }
    }

    /// Consume the head slot after one unit action resolves
    ///
    /// # Panics
    /// On an empty queue. Start a new turn first.
    pub fn advance(&mut self) -> Faction {
        let Some(faction) = self.queue.pop_front() else {
            panic!("advance() called on an empty turn queue; start a new turn first");
        };
        tracing::trace!("{} slot resolved, {} left", faction, self.queue.len());
        faction
    }

    /// Drop every remaining slot of `faction`; returns how many were removed
    pub fn force_flush(&mut self, faction: Faction) -> usize {
        let removed = self.queue.remove_all(faction);
        if removed > 0 {
            tracing::debug!("Flushed {} {} slots", removed, faction);
        }
        removed
    }

    /// Auto-controlled units to run before the next turn is built
    ///
    /// `None` while queued slots remain or when no such unit is waiting.
    /// Auto actions consume no slot: report deaths and side changes they
    /// cause through [`TurnController::notify`], but never `ActionResolved`.
    pub fn auto_phase(&self, source: &impl PopulationSource) -> Option<u32> {
        if !self.queue.is_empty() {
            return None;
        }
        let pending = source.auto_pending();
        if pending == 0 {
            return None;
        }
        tracing::debug!(
            "Turn {} auto phase: {} units act on their own",
            self.counters.turn,
            pending
        );
        Some(pending)
    }

    /// Build the next turn's queue from a fresh snapshot
    ///
    /// # Panics
    /// If slots from the previous turn remain.
    pub fn on_new_turn(&mut self, source: &impl PopulationSource) -> NewTurn {
        assert!(
            self.queue.is_empty(),
            "on_new_turn() called with {} slots still queued",
            self.queue.len()
        );

        let snapshot = source.snapshot();
        let (queue, streaks) = build_with_state(&snapshot);
        self.queue = queue;
        self.streaks = streaks;
        self.counters.increment();

        if self.queue.is_empty() {
            tracing::warn!(
                "Turn {} has no eligible units on any side",
                self.counters.turn
            );
            return NewTurn::NoEligibleUnits;
        }

        tracing::info!(
            "Turn {} begins: {} slots ({})",
            self.counters.turn,
            self.queue.len(),
            snapshot
        );
        if self.config.trace_queue {
            tracing::debug!("Turn {} order: {}", self.counters.turn, self.queue);
        }
        NewTurn::Scheduled(self.queue.len())
    }

    /// Repair the queue tail against the source's live counts
    pub fn reconcile(&mut self, source: &impl PopulationSource) -> ReconcileReport {
        let report = reconcile(&mut self.queue, &source.snapshot());
        if !report.is_noop() {
            tracing::trace!(
                "Reconciled: removed {}, appended {}",
                report.removed,
                report.appended
            );
        }
        report
    }

    /// Apply a roster event and return the resulting queue state
    pub fn notify(&mut self, event: RosterEvent, source: &impl PopulationSource) -> QueueState {
        match event {
            RosterEvent::ActionResolved { faction } => {
                // Deaths only trim the tail, so the head still names the actor
                let resolved = self.advance();
                debug_assert_eq!(
                    resolved, faction,
                    "action resolved for {} but the head slot was {}",
                    faction, resolved
                );
            }
            RosterEvent::FactionTurnEnded { faction } => {
                self.force_flush(faction);
            }
            RosterEvent::UnitRemoved { .. } | RosterEvent::ReinforcementArrived { .. } => {
                tracing::trace!("{:?}", event);
            }
            RosterEvent::AffiliationChanged { from, to } => {
                tracing::debug!("Unit changed sides: {} -> {}", from, to);
            }
        }
        self.reconcile(source);
        self.state()
    }

    /// First `n` upcoming slots, for turn-order display
    pub fn preview(&self, n: usize) -> Vec<Faction> {
        self.queue.preview(n)
    }

    /// Upcoming slots sized for the configured turn window
    pub fn turn_order_display(&self) -> Vec<Faction> {
        self.preview(self.config.preview_len)
    }

    pub fn queue(&self) -> &TurnQueue {
        &self.queue
    }

    /// Streak bookkeeping left by the last build
    pub fn streaks(&self) -> &StreakState {
        &self.streaks
    }

    pub fn counters(&self) -> TurnCounters {
        self.counters
    }

    pub fn turn(&self) -> TurnNumber {
        self.counters.turn
    }

    pub fn relative_turn(&self) -> TurnNumber {
        self.counters.relative_turn
    }

    pub fn reset_relative_turn(&mut self) {
        self.counters.relative_turn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn_order::faction::FactionCounts;
    use crate::turn_order::tracker::Roster;
    use Faction::{Ally as A, Enemy as E, Player as P};

    fn started(snapshot: FactionCounts) -> TurnController {
        let mut controller = TurnController::default();
        controller.on_new_turn(&snapshot);
        controller
    }

    #[test]
    fn test_starts_empty() {
        let controller = TurnController::default();
        assert_eq!(controller.state(), QueueState::Empty);
        assert_eq!(controller.peek_next(), None);
        assert_eq!(controller.turn(), 0);
    }

    #[test]
    fn test_new_turn_builds_and_counts() {
        let mut controller = TurnController::default();

        let result = controller.on_new_turn(&FactionCounts::new(4, 2, 0));

        assert_eq!(result, NewTurn::Scheduled(6));
        assert_eq!(controller.queue().to_vec(), vec![P, E, P, E, P, P]);
        assert_eq!(controller.state(), QueueState::NonEmpty);
        assert_eq!(controller.counters(), TurnCounters { turn: 1, relative_turn: 1 });
        assert_eq!(controller.streaks().leader(), Some(P));
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let controller = started(FactionCounts::new(1, 1, 0));
        assert_eq!(controller.peek_next(), Some(P));
        assert_eq!(controller.peek_next(), Some(P));
        assert_eq!(controller.queue().len(), 2);
    }

    #[test]
    fn test_advance_n_times_empties_queue() {
        let mut controller = started(FactionCounts::new(3, 2, 1));
        let n = controller.queue().len();

        for _ in 0..n - 1 {
            controller.advance();
            assert_eq!(controller.state(), QueueState::NonEmpty);
        }
        controller.advance();

        assert_eq!(controller.state(), QueueState::Empty);
        assert_eq!(controller.peek_next(), None);
    }

    #[test]
    #[should_panic(expected = "empty turn queue")]
    fn test_advance_on_empty_panics() {
        let mut controller = TurnController::default();
        controller.advance();
    }

    #[test]
    #[should_panic(expected = "still queued")]
    fn test_new_turn_requires_empty_queue() {
        let mut controller = started(FactionCounts::new(1, 0, 0));
        controller.on_new_turn(&FactionCounts::new(1, 0, 0));
    }

    #[test]
    fn test_all_zero_snapshot_signals_match_end() {
        let mut controller = TurnController::default();

        let result = controller.on_new_turn(&FactionCounts::default());

        assert_eq!(result, NewTurn::NoEligibleUnits);
        assert_eq!(controller.state(), QueueState::Empty);
        assert_eq!(controller.turn(), 1);
    }

    #[test]
    fn test_force_flush_is_idempotent() {
        let mut controller = started(FactionCounts::new(2, 2, 1));
        assert_eq!(controller.queue().to_vec(), vec![P, E, A, P, E]);

        assert_eq!(controller.force_flush(P), 2);
        assert_eq!(controller.queue().to_vec(), vec![E, A, E]);
        assert_eq!(controller.force_flush(P), 0);
        assert_eq!(controller.queue().to_vec(), vec![E, A, E]);
    }

    #[test]
    fn test_flush_can_drain_to_empty() {
        let mut controller = started(FactionCounts::new(3, 0, 0));
        controller.force_flush(P);
        assert_eq!(controller.state(), QueueState::Empty);

        // Behaves like natural exhaustion: a new turn may start
        assert_eq!(
            controller.on_new_turn(&FactionCounts::new(0, 1, 0)),
            NewTurn::Scheduled(1)
        );
    }

    #[test]
    fn test_flush_then_reconcile_reappends_at_tail() {
        let mut controller = started(FactionCounts::new(2, 2, 0));
        assert_eq!(controller.queue().to_vec(), vec![P, E, P, E]);

        controller.force_flush(P);
        controller.reconcile(&FactionCounts::new(2, 2, 0));

        assert_eq!(controller.queue().to_vec(), vec![E, E, P, P]);
    }

    #[test]
    fn test_notify_action_resolved_advances() {
        let mut roster = Roster::with_counts(&FactionCounts::new(2, 1, 0));
        let mut controller = TurnController::default();
        controller.on_new_turn(&roster);
        assert_eq!(controller.queue().to_vec(), vec![P, E, P]);

        let unit = roster.next_ready(P).unwrap();
        roster.mark_acted(unit).unwrap();
        let state = controller.notify(RosterEvent::ActionResolved { faction: P }, &roster);

        assert_eq!(state, QueueState::NonEmpty);
        assert_eq!(controller.queue().to_vec(), vec![E, P]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "head slot was")]
    fn test_action_resolved_for_wrong_faction_panics() {
        let mut controller = started(FactionCounts::new(1, 1, 0));
        controller.notify(
            RosterEvent::ActionResolved { faction: E },
            &FactionCounts::new(0, 1, 0),
        );
    }

    #[test]
    fn test_auto_phase_waits_for_empty_queue() {
        let mut roster = Roster::with_counts(&FactionCounts::new(2, 1, 0));
        let berserker = roster.next_ready(P).unwrap();
        roster.set_auto_controlled(berserker, true).unwrap();

        let mut controller = TurnController::default();
        controller.on_new_turn(&roster);
        assert_eq!(controller.queue().to_vec(), vec![P, E]);
        assert_eq!(controller.auto_phase(&roster), None);

        while let Some(faction) = controller.peek_next() {
            let unit = roster.next_ready(faction).unwrap();
            roster.mark_acted(unit).unwrap();
            controller.notify(RosterEvent::ActionResolved { faction }, &roster);
        }
        assert_eq!(controller.auto_phase(&roster), Some(1));

        roster.mark_acted(berserker).unwrap();
        assert_eq!(controller.auto_phase(&roster), None);
    }

    #[test]
    fn test_auto_phase_after_flush() {
        let mut roster = Roster::with_counts(&FactionCounts::new(2, 0, 1));
        let ally = roster.next_ready(A).unwrap();
        let mut controller = TurnController::default();
        controller.on_new_turn(&roster);

        roster.set_auto_controlled(ally, true).unwrap();
        controller.reconcile(&roster);
        roster.end_faction_turn(P);
        let state = controller.notify(RosterEvent::FactionTurnEnded { faction: P }, &roster);

        assert_eq!(state, QueueState::Empty);
        assert_eq!(controller.auto_phase(&roster), Some(1));
    }

    #[test]
    fn test_notify_faction_turn_ended() {
        let mut roster = Roster::with_counts(&FactionCounts::new(3, 1, 0));
        let mut controller = TurnController::default();
        controller.on_new_turn(&roster);

        roster.end_faction_turn(P);
        controller.notify(RosterEvent::FactionTurnEnded { faction: P }, &roster);

        assert_eq!(controller.queue().to_vec(), vec![E]);
    }

    #[test]
    fn test_relative_turn_reset() {
        let mut controller = TurnController::default();
        for _ in 0..3 {
            controller.on_new_turn(&FactionCounts::new(1, 0, 0));
            controller.advance();
        }
        controller.reset_relative_turn();
        controller.on_new_turn(&FactionCounts::new(1, 0, 0));

        assert_eq!(controller.turn(), 4);
        assert_eq!(controller.relative_turn(), 1);
    }

    #[test]
    fn test_counters_json_round_trip() {
        let counters = TurnCounters {
            turn: 12,
            relative_turn: 3,
        };
        let json = counters.to_json().unwrap();
        assert_eq!(TurnCounters::from_json(&json).unwrap(), counters);
    }

    #[test]
    fn test_turn_order_display_uses_config() {
        let config = SchedulerConfig {
            preview_len: 3,
            ..SchedulerConfig::default()
        };
        let mut controller = TurnController::new(config);
        controller.on_new_turn(&FactionCounts::new(4, 2, 0));

        assert_eq!(controller.turn_order_display(), vec![P, E, P]);
        assert_eq!(controller.queue().len(), 6);
    }
}
