//! Turn-order scheduling - which faction's unit acts next
//!
//! Instead of whole armies taking turns, factions interleave unit by unit in
//! proportion to how many eligible units each still has.
//!
//! Flow:
//! - New turn: roster snapshot -> builder -> full queue
//! - Each resolved action: advance, then reconcile against the roster
//! - Deaths, reinforcements, defections: reconcile (tail-only repair)
//! - Queue empty: new turn

pub mod builder;
pub mod controller;
pub mod faction;
pub mod queue;
pub mod reconciler;
pub mod tracker;

// Re-exports for convenient access
pub use builder::{build, build_with_state, StreakState};
pub use controller::{NewTurn, QueueState, RosterEvent, TurnController, TurnCounters};
pub use faction::{Faction, FactionCounts, PopulationSnapshot};
pub use queue::TurnQueue;
pub use reconciler::{reconcile, ReconcileReport};
pub use tracker::{PopulationSource, Roster, RosterUnit};
