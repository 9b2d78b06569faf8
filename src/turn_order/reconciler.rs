//! Queue reconciler: tail-only repair after roster changes
//!
//! Units die, arrive, defect and pass mid-turn. Rather than rebuilding, the
//! queue is trimmed from the tail or extended at the tail until each
//! faction's token count matches its live eligible count. Imminent slots
//! at the head are never moved.

use serde::{Deserialize, Serialize};

use crate::turn_order::faction::{Faction, FactionCounts, PopulationSnapshot};
use crate::turn_order::queue::TurnQueue;

/// What a reconcile pass changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub removed: FactionCounts,
    pub appended: FactionCounts,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.removed.is_zero() && self.appended.is_zero()
    }
}

/// Bring `queue` in line with `live`, touching only the tail
pub fn reconcile(queue: &mut TurnQueue, live: &PopulationSnapshot) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for faction in Faction::PRIORITY {
        let in_queue = queue.count(faction);
        let target = live[faction];

        if in_queue > target {
            let surplus = in_queue - target;
            queue.remove_from_tail(faction, surplus);
            report.removed[faction] = surplus;
        } else if in_queue < target {
            let missing = target - in_queue;
            queue.push_many(faction, missing);
            report.appended[faction] = missing;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn_order::builder::build;
    use Faction::{Ally as A, Enemy as E, Player as P};

    #[test]
    fn test_matching_snapshot_is_noop() {
        let mut queue = TurnQueue::from(vec![P, E, P, E, P, P]);
        let before = queue.clone();

        let report = reconcile(&mut queue, &FactionCounts::new(4, 2, 0));

        assert!(report.is_noop());
        assert_eq!(queue, before);
    }

    #[test]
    fn test_death_removes_last_occurrence() {
        let mut queue = TurnQueue::from(vec![P, E, P, E, P, P]);

        let report = reconcile(&mut queue, &FactionCounts::new(4, 1, 0));

        assert_eq!(queue.to_vec(), vec![P, E, P, P, P]);
        assert_eq!(report.removed, FactionCounts::new(0, 1, 0));
        assert!(report.appended.is_zero());
    }

    #[test]
    fn test_zero_live_removes_every_token() {
        let mut queue = TurnQueue::from(vec![E, P, E, A, E]);

        reconcile(&mut queue, &FactionCounts::new(1, 0, 1));

        assert_eq!(queue.to_vec(), vec![P, A]);
    }

    #[test]
    fn test_arrivals_append_to_tail() {
        let mut queue = TurnQueue::from(vec![E, P]);

        let report = reconcile(&mut queue, &FactionCounts::new(1, 1, 2));

        assert_eq!(queue.to_vec(), vec![E, P, A, A]);
        assert_eq!(report.appended, FactionCounts::new(0, 0, 2));
    }

    #[test]
    fn test_affiliation_change_moves_token_to_tail() {
        // An enemy defects to the ally side mid-turn
        let mut queue = build(&FactionCounts::new(2, 2, 0));
        assert_eq!(queue.to_vec(), vec![P, E, P, E]);

        reconcile(&mut queue, &FactionCounts::new(2, 1, 1));

        assert_eq!(queue.to_vec(), vec![P, E, P, A]);
    }

    #[test]
    fn test_mixed_changes_processed_in_priority_order() {
        let mut queue = TurnQueue::from(vec![A, E, A]);

        reconcile(&mut queue, &FactionCounts::new(2, 2, 1));

        assert_eq!(queue.to_vec(), vec![A, E, P, P, E]);
    }
}
