//! Two-queue eviction with a ghost list.
//!
//! New identities enter on probation; a slot whose pin count has reached
//! the promotion threshold at any point during its current residency is
//! promoted into the protected queue and is no longer a victim candidate
//! until the protected queue itself runs out of room. A slot that earned
//! protected status leaves a ghost entry behind when it is finally evicted,
//! remembered on a bounded ghost list so a near-term re-`bread` of the same
//! block can be distinguished from a genuinely cold miss (exposed via
//! [`Stats::ghost_hits`](crate::Stats::ghost_hits)). A ghost hit consumes
//! its entry and is promoted straight back into the protected queue,
//! skipping probation entirely — the "came back" pattern the ghost list
//! exists to detect.

use alloc::{collections::VecDeque, vec::Vec};

use super::Policy;
use crate::slot::{Identity, Slot};

/// Peak pin count at which a probationary slot is promoted to protected.
///
/// Mirrors the `refcnt >= 3` promotion threshold used by the reference
/// two-queue buffer cache this policy is modeled on.
const GHOST_PROMOTION_REFCNT: u32 = 3;

#[derive(Debug)]
pub struct TwoQueue {
    probationary: VecDeque<usize>,
    protected: VecDeque<usize>,
    in_protected: Vec<bool>,
    /// Highest pin count observed for each slot since its last
    /// (re)installation; reset on eviction.
    peak_refcnt: Vec<u32>,
    ghosts: VecDeque<Identity>,
    ghost_capacity: usize,
}

impl TwoQueue {
    /// `capacity` sizes the per-slot bookkeeping (must match the cache's
    /// own `N`); `ghost_capacity` is independent, matching §6's `SBUF`
    /// (main) and `GBUF` (ghost) as separate tunables.
    #[must_use]
    pub fn new(capacity: usize, ghost_capacity: usize) -> Self {
        Self {
            probationary: VecDeque::with_capacity(capacity),
            protected: VecDeque::with_capacity(capacity),
            in_protected: alloc::vec![false; capacity],
            peak_refcnt: alloc::vec![0; capacity],
            ghosts: VecDeque::with_capacity(ghost_capacity),
            ghost_capacity,
        }
    }

    fn remove_from_queues(&mut self, index: usize) {
        if let Some(pos) = self.probationary.iter().position(|&i| i == index) {
            self.probationary.remove(pos);
        }
        if let Some(pos) = self.protected.iter().position(|&i| i == index) {
            self.protected.remove(pos);
        }
    }

    fn remember_ghost(&mut self, identity: Identity) {
        if self.ghosts.len() >= self.ghost_capacity {
            self.ghosts.pop_front();
        }
        self.ghosts.push_back(identity);
    }
}

impl Policy for TwoQueue {
    fn on_touch(&mut self, index: usize, refcnt: u32, promoted_from_ghost: bool) {
        self.peak_refcnt[index] = self.peak_refcnt[index].max(refcnt);

        if promoted_from_ghost {
            // The "came back" signal §4.2 asks a ghost hit to carry: the
            // block already earned protected status once (a slot only
            // leaves a ghost behind past the promotion threshold, see
            // `on_evict`), so re-admitting it lands it directly in
            // `protected` at its most-favoured position instead of
            // re-entering probation and having to re-earn that status.
            self.remove_from_queues(index);
            self.in_protected[index] = true;
            self.protected.push_back(index);
            log::debug!("slot={index} promoted to protected via ghost hit");
            return;
        }

        if self.in_protected[index] {
            self.remove_from_queues(index);
            self.protected.push_back(index);
            return;
        }

        self.remove_from_queues(index);
        if self.peak_refcnt[index] >= GHOST_PROMOTION_REFCNT {
            self.in_protected[index] = true;
            self.protected.push_back(index);
            log::debug!("slot={index} promoted to protected at peak refcnt {}", self.peak_refcnt[index]);
        } else {
            self.probationary.push_back(index);
        }
    }

    fn on_evict(&mut self, index: usize, previous: Identity) {
        self.remove_from_queues(index);
        self.in_protected[index] = false;
        // Mirrors the original's `if (b->refcnt >= 3)` gate on the forced
        // eviction path: only a slot that had earned protected status
        // during its residency leaves a ghost behind; an unpromoted slot's
        // identity is simply dropped.
        if self.peak_refcnt[index] >= GHOST_PROMOTION_REFCNT {
            self.remember_ghost(previous);
        }
        self.peak_refcnt[index] = 0;
    }

    /// Reorders slot `index` within whichever of its two lists it currently
    /// occupies, without touching its peak pin count or promotion state.
    fn on_release(&mut self, index: usize) {
        self.remove_from_queues(index);
        if self.in_protected[index] {
            self.protected.push_back(index);
        } else {
            self.probationary.push_back(index);
        }
    }

    fn select_victim(&mut self, slots: &[Slot]) -> Option<usize> {
        if let Some(pos) = self
            .probationary
            .iter()
            .position(|&index| slots[index].is_evictable())
        {
            return self.probationary.remove(pos);
        }
        if let Some(pos) = self
            .protected
            .iter()
            .position(|&index| slots[index].is_evictable())
        {
            let index = self.protected.remove(pos)?;
            self.in_protected[index] = false;
            return Some(index);
        }
        None
    }

    fn take_ghost(&mut self, identity: Identity) -> bool {
        if let Some(pos) = self.ghosts.iter().position(|&g| g == identity) {
            self.ghosts.remove(pos);
            true
        } else {
            false
        }
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.in_protected.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evictable_slot(dev: u32, blockno: u32) -> Slot {
        let mut slot = Slot::free();
        slot.pin_as(Identity::new(dev, blockno));
        slot.decr_refcnt();
        slot
    }

    #[test]
    fn new_entries_are_evicted_from_probation_first() {
        let slots = [evictable_slot(0, 0), evictable_slot(0, 1)];
        let mut policy = TwoQueue::new(slots.len(), slots.len());
        policy.on_touch(0, 1, false);
        policy.on_touch(1, 1, false);

        assert_eq!(policy.select_victim(&slots), Some(0));
    }

    #[test]
    fn slot_whose_pin_count_reached_threshold_is_promoted_and_protected() {
        let slots = [evictable_slot(0, 0), evictable_slot(0, 1)];
        let mut policy = TwoQueue::new(slots.len(), slots.len());
        policy.on_touch(0, 1, false);
        policy.on_touch(0, 2, false);
        policy.on_touch(0, 3, false); // peak refcnt crosses GHOST_PROMOTION_REFCNT
        policy.on_touch(1, 1, false);

        // 0 is protected now; 1 is still on probation and goes first.
        assert_eq!(policy.select_victim(&slots), Some(1));
    }

    #[test]
    fn evicted_identity_is_remembered_as_a_ghost_only_past_the_promotion_threshold() {
        let slots = [evictable_slot(0, 0)];
        let mut policy = TwoQueue::new(1, 1);
        policy.on_touch(0, 1, false);
        policy.on_touch(0, 2, false);
        policy.on_touch(0, 3, false); // peak refcnt reaches the threshold
        let identity = Identity::new(0, 0);

        assert!(!policy.take_ghost(identity));
        policy.on_evict(0, identity);
        assert!(policy.take_ghost(identity));
        // `take_ghost` consumes the entry: a second lookup finds nothing.
        assert!(!policy.take_ghost(identity));
        // `on_evict` already pulled the slot out of both queues.
        assert_eq!(policy.select_victim(&slots), None);
    }

    #[test]
    fn eviction_below_the_promotion_threshold_leaves_no_ghost() {
        let slots = [evictable_slot(0, 0)];
        let mut policy = TwoQueue::new(1, 1);
        policy.on_touch(0, 1, false);
        let identity = Identity::new(0, 0);

        policy.on_evict(0, identity);
        assert!(!policy.take_ghost(identity));
        assert_eq!(policy.select_victim(&slots), None);
    }

    #[test]
    fn ghost_list_is_bounded() {
        let mut policy = TwoQueue::new(3, 2);
        for index in 0..3 {
            policy.on_touch(index, 1, false);
            policy.on_touch(index, 2, false);
            policy.on_touch(index, 3, false);
        }
        policy.on_evict(0, Identity::new(0, 0));
        policy.on_evict(1, Identity::new(0, 1));
        policy.on_evict(2, Identity::new(0, 2));

        assert!(!policy.take_ghost(Identity::new(0, 0)));
        assert!(policy.take_ghost(Identity::new(0, 1)));
        assert!(policy.take_ghost(Identity::new(0, 2)));
    }

    #[test]
    fn ghost_capacity_is_independent_of_main_capacity() {
        // Nmain=1 but Nghost=3: every eviction of the sole slot should be
        // rememberable as long as each touch crosses the promotion
        // threshold, regardless of how small the main pool is.
        let mut policy = TwoQueue::new(1, 3);
        for identity in [Identity::new(0, 0), Identity::new(0, 1), Identity::new(0, 2)] {
            policy.on_touch(0, 1, false);
            policy.on_touch(0, 2, false);
            policy.on_touch(0, 3, false);
            policy.on_evict(0, identity);
        }

        assert!(policy.take_ghost(Identity::new(0, 0)));
        assert!(policy.take_ghost(Identity::new(0, 1)));
        assert!(policy.take_ghost(Identity::new(0, 2)));
    }

    #[test]
    fn ghost_hit_promotes_directly_to_protected_without_reentering_probation() {
        let slots = [evictable_slot(0, 5), evictable_slot(0, 6)];
        let mut policy = TwoQueue::new(slots.len(), slots.len());
        // Slot 1 is a fresh probationary entry, never promoted.
        policy.on_touch(1, 1, false);
        // Slot 0 is admitted as a ghost-hit promotion: it should land
        // directly in `protected`, ahead of slot 1's probationary entry,
        // even though its own peak refcnt (1) never crossed the threshold.
        policy.on_touch(0, 1, true);

        assert_eq!(policy.select_victim(&slots), Some(1));
        assert_eq!(policy.select_victim(&slots), Some(0));
    }

    #[test]
    fn release_keeps_slot_in_its_current_list_and_moves_it_to_that_lists_head() {
        let slots = [evictable_slot(0, 0), evictable_slot(0, 1)];
        let mut policy = TwoQueue::new(slots.len(), slots.len());
        policy.on_touch(0, 1, false);
        policy.on_touch(1, 1, false);
        // 0 is the probation victim; releasing it again should push it back
        // behind 1 without promoting it to protected.
        policy.on_release(0);

        assert_eq!(policy.select_victim(&slots), Some(1));
    }
}
