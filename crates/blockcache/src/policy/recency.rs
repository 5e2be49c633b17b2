//! Least-recently-used eviction.

use alloc::collections::VecDeque;

use super::Policy;
use crate::slot::{Identity, Slot};

/// Evicts the least-recently-touched unpinned, clean slot.
#[derive(Debug, Default)]
pub struct Recency {
    /// Back = most recently touched. Only ever holds indices that have been
    /// touched at least once; a slot that has never been touched simply
    /// doesn't appear (and is always found by the cache's free-slot scan
    /// before any policy gets involved).
    order: VecDeque<usize>,
    /// Retained for the historical "forced eviction" variant's name only:
    /// it never changes which slots are eligible, only how this type is
    /// labeled by callers that care about that distinction.
    force: bool,
}

impl Recency {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same eviction behavior as [`Recency::new`]; [`Recency::is_forced`]
    /// reports `true` for documentation/labeling purposes only.
    #[must_use]
    pub fn with_forced_eviction() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.force
    }

    fn move_to_back(&mut self, index: usize) {
        if let Some(pos) = self.order.iter().position(|&i| i == index) {
            self.order.remove(pos);
        }
        self.order.push_back(index);
    }
}

impl Policy for Recency {
    fn on_touch(&mut self, index: usize, _refcnt: u32, _promoted_from_ghost: bool) {
        self.move_to_back(index);
    }

    fn on_evict(&mut self, index: usize, _previous: Identity) {
        if let Some(pos) = self.order.iter().position(|&i| i == index) {
            self.order.remove(pos);
        }
    }

    fn on_release(&mut self, index: usize) {
        self.move_to_back(index);
    }

    fn select_victim(&mut self, slots: &[Slot]) -> Option<usize> {
        let victim = *self
            .order
            .iter()
            .find(|&&index| slots[index].is_evictable())?;
        let pos = self.order.iter().position(|&i| i == victim)?;
        self.order.remove(pos);
        Some(victim)
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
    fn evicts_least_recently_touched() {
        let slots = [evictable_slot(0, 0), evictable_slot(0, 1), evictable_slot(0, 2)];
        let mut policy = Recency::new();
        policy.on_touch(0, 1, false);
        policy.on_touch(1, 1, false);
        policy.on_touch(2, 1, false);
        // Touching 0 again makes 1 the new least-recently-used.
        policy.on_touch(0, 1, false);

        assert_eq!(policy.select_victim(&slots), Some(1));
        assert_eq!(policy.select_victim(&slots), Some(2));
        assert_eq!(policy.select_victim(&slots), Some(0));
        assert_eq!(policy.select_victim(&slots), None);
    }

    #[test]
    fn pinned_slots_are_never_selected() {
        let mut pinned = Slot::free();
        pinned.pin_as(Identity::new(0, 0));
        let slots = [pinned, evictable_slot(0, 1)];

        let mut policy = Recency::new();
        policy.on_touch(0, 1, false);
        policy.on_touch(1, 1, false);

        assert_eq!(policy.select_victim(&slots), Some(1));
    }

    #[test]
    fn release_moves_slot_to_mru_head() {
        let slots = [evictable_slot(0, 0), evictable_slot(0, 1), evictable_slot(0, 2)];
        let mut policy = Recency::new();
        policy.on_touch(0, 1, false);
        policy.on_touch(1, 1, false);
        policy.on_touch(2, 1, false);
        // 0 is the current LRU; releasing it again should push it back to
        // the MRU end, leaving 1 as the new victim.
        policy.on_release(0);

        assert_eq!(policy.select_victim(&slots), Some(1));
    }

    #[test]
    fn forced_eviction_flag_does_not_change_eligibility() {
        let slots = [evictable_slot(0, 0)];
        let mut policy = Recency::with_forced_eviction();
        assert!(policy.is_forced());
        policy.on_touch(0, 1, false);

        assert_eq!(policy.select_victim(&slots), Some(0));
    }
}
