//! Least-frequently-used eviction.

use alloc::vec::Vec;

use super::Policy;
use crate::slot::{Identity, Slot};

/// Evicts the unpinned, clean slot with the lowest touch count, ties broken
/// toward the first such slot encountered (lowest index).
#[derive(Debug)]
pub struct Frequency {
    counts: Vec<u64>,
}

impl Frequency {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            counts: alloc::vec![0; capacity],
        }
    }
}

impl Policy for Frequency {
    fn on_touch(&mut self, index: usize, _refcnt: u32, _promoted_from_ghost: bool) {
        self.counts[index] = self.counts[index].saturating_add(1);
    }

    fn on_evict(&mut self, index: usize, _previous: Identity) {
        self.counts[index] = 0;
    }

    /// Frequency is hit/insert-driven only; release never changes a count.
    fn on_release(&mut self, _index: usize) {}

    fn select_victim(&mut self, slots: &[Slot]) -> Option<usize> {
        // `min_by_key` returns the first minimal element on ties, which is
        // exactly the "first such buffer encountered" tie-break the policy
        // requires.
        (0..slots.len())
            .filter(|&index| slots[index].is_evictable())
            .min_by_key(|&index| self.counts[index])
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.counts.len())
    }
}
