//! Eviction policy seam.
//!
//! The cache always tries a genuinely [`crate::slot::SlotState::Free`] slot
//! before consulting a policy at all; a policy is only asked to pick a victim
//! among already-identified, unpinned, clean slots, and only ever sees slots
//! in that state. It never sees dirty or pinned slots as candidates.

mod frequency;
mod recency;
mod two_queue;

pub use self::{frequency::Frequency, recency::Recency, two_queue::TwoQueue};
use crate::slot::{Identity, Slot};

/// An eviction policy operating over a fixed-size pool of `N` slots.
///
/// Implementations track whatever ordering/bookkeeping they need
/// (recency list, frequency counts, ghost list, ...) indexed by slot
/// position. All methods are called with the directory lock held, so they
/// must be allocation-light and must not block.
pub trait Policy {
    /// Called whenever slot `index` transitions to pinned (a fresh
    /// insertion, a cache hit that re-pins an already-resident buffer, or a
    /// fresh insertion that [`Policy::take_ghost`] just reported as a ghost
    /// hit), with the slot's pin count immediately after the transition.
    /// `promoted_from_ghost` is `true` only for the insertion that follows a
    /// ghost hit; a policy without a ghost list never sees it set.
    fn on_touch(&mut self, index: usize, refcnt: u32, promoted_from_ghost: bool);

    /// Called when slot `index` is about to be reidentified to a new
    /// block, discarding its previous identity. Policies that keep a ghost
    /// list record the departing identity here.
    fn on_evict(&mut self, index: usize, previous: Identity);

    /// Called from `brelse` after slot `index`'s pin count has just dropped
    /// to zero. Whether this changes ordering at all is the policy's own
    /// choice: Recency moves the slot to the MRU head, Frequency is
    /// hit/insert-driven only and ignores this, and TwoQueue reorders
    /// within whichever of its lists the slot occupies.
    fn on_release(&mut self, index: usize);

    /// Picks an eviction victim among the slots for which `slots[i]`
    /// satisfies [`Slot::is_evictable`]. Returns `None` only if every slot is
    /// pinned or dirty.
    fn select_victim(&mut self, slots: &[Slot]) -> Option<usize>;

    /// If `identity` matches an entry in this policy's ghost list, removes
    /// that entry and returns `true` — a ghost hit is consumed at most
    /// once, since the identity is about to become resident again.
    /// Policies without a ghost list (anything but two-queue) always
    /// return `false`.
    fn take_ghost(&mut self, identity: Identity) -> bool {
        let _ = identity;
        false
    }

    /// The slot count this policy was built to index, if it pre-sizes any
    /// per-slot bookkeeping at construction (`Frequency`, `TwoQueue`).
    /// [`crate::BufferCache::new`] asserts this matches its own `N` so a
    /// mismatched policy fails fast at construction instead of panicking
    /// on the first out-of-range slot index. Policies with no such
    /// bookkeeping (`Recency`) return `None`.
    fn capacity(&self) -> Option<usize> {
        None
    }
}
