//! Cache hit/miss/ghost-hit counters.
//!
//! These are diagnostic only; no invariant or eviction decision depends on
//! them. Counters use relaxed ordering: callers only ever want an
//! approximate, eventually-consistent count, never a synchronization point.

use core::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for one [`crate::BufferCache`].
#[derive(Debug, Default)]
pub struct Stats {
    hits: AtomicU64,
    misses: AtomicU64,
    ghost_hits: AtomicU64,
    evictions: AtomicU64,
}

impl Stats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ghost_hit(&self) {
        self.ghost_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of `bread` calls satisfied by an already-cached, valid buffer.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of `bread` calls that required a device read.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of misses that matched a policy's ghost list (two-queue only;
    /// always zero under other policies).
    #[must_use]
    pub fn ghost_hits(&self) -> u64 {
        self.ghost_hits.load(Ordering::Relaxed)
    }

    /// Number of times a slot was reidentified to a different block.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}
