//! Directory-lock-protected per-buffer bookkeeping.
//!
//! A [`Slot`] carries exactly the fields that must be readable under the
//! cache lock alone, without touching a buffer's own sleep lock: identity,
//! pin count, and the DIRTY flag (victim scans need all three). The payload
//! bytes and the VALID flag live behind the per-buffer sleep lock instead
//! (see [`crate::Payload`]) and are never part of a directory scan.

use crate::{BlockNo, DeviceId};

/// The identity of a cached block: the `(dev, blockno)` pair.
///
/// At most one non-ghost [`Slot`] carries a given identity at a time (I1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub dev: DeviceId,
    pub blockno: BlockNo,
}

impl Identity {
    #[must_use]
    pub const fn new(dev: DeviceId, blockno: BlockNo) -> Self {
        Self { dev, blockno }
    }
}

/// The state-machine position of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SlotState {
    /// Identity empty, `refcnt == 0`, not dirty.
    Free,
    /// Identity set, `refcnt == 0`, not dirty: a valid eviction candidate.
    CleanUnpinned,
    /// `refcnt > 0`: must not be evicted or reidentified.
    Pinned,
    /// Identity set, `refcnt == 0`, dirty: the log layer still owns it.
    DirtyUnpinned,
}

/// Per-slot state protected by the cache (directory) lock.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    identity: Option<Identity>,
    refcnt: u32,
    dirty: bool,
}

impl Slot {
    pub(crate) const fn free() -> Self {
        Self {
            identity: None,
            refcnt: 0,
            dirty: false,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    #[must_use]
    pub fn refcnt(&self) -> u32 {
        self.refcnt
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.refcnt > 0
    }

    /// A slot is a valid eviction candidate iff unpinned and clean (I2, I3).
    #[must_use]
    pub fn is_evictable(&self) -> bool {
        self.refcnt == 0 && !self.dirty
    }

    #[must_use]
    pub fn state(&self) -> SlotState {
        if self.refcnt > 0 {
            SlotState::Pinned
        } else if self.dirty {
            SlotState::DirtyUnpinned
        } else if self.identity.is_none() {
            SlotState::Free
        } else {
            SlotState::CleanUnpinned
        }
    }

    pub(crate) fn pin_as(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.refcnt = 1;
        self.dirty = false;
    }

    pub(crate) fn incr_refcnt(&mut self) {
        self.refcnt += 1;
    }

    pub(crate) fn decr_refcnt(&mut self) {
        self.refcnt = self
            .refcnt
            .checked_sub(1)
            .expect("brelse on a buffer with refcnt == 0");
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }
}
