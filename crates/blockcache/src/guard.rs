//! The RAII handle returned by [`crate::BufferCache::bread`].
//!
//! A [`BufGuard`]'s existence is the only proof the crate needs that its
//! holder owns the buffer's sleep lock: there is no way to reach
//! [`crate::Error::LockMisuse`] through this API, because there is no way
//! to call `write_through`/`mark_dirty`/`data` without first holding a
//! guard.

use core::fmt;

use dataview::{DataView, Pod};
use mutex_api::Mutex;

use crate::{
    BlockNo, DeviceId, Error,
    cache::{BufferCache, Payload},
    policy::Policy,
    slot::Identity,
};

/// A pinned, locked handle on one cached block.
///
/// Dropping the guard releases the pin (`brelse`); it never writes back
/// dirty data implicitly; call [`BufGuard::write_through`] first if the
/// caller wants the block's contents persisted before the pin is dropped.
pub struct BufGuard<'a, Dev, L, P, const N: usize, const BLOCK_SIZE: usize>
where
    Dev: crate::BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    pub(crate) cache: &'a BufferCache<Dev, L, P, N, BLOCK_SIZE>,
    pub(crate) index: usize,
    pub(crate) identity: Identity,
    pub(crate) sleep_guard: Option<L::Guard<'a>>,
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> fmt::Debug for BufGuard<'_, Dev, L, P, N, BLOCK_SIZE>
where
    Dev: crate::BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufGuard")
            .field("dev", &self.identity.dev)
            .field("blockno", &self.identity.blockno)
            .field("index", &self.index)
            .finish()
    }
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> BufGuard<'_, Dev, L, P, N, BLOCK_SIZE>
where
    Dev: crate::BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    /// The device this buffer belongs to.
    #[must_use]
    pub fn dev(&self) -> DeviceId {
        self.identity.dev
    }

    /// The block number this buffer caches.
    #[must_use]
    pub fn blockno(&self) -> BlockNo {
        self.identity.blockno
    }

    /// Read-only access to the cached block's contents.
    #[must_use]
    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        &self
            .sleep_guard
            .as_ref()
            .expect("sleep guard present for the guard's whole lifetime")
            .data
    }

    /// Mutable access to the cached block's contents.
    ///
    /// Marks the buffer dirty: it will not be considered for eviction again
    /// until [`BufGuard::write_through`] clears the flag.
    pub fn data_mut(&mut self) -> &mut [u8; BLOCK_SIZE] {
        self.mark_dirty();
        &mut self
            .sleep_guard
            .as_mut()
            .expect("sleep guard present for the guard's whole lifetime")
            .data
    }

    /// Views the buffer's contents as a typed, read-only overlay.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not fit within `BLOCK_SIZE` bytes.
    #[must_use]
    pub fn data_as<T: Pod>(&self) -> &T {
        DataView::from(&self.data()[..]).get(0)
    }

    /// Views the buffer's contents as a typed, writable overlay.
    ///
    /// Marks the buffer dirty, on the assumption that a caller asking for
    /// mutable typed access intends to modify it.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not fit within `BLOCK_SIZE` bytes.
    pub fn data_as_mut<T: Pod>(&mut self) -> &mut T {
        self.mark_dirty();
        DataView::from_mut(
            &mut self
                .sleep_guard
                .as_mut()
                .expect("sleep guard present for the guard's whole lifetime")
                .data[..],
        )
        .get_mut(0)
    }

    /// Marks the buffer dirty without modifying its contents.
    pub fn mark_dirty(&mut self) {
        let mut dir = self.cache.directory.lock();
        dir.slots[self.index].set_dirty(true);
    }

    /// Writes the buffer's current contents to the device (`bwrite`) and
    /// clears the DIRTY flag on success. The pin is unaffected; the caller
    /// still owns the guard afterward.
    pub fn write_through(&mut self) -> Result<(), Error<Dev::Error>> {
        let data = self
            .sleep_guard
            .as_ref()
            .expect("sleep guard present for the guard's whole lifetime")
            .data;
        self.cache
            .device
            .write(self.identity.dev, self.identity.blockno, &data)
            .map_err(Error::Io)?;
        let mut dir = self.cache.directory.lock();
        dir.slots[self.index].set_dirty(false);
        Ok(())
    }

    /// Releases the pin (`brelse`). Equivalent to dropping the guard;
    /// provided so call sites can make the release explicit.
    pub fn release(self) {}
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> Drop for BufGuard<'_, Dev, L, P, N, BLOCK_SIZE>
where
    Dev: crate::BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    fn drop(&mut self) {
        // Drop the sleep-lock guard before taking the directory lock: the
        // crate never acquires a sleep lock while already holding the
        // directory lock, so releasing in this order never holds both at
        // once and never reverses the acquire order used on the read path.
        self.sleep_guard = None;
        let mut dir = self.cache.directory.lock();
        dir.slots[self.index].decr_refcnt();
        if dir.slots[self.index].refcnt() == 0 {
            dir.policy.on_release(self.index);
        }
    }
}
