//! A process/kernel-wide singleton wrapper around [`BufferCache`].
//!
//! Grounded on the same "init once during boot, read freely after" pattern
//! the rest of this workspace uses for global kernel state: construction is
//! deferred until the device and policy are ready, but every later access is
//! a simple reference fetch with no locking of its own.

use mutex_api::Mutex;

use crate::{BlockDevice, BufferCache, cache::Payload, policy::Policy};

/// A [`BufferCache`] that is constructed once, after which it is shared by
/// reference for the rest of the program's life.
pub struct GlobalCache<Dev, L, P, const N: usize, const BLOCK_SIZE: usize>
where
    Dev: BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    cache: once_init::OnceInit<BufferCache<Dev, L, P, N, BLOCK_SIZE>>,
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> GlobalCache<Dev, L, P, N, BLOCK_SIZE>
where
    Dev: BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    /// An uninitialized global cache, suitable for a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache: once_init::OnceInit::new(),
        }
    }

    /// Initializes the global cache.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn init(&self, device: Dev, policy: P) {
        self.cache.init(BufferCache::new(device, policy));
    }

    /// Accesses the global cache.
    ///
    /// # Panics
    ///
    /// Panics if [`GlobalCache::init`] has not run yet.
    #[must_use]
    pub fn get(&self) -> &BufferCache<Dev, L, P, N, BLOCK_SIZE> {
        self.cache.get()
    }
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> Default for GlobalCache<Dev, L, P, N, BLOCK_SIZE>
where
    Dev: BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    fn default() -> Self {
        Self::new()
    }
}
