//! The buffer cache itself: directory, payload pool, and the `bread` path.

use mutex_api::Mutex;

use crate::{
    BlockDevice, BlockNo, DeviceId, Error,
    guard::BufGuard,
    lock::CacheSpinLock,
    policy::Policy,
    slot::{Identity, Slot, SlotState},
    stats::Stats,
};

/// The per-buffer payload: the VALID flag and the data bytes.
///
/// Lives behind a buffer's sleep lock (`L`), never behind the directory
/// lock: only the current sleep-lock holder may observe or flip VALID
/// (I5), and only it may read or write the bytes.
pub struct Payload<const BLOCK_SIZE: usize> {
    pub(crate) valid: bool,
    pub(crate) data: [u8; BLOCK_SIZE],
    /// The identity this payload was last filled for. Compared against the
    /// identity the directory just handed out, under the payload's own
    /// lock, so a slot recycled to a new identity is never mistaken for
    /// already holding that identity's data (I5).
    identity: Option<Identity>,
}

impl<const BLOCK_SIZE: usize> Payload<BLOCK_SIZE> {
    fn new() -> Self {
        Self {
            valid: false,
            data: [0; BLOCK_SIZE],
            identity: None,
        }
    }
}

/// Directory-lock-protected state: one [`Slot`] per buffer, plus the
/// eviction policy's bookkeeping.
pub(crate) struct Directory<P, const N: usize> {
    pub(crate) slots: [Slot; N],
    pub(crate) policy: P,
}

/// A fixed-size pool of `N` buffers of `BLOCK_SIZE` bytes each, backed by
/// device `Dev`, with per-buffer locking strategy `L` and eviction policy
/// `P`.
pub struct BufferCache<Dev, L, P, const N: usize, const BLOCK_SIZE: usize>
where
    Dev: BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    pub(crate) device: Dev,
    pub(crate) directory: CacheSpinLock<Directory<P, N>>,
    pub(crate) payloads: [L; N],
    stats: Stats,
}

impl<Dev, L, P, const N: usize, const BLOCK_SIZE: usize> BufferCache<Dev, L, P, N, BLOCK_SIZE>
where
    Dev: BlockDevice<BLOCK_SIZE>,
    L: Mutex<Data = Payload<BLOCK_SIZE>>,
    P: Policy,
{
    /// Builds an empty pool of `N` buffers around `device`, evicting
    /// according to `policy` once the pool fills.
    pub fn new(device: Dev, policy: P) -> Self {
        assert!(N > 0, "a buffer cache needs at least one buffer");
        if let Some(capacity) = policy.capacity() {
            assert_eq!(
                capacity, N,
                "policy was built for {capacity} slots but this cache has {N}"
            );
        }
        Self {
            device,
            directory: CacheSpinLock::new(Directory {
                slots: [Slot::free(); N],
                policy,
            }),
            payloads: core::array::from_fn(|_| L::new(Payload::new())),
            stats: Stats::default(),
        }
    }

    /// Diagnostic counters for this pool.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Returns a pinned, locked handle on block `blockno` of device `dev`,
    /// reading it from the device on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoBuffers`] if every buffer is pinned or dirty, or
    /// [`Error::Io`] if filling a fresh buffer required a device read that
    /// failed.
    pub fn bread(&self, dev: DeviceId, blockno: BlockNo) -> Result<BufGuard<'_, Dev, L, P, N, BLOCK_SIZE>, Error<Dev::Error>> {
        let identity = Identity::new(dev, blockno);
        let index = self.locate_or_allocate(identity)?;

        let mut payload_guard = self.payloads[index].lock();
        // The directory lock only says which slot `identity` owns; it says
        // nothing about whether this payload lock still belongs to that
        // decision by the time it's acquired (a second caller for the same
        // identity, or the slot's previous occupant's reader, may win the
        // race to lock it first). Re-checking identity here, under the lock
        // that actually guards VALID, is what makes the reset atomic with
        // the read it gates.
        if payload_guard.identity != Some(identity) {
            payload_guard.identity = Some(identity);
            payload_guard.valid = false;
        }
        if !payload_guard.valid {
            match self.device.read(dev, blockno, &mut payload_guard.data) {
                Ok(()) => payload_guard.valid = true,
                Err(err) => {
                    drop(payload_guard);
                    self.abort_fill(index);
                    return Err(Error::Io(err));
                }
            }
        }

        Ok(BufGuard {
            cache: self,
            index,
            identity,
            sleep_guard: Some(payload_guard),
        })
    }

    /// Finds `identity` among resident buffers, or assigns it a free or
    /// evicted slot. Returns the slot index; whether its payload still
    /// needs a fresh device read is decided later, under the payload lock.
    fn locate_or_allocate(&self, identity: Identity) -> Result<usize, Error<Dev::Error>> {
        let mut dir_guard = self.directory.lock();
        // A single reborrow up front: projecting `.slots`/`.policy` off a
        // plain `&mut Directory` lets the borrow checker see them as the
        // disjoint fields they are. Doing so through the lock guard's own
        // `DerefMut` at each call site instead would re-deref the guard for
        // every access, which the borrow checker cannot split the same way.
        let dir = &mut *dir_guard;

        if let Some(index) = (0..N).find(|&i| dir.slots[i].identity() == Some(identity)) {
            dir.slots[index].incr_refcnt();
            dir.policy.on_touch(index, dir.slots[index].refcnt(), false);
            self.stats.record_hit();
            log::trace!("bread hit dev={} blockno={} slot={index}", identity.dev, identity.blockno);
            return Ok(index);
        }

        self.stats.record_miss();
        // `take_ghost` both answers "was this a ghost hit" and consumes the
        // entry: the identity is about to become resident again, so the
        // ghost no longer refers to anything evicted.
        let promoted_from_ghost = dir.policy.take_ghost(identity);
        if promoted_from_ghost {
            self.stats.record_ghost_hit();
            log::debug!("bread ghost hit dev={} blockno={}", identity.dev, identity.blockno);
        }

        if let Some(index) = (0..N).find(|&i| dir.slots[i].state() == SlotState::Free) {
            dir.slots[index].pin_as(identity);
            dir.policy.on_touch(index, dir.slots[index].refcnt(), promoted_from_ghost);
            return Ok(index);
        }

        let index = dir
            .policy
            .select_victim(&dir.slots)
            .ok_or(Error::NoBuffers)?;
        let previous = dir.slots[index]
            .identity()
            .expect("a victim slot always carries the identity it is being evicted from");
        dir.policy.on_evict(index, previous);
        self.stats.record_eviction();
        log::debug!(
            "evicting slot={index} dev={} blockno={} to admit dev={} blockno={}",
            previous.dev, previous.blockno, identity.dev, identity.blockno
        );
        dir.slots[index].pin_as(identity);
        dir.policy.on_touch(index, dir.slots[index].refcnt(), promoted_from_ghost);
        Ok(index)
    }

    /// Unwinds a failed fill: only the failed caller's own pin goes away.
    /// The slot keeps the identity it was already reassigned to under the
    /// cache lock — VALID stays false, so the next `bread` for the same
    /// identity (a racing caller already holding its own pin on this same
    /// slot, or a later caller finding it unpinned) retries the device read
    /// itself instead of treating the failed fill as a successful one.
    /// Clearing the identity here instead would race a concurrent holder:
    /// it could observe the slot with no identity while still pinning it.
    fn abort_fill(&self, index: usize) {
        let mut dir = self.directory.lock();
        dir.slots[index].decr_refcnt();
    }
}
