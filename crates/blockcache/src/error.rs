//! Error kinds the cache surfaces.
//!
//! All three are fatal to the calling context: the cache does not retry and
//! has no local recovery. Whether a caller turns one into a kernel panic, a
//! process abort, or an `Err`-propagated failure is a decision for the
//! caller, not this crate.

/// An error returned by a buffer-cache operation.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// `bread` found every buffer pinned or dirty; there was no eligible
    /// victim. Correct callers that never hold more buffers at once than
    /// the pool's capacity cannot reach this; seeing it indicates a buffer
    /// leak or an under-sized pool.
    #[error("no eligible buffer to reuse: pool exhausted")]
    NoBuffers,

    /// `bwrite`/`brelse` were asked to operate on a buffer whose sleep lock
    /// the caller does not hold.
    ///
    /// The safe [`crate::BufGuard`] API makes this unreachable by
    /// construction: a guard's mere existence *is* the proof of holding the
    /// lock, so there is no safe call site that can trip this check. The
    /// variant is kept so the error type still names every fatal condition
    /// this cache can hit, and for any lower-level caller that reconstructs
    /// a guard from raw parts.
    #[error("sleep lock not held by the caller")]
    LockMisuse,

    /// The device driver reported a failure. Propagated verbatim.
    #[error("device I/O failed: {0:?}")]
    Io(E),
}
