//! A simple mutex API.
#![no_std]

use core::ops::DerefMut;

/// A mutex.
pub trait Mutex {
    /// The type of the data that the mutex protects.
    type Data;

    /// The type of the guard that the `lock` method returns.
    type Guard<'a>: DerefMut<Target = Self::Data>
    where
        Self: 'a;

    /// Creates a new mutex.
    fn new(data: Self::Data) -> Self;

    /// Locks the mutex.
    fn lock(&self) -> Self::Guard<'_>;
}

/// A marker for [`Mutex`] implementations that never sleep the caller.
///
/// `acquire`/`release` must complete in bounded, non-blocking time (a busy
/// wait is fine, a context switch is not). Callers use this bound to reject,
/// at the type level, a lock that is safe to hold only for short,
/// never-suspending critical sections — e.g. a directory/cache lock that
/// must not be held across I/O or across another lock's blocking acquire.
pub trait SpinMutex: Mutex {}

#[cfg(feature = "std")]
pub mod std_mutex {
    //! A [`Mutex`] backed by [`std::sync::Mutex`], for tests.
    //!
    //! This is the blocking/yielding end of the spectrum: contended `lock()`
    //! parks the calling thread. Suitable as a test double for a sleep lock,
    //! and, in single-threaded tests, as a stand-in for a spin lock too.

    extern crate std;

    use core::ops::{Deref, DerefMut};
    use std::sync::{Mutex as StdSyncMutex, MutexGuard};

    use crate::Mutex;

    /// A [`Mutex`] backed by [`std::sync::Mutex`].
    pub struct StdMutex<T>(StdSyncMutex<T>);

    /// The guard type returned by [`StdMutex::lock`].
    pub struct StdMutexGuard<'a, T>(MutexGuard<'a, T>);

    impl<T> Mutex for StdMutex<T> {
        type Data = T;
        type Guard<'a>
            = StdMutexGuard<'a, T>
        where
            Self: 'a;

        fn new(data: Self::Data) -> Self {
            Self(StdSyncMutex::new(data))
        }

        fn lock(&self) -> Self::Guard<'_> {
            StdMutexGuard(self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
        }
    }

    impl<T> Deref for StdMutexGuard<'_, T> {
        type Target = T;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<T> DerefMut for StdMutexGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.0
        }
    }
}
