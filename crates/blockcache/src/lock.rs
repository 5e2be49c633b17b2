//! The directory (cache) lock: a [`mutex_api::SpinMutex`] backed by [`spin::Mutex`].
//!
//! Short critical sections only: never held across a sleep-lock acquire or
//! device I/O.

use core::ops::{Deref, DerefMut};

use mutex_api::{Mutex, SpinMutex};
use spin::{Mutex as SpinLock, MutexGuard};

/// A non-blocking [`Mutex`] for the cache directory.
pub struct CacheSpinLock<T>(SpinLock<T>);

/// The guard returned by [`CacheSpinLock::lock`].
pub struct CacheSpinLockGuard<'a, T>(MutexGuard<'a, T>);

impl<T> Mutex for CacheSpinLock<T> {
    type Data = T;
    type Guard<'a>
        = CacheSpinLockGuard<'a, T>
    where
        Self: 'a;

    fn new(data: Self::Data) -> Self {
        Self(SpinLock::new(data))
    }

    fn lock(&self) -> Self::Guard<'_> {
        CacheSpinLockGuard(self.0.lock())
    }
}

impl<T> SpinMutex for CacheSpinLock<T> {}

impl<T> Deref for CacheSpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for CacheSpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
