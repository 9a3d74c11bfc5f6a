//! Contains the [`Mutex`] type and its guard

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::kernel::{self, RawMutex, TickCount, WAIT_FOREVER};

/// Mutually exclusive access to a value, backed by a native kernel mutex.
///
/// Locking from interrupt context is refused rather than attempted: a mutex
/// wait can block, and blocking in an interrupt handler is never correct, so
/// [`Mutex::lock`] returns `None` there. The value stays untouched.
///
/// The native control block lives inline in this object; no allocation
/// happens at any point.
pub struct Mutex<T> {
    raw: RawMutex,
    value: UnsafeCell<T>,
}

// SAFETY: the raw kernel mutex serializes all access to the inner value.
unsafe impl<T: Send> Sync for Mutex<T> {}
unsafe impl<T: Send> Send for Mutex<T> {}

impl<T> Mutex<T> {
    /// Create a new mutex holding `value`.
    pub const fn new(value: T) -> Mutex<T> {
        Mutex {
            raw: RawMutex::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Lock the mutex, waiting as long as it takes.
    ///
    /// Returns `None` when called from interrupt context.
    pub fn lock(&self) -> Option<MutexGuard<'_, T>> {
        self.lock_timeout(WAIT_FOREVER)
    }

    /// Lock the mutex, waiting up to `timeout` ticks.
    ///
    /// Returns `None` on timeout or when called from interrupt context.
    pub fn lock_timeout(&self, timeout: TickCount) -> Option<MutexGuard<'_, T>> {
        if kernel::is_isr_context() {
            return None;
        }
        if !self.raw.acquire(timeout) {
            return None;
        }
        Some(MutexGuard { mutex: self })
    }

    /// Get the value without locking. Requires exclusive access, so no other
    /// thread can hold the lock.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

/// Holds a locked [`Mutex`]; releases it on drop, on every exit path.
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves the raw mutex is held by this thread.
        unsafe { &*self.mutex.value.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves the raw mutex is held by this thread.
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.raw.release();
    }
}


// End of File
