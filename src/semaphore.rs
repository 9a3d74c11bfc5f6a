//! Contains the [`Semaphore`] type

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use core::sync::atomic::{AtomicBool, Ordering};

use crate::crash;
use crate::kernel::{self, RawSemaphore, TickCount, WAIT_FOREVER};

/// A binary semaphore.
///
/// Starts empty, so the first [`Semaphore::wait`] blocks until somebody calls
/// [`Semaphore::release`]. Releasing is safe from both threads and interrupt
/// handlers; waiting is a thread-only operation and is refused (not
/// attempted) from interrupt context.
///
/// At most one thread may wait at a time. These semaphores pair one loop with
/// one wake-up source, so a second simultaneous waiter means the program is
/// structured wrongly and the process halts.
pub struct Semaphore {
    raw: RawSemaphore,
    taken: AtomicBool,
}

impl Semaphore {
    /// Create a new, empty binary semaphore.
    pub const fn new() -> Semaphore {
        Semaphore {
            raw: RawSemaphore::new(),
            taken: AtomicBool::new(false),
        }
    }

    /// Block until the semaphore is released, or `timeout` ticks pass.
    ///
    /// Returns `false` on timeout or when called from interrupt context.
    pub fn wait(&self, timeout: TickCount) -> bool {
        if kernel::is_isr_context() {
            return false;
        }
        if self.taken.swap(true, Ordering::AcqRel) {
            crash::die("second waiter on a binary semaphore");
        }
        let ok = self.raw.take(timeout);
        self.taken.store(false, Ordering::Release);
        ok
    }

    /// Block until the semaphore is released.
    ///
    /// Returns `false` when called from interrupt context.
    pub fn wait_forever(&self) -> bool {
        self.wait(WAIT_FOREVER)
    }

    /// Release the semaphore, waking the waiter if there is one.
    ///
    /// Safe from interrupt context. The permit latches: a release with no
    /// waiter is consumed by the next wait, and repeated releases coalesce
    /// into a single permit.
    pub fn release(&self) -> bool {
        self.raw.give()
    }
}

impl Default for Semaphore {
    fn default() -> Semaphore {
        Semaphore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::isr_scope;

    #[test]
    fn starts_empty() {
        let sem = Semaphore::new();
        assert!(!sem.wait(10));
    }

    #[test]
    fn release_latches_until_taken() {
        let sem = Semaphore::new();
        sem.release();
        sem.release();
        assert!(sem.wait(10));
        // both releases coalesced into one permit
        assert!(!sem.wait(10));
    }

    #[test]
    fn wakes_a_blocked_waiter() {
        static SEM: Semaphore = Semaphore::new();
        let waiter = std::thread::spawn(|| SEM.wait(5_000));
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(SEM.release());
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn wait_refused_from_interrupt_context() {
        let sem = Semaphore::new();
        sem.release();
        assert!(!isr_scope(|| sem.wait(10)));
        // the permit was not consumed by the refused wait
        assert!(sem.wait(10));
    }

    #[test]
    fn release_allowed_from_interrupt_context() {
        let sem = Semaphore::new();
        assert!(isr_scope(|| sem.release()));
        assert!(sem.wait(10));
    }
}

// End of File
