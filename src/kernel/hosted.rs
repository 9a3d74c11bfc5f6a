//! The std-backed kernel adapter
//!
//! Implements the kernel seam on top of `std::thread` and
//! `Mutex`/`Condvar` pairs so the whole crate runs (and is tested) on a
//! development host. Timeouts are denominated in ticks and converted with
//! [`cfg::TICKS_PER_SECOND`].
//!
//! Two deliberate divergences from a real RTOS, both below the portable
//! contract:
//!
//! * threads cannot be killed, so [`terminate`] only releases the caller's
//!   record of the thread;
//! * there is no hardware interrupt context, so [`is_isr_context`] reports a
//!   thread-local flag that [`isr_scope`] sets, which is how the ISR-safety
//!   rules get exercised in tests.

use std::cell::Cell;
use std::sync::{Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

use crate::cfg;
use crate::kernel::{EventFlags, ThreadArg, ThreadEntry, TickCount, WAIT_FOREVER};
use crate::priority::PriorityOrder;

/// A value identifying a native thread.
pub type ThreadHandle = std::thread::ThreadId;

/// The native numeric priority representation.
pub type NativePriority = u32;

/// Larger numbers mean higher priority on this adapter.
pub const PRIORITY_ORDER: PriorityOrder = PriorityOrder::Ascending;

/// Raw preset priority values in this adapter's encoding.
pub mod presets {
    pub const IDLE: i32 = 1;
    pub const LOW: i32 = 8;
    pub const BELOW_NORMAL: i32 = 16;
    pub const NORMAL: i32 = 24;
    pub const ABOVE_NORMAL: i32 = 32;
    pub const HIGH: i32 = 40;
    pub const REALTIME: i32 = 48;
}

thread_local! {
    static ISR_CONTEXT: Cell<bool> = const { Cell::new(false) };
}

/// Is the current execution context an interrupt handler?
pub fn is_isr_context() -> bool {
    ISR_CONTEXT.with(Cell::get)
}

/// Run `f` with the current thread marked as interrupt context.
///
/// There are no hardware interrupts on a host, so this is how the ISR-safety
/// rules (mutexes refusing to lock, semaphores refusing to wait) are
/// exercised. The flag is restored even if `f` panics.
pub fn isr_scope<R>(f: impl FnOnce() -> R) -> R {
    struct Restore(bool);
    impl Drop for Restore {
        fn drop(&mut self) {
            ISR_CONTEXT.with(|c| c.set(self.0));
        }
    }
    let _restore = Restore(ISR_CONTEXT.with(|c| c.replace(true)));
    f()
}

/// Get a handle identifying the calling thread, or `None` in interrupt
/// context.
pub fn current_thread_handle() -> Option<ThreadHandle> {
    if is_isr_context() {
        None
    } else {
        Some(std::thread::current().id())
    }
}

/// Yield the current thread and let the system resume other threads.
pub fn yield_now() {
    std::thread::yield_now();
}

/// Block the current thread for the given number of kernel ticks.
pub fn delay(ticks: TickCount) {
    std::thread::sleep(ticks_to_duration(ticks));
}

/// Get the number of kernel ticks since the adapter was first used.
pub fn tick_count() -> TickCount {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    (start.elapsed().as_millis() as u64 * cfg::TICKS_PER_SECOND as u64 / 1000) as TickCount
}

fn ticks_to_duration(ticks: TickCount) -> Duration {
    Duration::from_millis(ticks as u64 * 1000 / cfg::TICKS_PER_SECOND as u64)
}

/// Spawn a native thread. Returns `None` if the system refused to create it.
pub fn spawn(
    name: &str,
    _priority: NativePriority,
    entry: ThreadEntry,
    arg: ThreadArg,
) -> Option<ThreadHandle> {
    let builder = std::thread::Builder::new()
        .name(name.into())
        .stack_size(cfg::THREAD_STACK_SIZE);
    let join = builder.spawn(move || entry(arg)).ok()?;
    // Threads in this layer run forever or are forgotten; nothing joins them.
    let handle = join.thread().id();
    drop(join);
    Some(handle)
}

/// Stop a native thread.
///
/// The host cannot kill a thread, so this only succeeds in releasing the
/// caller's record; the thread itself runs to completion.
pub fn terminate(_handle: ThreadHandle) -> bool {
    true
}

/// Apply a new native priority to a running thread.
///
/// Thread priorities are not portable on hosts; the value is accepted and
/// ignored.
pub fn set_priority(_handle: ThreadHandle, _priority: NativePriority) -> bool {
    true
}

/// The native mutex control block.
pub struct RawMutex {
    locked: Mutex<bool>,
    cond: Condvar,
}

impl RawMutex {
    pub const fn new() -> RawMutex {
        RawMutex {
            locked: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Take the mutex, waiting up to `timeout` ticks. Returns whether it was
    /// taken.
    pub fn acquire(&self, timeout: TickCount) -> bool {
        let mut locked = lock_unpoisoned(&self.locked);
        if timeout == WAIT_FOREVER {
            while *locked {
                locked = wait_unpoisoned(&self.cond, locked);
            }
        } else {
            let deadline = Instant::now() + ticks_to_duration(timeout);
            while *locked {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                let (guard, _) = self
                    .cond
                    .wait_timeout(locked, deadline - now)
                    .unwrap_or_else(|e| e.into_inner());
                locked = guard;
            }
        }
        *locked = true;
        true
    }

    /// Put the mutex back. Returns whether it was held.
    pub fn release(&self) -> bool {
        let mut locked = lock_unpoisoned(&self.locked);
        let was_locked = *locked;
        *locked = false;
        self.cond.notify_one();
        was_locked
    }
}

/// The native binary semaphore control block.
///
/// A released permit latches until somebody takes it; repeated releases
/// coalesce into one permit.
pub struct RawSemaphore {
    available: Mutex<bool>,
    cond: Condvar,
}

impl RawSemaphore {
    pub const fn new() -> RawSemaphore {
        RawSemaphore {
            available: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Take the permit, waiting up to `timeout` ticks for it.
    pub fn take(&self, timeout: TickCount) -> bool {
        let mut available = lock_unpoisoned(&self.available);
        if timeout == WAIT_FOREVER {
            while !*available {
                available = wait_unpoisoned(&self.cond, available);
            }
        } else {
            let deadline = Instant::now() + ticks_to_duration(timeout);
            while !*available {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                let (guard, _) = self
                    .cond
                    .wait_timeout(available, deadline - now)
                    .unwrap_or_else(|e| e.into_inner());
                available = guard;
            }
        }
        *available = false;
        true
    }

    /// Make the permit available.
    pub fn give(&self) -> bool {
        let mut available = lock_unpoisoned(&self.available);
        *available = true;
        self.cond.notify_one();
        true
    }
}

/// The native event-flag group control block.
pub struct RawEventGroup {
    flags: Mutex<EventFlags>,
    cond: Condvar,
}

impl RawEventGroup {
    pub const fn new() -> RawEventGroup {
        RawEventGroup {
            flags: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// OR `bits` into the group and wake every waiter.
    pub fn set(&self, bits: EventFlags) -> bool {
        let mut flags = lock_unpoisoned(&self.flags);
        *flags |= bits;
        self.cond.notify_all();
        true
    }

    /// Wait until `bits` are satisfied (any bit, or all bits when `all` is
    /// set). Returns the group value at the moment of satisfaction, before
    /// any clearing, or 0 on timeout. When `clear` is set the requested bits
    /// are removed from the group on success.
    pub fn wait(&self, bits: EventFlags, all: bool, clear: bool, timeout: TickCount) -> EventFlags {
        let satisfied =
            |flags: EventFlags| -> bool { (flags & bits) != 0 && (!all || (flags & bits) == bits) };
        let mut flags = lock_unpoisoned(&self.flags);
        if timeout == WAIT_FOREVER {
            while !satisfied(*flags) {
                flags = wait_unpoisoned(&self.cond, flags);
            }
        } else {
            let deadline = Instant::now() + ticks_to_duration(timeout);
            while !satisfied(*flags) {
                let now = Instant::now();
                if now >= deadline {
                    return 0;
                }
                let (guard, _) = self
                    .cond
                    .wait_timeout(flags, deadline - now)
                    .unwrap_or_else(|e| e.into_inner());
                flags = guard;
            }
        }
        let snapshot = *flags;
        if clear {
            *flags &= !bits;
        }
        snapshot
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn wait_unpoisoned<'a, T>(
    cond: &Condvar,
    guard: std::sync::MutexGuard<'a, T>,
) -> std::sync::MutexGuard<'a, T> {
    cond.wait(guard).unwrap_or_else(|e| e.into_inner())
}

// End of File
