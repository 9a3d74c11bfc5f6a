//! Contains the [`Thread`] type and current-thread queries

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::crash;
use crate::kernel::{self, ThreadArg, ThreadEntry, ThreadHandle};
use crate::priority::Priority;

/// Is the current execution context an interrupt handler?
pub fn is_isr_context() -> bool {
    kernel::is_isr_context()
}

/// Get a handle identifying the calling thread, or `None` from interrupt
/// context.
pub fn current_handle() -> Option<ThreadHandle> {
    kernel::current_thread_handle()
}

struct ThreadState {
    handle: Option<ThreadHandle>,
    priority: Priority,
}

/// A statically-allocatable container for one native kernel thread.
///
/// Created inactive; [`Thread::start`] hands it to the kernel and
/// [`Thread::terminate`] takes it back, after which it can be started again.
/// Misuse - double start, terminating an inactive thread, terminating from
/// an interrupt handler - is fatal rather than reported, because a thread in
/// an unknown state is not something the caller can recover from.
pub struct Thread {
    state: spin::Mutex<ThreadState>,
}

impl Thread {
    /// Create an inactive thread container.
    pub const fn new() -> Thread {
        Thread {
            state: spin::Mutex::new(ThreadState {
                handle: None,
                priority: Priority::NORMAL,
            }),
        }
    }

    /// Has this thread been started?
    pub fn active(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// Get the native handle, if started.
    pub fn handle(&self) -> Option<ThreadHandle> {
        self.state.lock().handle
    }

    /// Start the thread. `entry` is called on the new thread with `arg`.
    ///
    /// Fatal if the thread is already started or if the kernel refuses to
    /// create it.
    pub fn start(&self, arg: ThreadArg, entry: ThreadEntry, name: &str, priority: Priority) {
        let mut state = self.state.lock();
        if state.handle.is_some() {
            crash::die("thread already started");
        }
        let Some(handle) = kernel::spawn(name, priority.to_native(), entry, arg) else {
            crash::die("thread creation failed");
        };
        debug!("started thread {}", name);
        state.handle = Some(handle);
        state.priority = priority;
    }

    /// Terminate the thread and return the container to the inactive state.
    ///
    /// Fatal if the thread is not active, or when called from interrupt
    /// context.
    pub fn terminate(&self) {
        if kernel::is_isr_context() {
            crash::die("thread terminated from interrupt context");
        }
        let mut state = self.state.lock();
        let Some(handle) = state.handle.take() else {
            crash::die("terminated an inactive thread");
        };
        if !kernel::terminate(handle) {
            crash::die("thread termination failed");
        }
    }

    /// Change the thread's priority, returning the previous one.
    pub fn change_priority(&self, new: Priority) -> Priority {
        let mut state = self.state.lock();
        let old = state.priority;
        if let Some(handle) = state.handle {
            kernel::set_priority(handle, new.to_native());
        }
        state.priority = new;
        old
    }
}

impl Default for Thread {
    fn default() -> Thread {
        Thread::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::isr_scope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static ENTERED: AtomicUsize = AtomicUsize::new(0);

    fn entry(arg: ThreadArg) {
        ENTERED.fetch_add(arg, Ordering::SeqCst);
    }

    #[test]
    fn start_runs_the_entry_with_its_argument() {
        let thread = Thread::new();
        thread.start(3, entry, "unit", Priority::NORMAL);
        assert!(thread.active());
        assert!(thread.handle().is_some());
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while ENTERED.load(Ordering::SeqCst) == 0 {
            assert!(std::time::Instant::now() < deadline, "entry never ran");
            std::thread::yield_now();
        }
        assert_eq!(ENTERED.load(Ordering::SeqCst), 3);
    }

    #[test]
    #[should_panic(expected = "already started")]
    fn double_start_is_fatal() {
        fn idle(_: ThreadArg) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        let thread = Thread::new();
        thread.start(0, idle, "first", Priority::NORMAL);
        thread.start(0, idle, "second", Priority::NORMAL);
    }

    #[test]
    #[should_panic(expected = "inactive thread")]
    fn terminating_an_inactive_thread_is_fatal() {
        Thread::new().terminate();
    }

    #[test]
    #[should_panic(expected = "interrupt context")]
    fn terminating_from_interrupt_context_is_fatal() {
        let thread = Thread::new();
        isr_scope(|| thread.terminate());
    }

    #[test]
    fn change_priority_returns_the_old_one() {
        let thread = Thread::new();
        assert_eq!(thread.change_priority(Priority::HIGH), Priority::NORMAL);
        assert_eq!(thread.change_priority(Priority::LOW), Priority::HIGH);
    }

    #[test]
    fn current_handle_is_none_in_interrupt_context() {
        assert!(current_handle().is_some());
        assert!(isr_scope(current_handle).is_none());
    }
}

// End of File
