//! kennel - a kernel-agnostic task pool and scheduler for real-time systems
//!
//! Application code schedules work - immediate calls, delayed calls and
//! recurring calls - onto one of a small number of named thread contexts,
//! without dynamic allocation and safely from interrupt handlers. The crate
//! sits above a preemptive real-time kernel and hides which kernel is linked
//! in: the [`kernel`] module re-exports one compile-time-selected adapter
//! that supplies native threads, mutexes, binary semaphores, event-flag
//! groups and the tick counter.
//!
//! The `hosted` cargo feature (on by default) selects an adapter backed by
//! `std`, which is what the test suite runs on. Disable default features and
//! provide another adapter at the same seam to run on a real RTOS.
//!
//! The pieces, bottom up:
//!
//! * [`Priority`] - a comparable priority value that hides the raw encoding
//!   direction of the native kernel.
//! * [`Mutex`], [`Semaphore`], [`EventGroup`] - portable synchronization
//!   primitives with uniform ISR-safety rules.
//! * [`Thread`] - a statically-allocated native thread container.
//! * [`TaskScheduler`] - the fixed task pool and its dispatch and delay-tick
//!   loops.
//! * [`AppThread`] - the facade that owns the one scheduler instance and
//!   exposes `sync`/`delay`/`repeat`/`cancel`.
//! * [`Timeout`] and [`Event`] - small conveniences built on the facade.

#![cfg_attr(not(feature = "hosted"), no_std)]

// This must go first so the other modules see its macros.
#[macro_use]
mod fmt;

pub mod cfg;
mod crash;
mod event;
mod event_group;
pub mod kernel;
mod mutex;
mod priority;
mod scheduler;
mod semaphore;
mod task;
mod thread;

mod app_thread;
mod timeout;

pub use app_thread::{APP_THREAD, AppThread};
pub use crash::fatal_message;
pub use event::Event;
pub use event_group::{EventGroup, WaitMode, WaitOptions};
pub use kernel::{EventFlags, ThreadArg, ThreadEntry, TickCount, WAIT_FOREVER};
pub use mutex::{Mutex, MutexGuard};
pub use priority::{Priority, PriorityOrder};
pub use scheduler::TaskScheduler;
pub use semaphore::Semaphore;
pub use task::{Action, Task, TaskId, ThreadContext};
pub use thread::Thread;
pub use timeout::Timeout;

// End of File
