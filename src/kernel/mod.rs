//! The kernel binding layer
//!
//! One fixed vocabulary of types and free functions, backed by exactly one
//! compile-time-selected adapter module. Application code and the rest of
//! this crate only ever name the re-exports here, so which real-time kernel
//! is linked in is a build configuration decision, not a code change.
//!
//! An adapter supplies:
//!
//! * native raw primitives: [`RawMutex`], [`RawSemaphore`], [`RawEventGroup`]
//! * thread plumbing: [`ThreadHandle`], [`spawn`], [`terminate`],
//!   [`set_priority`], [`current_thread_handle`]
//! * the priority encoding: [`NativePriority`], [`PRIORITY_ORDER`] and the
//!   preset raw values
//! * time and context: [`yield_now`], [`delay`], [`tick_count`],
//!   [`is_isr_context`]

#[cfg(feature = "hosted")]
mod hosted;

#[cfg(feature = "hosted")]
pub use hosted::{
    NativePriority, PRIORITY_ORDER, RawEventGroup, RawMutex, RawSemaphore, ThreadHandle,
    current_thread_handle, delay, is_isr_context, presets, set_priority, spawn, terminate,
    tick_count, yield_now,
};

#[cfg(feature = "hosted")]
pub use hosted::isr_scope;

#[cfg(not(feature = "hosted"))]
compile_error!(
    "no kernel adapter selected: enable the `hosted` feature or provide an adapter module"
);

/// An integer containing event flags of an [`EventGroup`](crate::EventGroup).
pub type EventFlags = u32;

/// An integer containing a number of kernel ticks to wait.
pub type TickCount = u32;

/// Thread entry function argument type.
pub type ThreadArg = usize;

/// Thread entry function type.
pub type ThreadEntry = fn(ThreadArg);

/// A [`TickCount`] value indicating no timeout, i.e. an infinite wait.
pub const WAIT_FOREVER: TickCount = TickCount::MAX;

// End of File
