//! Build-time configuration constants
//!
//! These are fixed at build time, not runtime-negotiable. Firmware projects
//! that need different values change them here (or patch the crate); nothing
//! in the scheduling core reads configuration at runtime.

/// The number of pre-allocated schedulable task slots owned by the
/// process-wide [`AppThread`](crate::AppThread) scheduler.
///
/// Scheduling while all slots are occupied is a fatal error, so size this for
/// the worst case, not the average.
pub const TASK_POOL_SIZE: usize = 64;

/// The number of bytes reserved for each [`Thread`](crate::Thread) stack.
pub const THREAD_STACK_SIZE: usize = 4096;

/// Native kernel ticks per second, used for all delay and timeout arithmetic.
pub const TICKS_PER_SECOND: u32 = 1000;

// End of File
