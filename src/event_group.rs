//! Contains the [`EventGroup`] type

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::kernel::{self, EventFlags, RawEventGroup, TickCount, WAIT_FOREVER};

/// Whether a wait is satisfied by any requested flag or only by all of them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WaitMode {
    /// Any one of the requested flags satisfies the wait.
    Any,
    /// Every requested flag must be set at the same time.
    All,
}

/// Options for [`EventGroup::wait`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WaitOptions {
    /// Any/all selection.
    pub mode: WaitMode,
    /// Remove the requested flags from the group when the wait is satisfied.
    pub clear: bool,
}

impl WaitOptions {
    /// Wait for any flag and clear the requested flags on return.
    pub const ANY: WaitOptions = WaitOptions {
        mode: WaitMode::Any,
        clear: true,
    };

    /// Wait for all flags and clear the requested flags on return.
    pub const ALL: WaitOptions = WaitOptions {
        mode: WaitMode::All,
        clear: true,
    };

    /// The same selection, but leave the flags set on return.
    #[must_use]
    pub const fn no_clear(self) -> WaitOptions {
        WaitOptions {
            mode: self.mode,
            clear: false,
        }
    }
}

/// A group of event flags for signalling between threads, and from interrupt
/// handlers to threads.
///
/// [`EventGroup::signal`] ORs flags in and is interrupt-safe;
/// [`EventGroup::wait`] blocks and therefore is not - it returns 0
/// immediately when called from interrupt context.
pub struct EventGroup {
    raw: RawEventGroup,
}

impl EventGroup {
    /// Create a new event group with no flags set.
    pub const fn new() -> EventGroup {
        EventGroup {
            raw: RawEventGroup::new(),
        }
    }

    /// Set the given flags, waking any waiters they satisfy. Safe from
    /// interrupt context.
    pub fn signal(&self, bits: EventFlags) -> bool {
        self.raw.set(bits)
    }

    /// Block until the requested flags are set, per `options`.
    ///
    /// Returns the flags that were set at the moment the wait was satisfied
    /// (before any clearing), or 0 on timeout or from interrupt context.
    pub fn wait(&self, bits: EventFlags, options: WaitOptions, timeout: TickCount) -> EventFlags {
        if kernel::is_isr_context() {
            return 0;
        }
        self.raw
            .wait(bits, options.mode == WaitMode::All, options.clear, timeout)
    }

    /// Block until the requested flags are set, with no timeout.
    pub fn wait_forever(&self, bits: EventFlags, options: WaitOptions) -> EventFlags {
        self.wait(bits, options, WAIT_FOREVER)
    }
}

impl Default for EventGroup {
    fn default() -> EventGroup {
        EventGroup::new()
    }
}


// End of File
