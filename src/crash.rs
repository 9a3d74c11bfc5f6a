//! The unrecoverable-error primitive
//!
//! Nothing in this crate returns an error for conditions that would leave the
//! scheduler in an inconsistent state - a depleted task pool, a failed native
//! primitive, a double-started thread. Continuing would be less safe than an
//! observable, debugger-attachable stop, so those paths call [`die`].

/// The message left behind by the last call to [`die`], for a debugger to
/// find. One lock holds the whole message so concurrent fatal errors can
/// never pair one message's pointer with another's length.
static MESSAGE: spin::Mutex<Option<&'static str>> = spin::Mutex::new(None);

/// Get the diagnostic message recorded by a fatal error, if any.
pub fn fatal_message() -> Option<&'static str> {
    *MESSAGE.lock()
}

/// Stop the process on an unrecoverable error, recording a message for the
/// debugger.
///
/// On the `hosted` adapter this panics, which is what a test harness and a
/// backtrace want. On bare metal it spins forever with the message parked in
/// a static, so the instruction pointer is parked somewhere deliberate when
/// the debugger attaches.
pub fn die(msg: &'static str) -> ! {
    *MESSAGE.lock() = Some(msg);
    #[cfg(feature = "hosted")]
    panic!("fatal: {msg}");
    #[cfg(not(feature = "hosted"))]
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_records_a_message_and_panics_with_it() {
        let err = std::panic::catch_unwind(|| die("smoke test failure")).unwrap_err();
        let text = err.downcast_ref::<String>().unwrap();
        assert_eq!(text, "fatal: smoke test failure");
        // other tests exercise fatal paths concurrently, so only the
        // presence of a recorded message is deterministic here
        assert!(fatal_message().is_some());
    }
}

// End of File
