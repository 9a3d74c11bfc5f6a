//! Contains the [`Timeout`] type

use crate::app_thread::AppThread;
use crate::cfg;
use crate::kernel::{ThreadArg, TickCount};
use crate::task::{Action, TaskId, ThreadContext};

/// A one-shot timer that runs an action on the application thread.
///
/// Arm it with [`Timeout::set`], push the deadline back with
/// [`Timeout::reset`], disarm it with [`Timeout::clear`]. Dropping an armed
/// timeout cancels it, so the action never outlives its owner.
pub struct Timeout {
    app: &'static AppThread,
    task_id: TaskId,
    ticks: TickCount,
    action: Action,
}

impl Timeout {
    /// A timeout that will run `action` after `seconds` (fractions allowed).
    pub fn new(app: &'static AppThread, seconds: f64, action: fn()) -> Timeout {
        Timeout {
            app,
            task_id: TaskId::NONE,
            ticks: ticks_from(seconds),
            action: Action::plain(action),
        }
    }

    /// A timeout that will run `action` with `argument` after `seconds`.
    pub fn new_with(
        app: &'static AppThread,
        seconds: f64,
        argument: ThreadArg,
        action: fn(ThreadArg),
    ) -> Timeout {
        Timeout {
            app,
            task_id: TaskId::NONE,
            ticks: ticks_from(seconds),
            action: Action::bound(action, argument),
        }
    }

    /// Arm the timeout. Does nothing if it is already armed or its duration
    /// is zero.
    pub fn set(&mut self) {
        if !self.task_id.is_none() || self.ticks == 0 {
            return;
        }
        self.task_id = match self.action {
            Action::Plain(f) => self.app.delay(self.ticks, f, ThreadContext::Application),
            Action::Bound(f, arg) => {
                self.app
                    .delay_with(self.ticks, arg, f, ThreadContext::Application)
            }
        };
    }

    /// Arm the timeout with a new duration. Does nothing if it is already
    /// armed or `seconds` is not positive.
    pub fn set_secs(&mut self, seconds: f64) {
        if !self.task_id.is_none() {
            return;
        }
        self.ticks = ticks_from(seconds);
        self.set();
    }

    /// Restart the countdown from now, arming the timeout if it was idle.
    pub fn reset(&mut self) {
        self.clear();
        self.set();
    }

    /// Disarm the timeout. The action will not run. Idempotent.
    pub fn clear(&mut self) {
        self.app.cancel(&mut self.task_id);
    }

    /// Is the countdown currently running?
    pub fn is_armed(&self) -> bool {
        !self.task_id.is_none()
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.clear();
    }
}

fn ticks_from(seconds: f64) -> TickCount {
    if seconds <= 0.0 {
        0
    } else {
        (seconds * cfg::TICKS_PER_SECOND as f64) as TickCount
    }
}


// End of File
