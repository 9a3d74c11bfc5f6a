//! Contains the [`AppThread`] facade

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cfg;
use crate::crash;
use crate::kernel::{ThreadArg, ThreadHandle, TickCount};
use crate::scheduler::TaskScheduler;
use crate::task::{Action, TaskId, ThreadContext};
use crate::thread;

/// The process-wide application thread facade.
///
/// Firmware normally uses this one instance; tests construct their own so
/// each can run an independent scheduler.
pub static APP_THREAD: AppThread = AppThread::new();

/// Owns the task scheduler and exposes the public scheduling API.
///
/// One thread calls [`AppThread::start`] and becomes the `Application`
/// context; another calls [`AppThread::frame`] periodically and becomes the
/// `Frame` context the first time it does. Everybody else - threads and
/// interrupt handlers alike - schedules work onto those two contexts with
/// [`AppThread::sync`], [`AppThread::delay`] and [`AppThread::repeat`].
pub struct AppThread {
    scheduler: TaskScheduler<{ cfg::TASK_POOL_SIZE }>,
    /// The native handle of the thread that called `start`.
    application: spin::Once<ThreadHandle>,
    /// The native handle of the first thread to call `frame`.
    frame: spin::Once<ThreadHandle>,
    /// Called instead of halting when a thread assertion fails.
    assert_fallback: spin::Mutex<Option<fn(ThreadContext)>>,
}

impl AppThread {
    /// Build a facade with an empty scheduler.
    pub const fn new() -> AppThread {
        AppThread {
            scheduler: TaskScheduler::new(),
            application: spin::Once::new(),
            frame: spin::Once::new(),
            assert_fallback: spin::Mutex::new(None),
        }
    }

    /// Claim the calling thread as the `Application` context and run the
    /// dispatch loop forever. Call exactly once.
    pub fn start(&'static self) -> ! {
        if let Some(handle) = thread::current_handle() {
            self.application.call_once(|| handle);
        }
        self.scheduler.start()
    }

    /// Serve tasks scheduled to the `Frame` context.
    ///
    /// Call periodically from the frame-owning thread (a display refresh
    /// loop, say); the first call latches that thread's identity. Does not
    /// block.
    pub fn frame(&self) {
        if !self.frame.is_completed()
            && let Some(handle) = thread::current_handle()
        {
            self.frame.call_once(|| handle);
        }
        self.scheduler.frame_tick();
    }

    /// Run `action` on `context` as soon as possible.
    pub fn sync(&self, action: fn(), context: ThreadContext) {
        self.scheduler.schedule(Action::plain(action), context, 0, 0);
    }

    /// Run `action` with `argument` on `context` as soon as possible.
    pub fn sync_with(&self, argument: ThreadArg, action: fn(ThreadArg), context: ThreadContext) {
        self.scheduler
            .schedule(Action::bound(action, argument), context, 0, 0);
    }

    /// Run `action` once on `context` after `ticks` kernel ticks.
    pub fn delay(&self, ticks: TickCount, action: fn(), context: ThreadContext) -> TaskId {
        self.scheduler
            .schedule(Action::plain(action), context, ticks, 0)
    }

    /// Run `action` with `argument` once on `context` after `ticks` kernel
    /// ticks.
    pub fn delay_with(
        &self,
        ticks: TickCount,
        argument: ThreadArg,
        action: fn(ThreadArg),
        context: ThreadContext,
    ) -> TaskId {
        self.scheduler
            .schedule(Action::bound(action, argument), context, ticks, 0)
    }

    /// Run `action` on `context` every `ticks` kernel ticks, first firing
    /// after `ticks`.
    pub fn repeat(&self, ticks: TickCount, action: fn(), context: ThreadContext) -> TaskId {
        self.scheduler
            .schedule(Action::plain(action), context, ticks, ticks)
    }

    /// Run `action` with `argument` on `context` every `ticks` kernel ticks.
    pub fn repeat_with(
        &self,
        ticks: TickCount,
        argument: ThreadArg,
        action: fn(ThreadArg),
        context: ThreadContext,
    ) -> TaskId {
        self.scheduler
            .schedule(Action::bound(action, argument), context, ticks, ticks)
    }

    /// Cancel an active task, zeroing `id`. Idempotent; safe from interrupt
    /// context.
    pub fn cancel(&self, id: &mut TaskId) {
        self.scheduler.cancel(id);
    }

    /// Is the calling thread the named context?
    ///
    /// For [`ThreadContext::None`] this instead answers "is this any thread
    /// at all", i.e. not an interrupt handler. A context whose identity has
    /// not been latched yet matches nothing.
    pub fn is_current_thread(&self, context: ThreadContext) -> bool {
        let latched = match context {
            ThreadContext::Application => self.application.get(),
            ThreadContext::Frame => self.frame.get(),
            ThreadContext::None => return !thread::is_isr_context(),
        };
        match (thread::current_handle(), latched) {
            (Some(current), Some(owner)) => current == *owner,
            _ => false,
        }
    }

    /// Stop (or divert to the registered fallback) unless the calling
    /// thread is the named context.
    pub fn assert_thread(&self, context: ThreadContext) {
        if self.is_current_thread(context) {
            return;
        }
        let fallback = *self.assert_fallback.lock();
        match fallback {
            Some(f) => f(context),
            None => crash::die("thread context assertion failed"),
        }
    }

    /// Register a function for [`AppThread::assert_thread`] to call instead
    /// of halting the process.
    pub fn set_assert_fallback(&self, fallback: fn(ThreadContext)) {
        *self.assert_fallback.lock() = Some(fallback);
    }

    /// Run `action` inline if this is already the application thread,
    /// otherwise schedule it there.
    pub fn sync_if_another_thread(&self, action: fn()) {
        if self.is_current_thread(ThreadContext::Application) {
            action();
        } else {
            self.sync(action, ThreadContext::Application);
        }
    }

    /// Run `action` with `argument` inline if this is already the
    /// application thread, otherwise schedule it there.
    pub fn sync_with_if_another_thread(&self, argument: ThreadArg, action: fn(ThreadArg)) {
        if self.is_current_thread(ThreadContext::Application) {
            action(argument);
        } else {
            self.sync_with(argument, action, ThreadContext::Application);
        }
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &TaskScheduler<{ cfg::TASK_POOL_SIZE }> {
        &self.scheduler
    }
}

impl Default for AppThread {
    fn default() -> AppThread {
        AppThread::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::isr_scope;
    use crate::task::ThreadContext::{Application, Frame, None as NoContext};
    use std::sync::atomic::{AtomicU32, Ordering::SeqCst};

    fn leaked() -> &'static AppThread {
        Box::leak(Box::new(AppThread::new()))
    }

    static FRAME_FIRED: AtomicU32 = AtomicU32::new(0);

    fn frame_action() {
        FRAME_FIRED.fetch_add(1, SeqCst);
    }

    #[test]
    fn frame_latches_first_caller_and_serves_frame_tasks() {
        FRAME_FIRED.store(0, SeqCst);
        let app = leaked();
        assert!(!app.is_current_thread(Frame));
        app.sync(frame_action, Frame);
        app.frame();
        assert_eq!(FRAME_FIRED.load(SeqCst), 1);
        // this thread is now the frame context
        assert!(app.is_current_thread(Frame));
        // and a different thread is not
        let elsewhere = std::thread::spawn(move || app.is_current_thread(Frame));
        assert!(!elsewhere.join().unwrap());
    }

    #[test]
    fn none_context_means_not_an_interrupt() {
        let app = leaked();
        assert!(app.is_current_thread(NoContext));
        assert!(!isr_scope(|| app.is_current_thread(NoContext)));
    }

    #[test]
    fn unlatched_application_matches_nothing() {
        let app = leaked();
        assert!(!app.is_current_thread(Application));
    }

    #[test]
    #[should_panic(expected = "thread context assertion failed")]
    fn assert_thread_without_fallback_is_fatal() {
        let app = leaked();
        app.assert_thread(Application);
    }

    #[test]
    fn assert_thread_prefers_the_fallback() {
        static DIVERTED: AtomicU32 = AtomicU32::new(0);
        fn fallback(_: ThreadContext) {
            DIVERTED.fetch_add(1, SeqCst);
        }
        let app = leaked();
        app.set_assert_fallback(fallback);
        app.assert_thread(Application);
        assert_eq!(DIVERTED.load(SeqCst), 1);
        // a passing assertion does not call the fallback
        app.assert_thread(NoContext);
        assert_eq!(DIVERTED.load(SeqCst), 1);
    }

    #[test]
    fn sync_if_another_thread_schedules_when_not_latched() {
        static RAN: AtomicU32 = AtomicU32::new(0);
        fn action() {
            RAN.fetch_add(1, SeqCst);
        }
        let app = leaked();
        app.sync_if_another_thread(action);
        // not run inline - it went into the pool
        assert_eq!(RAN.load(SeqCst), 0);
        assert_eq!(app.scheduler().immediate_count(), 1);
    }

    #[test]
    fn repeat_schedules_a_delayed_task() {
        let app = leaked();
        let mut id = app.repeat(10, frame_action, Application);
        assert!(!id.is_none());
        assert_eq!(app.scheduler().delayed_count(), 1);
        app.cancel(&mut id);
        assert!(id.is_none());
        assert_eq!(app.scheduler().delayed_count(), 0);
    }
}

// End of File
