//! Contains the [`TaskScheduler`] type

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::crash;
use crate::kernel::{self, ThreadArg, TickCount};
use crate::priority::Priority;
use crate::semaphore::Semaphore;
use crate::task::{Action, Counters, Task, TaskId, ThreadContext};
use crate::thread::Thread;

/// A fixed pool of scheduled calls and the loops that dispatch them.
///
/// The pool holds `N` task slots, allocated once as part of this object -
/// nothing is allocated per call. Two counters track how many occupied slots
/// are due now ("immediate") and how many are still aging ("delayed"), so
/// the loops never scan an idle pool. Two binary semaphores coordinate the
/// loops: `dispatch` wakes the dispatch loop when an immediate task appears,
/// `delay_wake` wakes the delay-tick thread when a delayed task appears.
///
/// One instance normally exists per process, owned by
/// [`AppThread`](crate::AppThread); tests build their own, usually smaller
/// than the default 64 slots.
pub struct TaskScheduler<const N: usize = 64> {
    /// The task pool.
    tasks: [Task; N],
    /// Occupancy counters for the pool.
    counters: Counters,
    /// The thread that ages delayed tasks, started by [`TaskScheduler::start`].
    delay_thread: Thread,
    /// Wakes the delay-tick thread when a delayed task is scheduled.
    delay_wake: Semaphore,
    /// Wakes the dispatch loop when an immediate task appears.
    dispatch: Semaphore,
}

impl<const N: usize> TaskScheduler<N> {
    /// Build an empty scheduler.
    pub const fn new() -> TaskScheduler<N> {
        TaskScheduler {
            tasks: [const { Task::new() }; N],
            counters: Counters::new(),
            delay_thread: Thread::new(),
            delay_wake: Semaphore::new(),
            dispatch: Semaphore::new(),
        }
    }

    /// Schedule an action.
    ///
    /// `delay_ticks` is how long to age the task before it may fire (zero
    /// means "on the next dispatch pass"); `reset_ticks` non-zero makes it
    /// recurring with that period. Returns the task identifier, which
    /// [`TaskScheduler::cancel`] accepts.
    ///
    /// Thread and interrupt safe. Fatal if every slot is occupied, or if
    /// `context` is [`ThreadContext::None`] - no dispatch pass would ever
    /// match such a task, so its slot could never be reclaimed.
    pub fn schedule(
        &self,
        action: Action,
        context: ThreadContext,
        delay_ticks: TickCount,
        reset_ticks: TickCount,
    ) -> TaskId {
        self.schedule_opt(Some(action), context, delay_ticks, reset_ticks)
    }

    pub(crate) fn schedule_opt(
        &self,
        action: Option<Action>,
        context: ThreadContext,
        delay_ticks: TickCount,
        reset_ticks: TickCount,
    ) -> TaskId {
        if context == ThreadContext::None {
            crash::die("scheduled a task with no context");
        }
        for task in &self.tasks {
            let Some(id) =
                task.try_schedule(action, context, delay_ticks, reset_ticks, &self.counters)
            else {
                continue;
            };
            trace!("scheduled {} (delay {})", id, delay_ticks);
            if delay_ticks != 0 {
                self.delay_wake.release();
            } else {
                self.dispatch.release();
            }
            return id;
        }
        crash::die("task pool exhausted");
    }

    /// Run the dispatch loop for the `Application` context. Never returns.
    ///
    /// Spawns the delay-tick thread, then serves immediate tasks whenever
    /// the dispatch semaphore says there is something to do. Call exactly
    /// once, from the thread that is to own the `Application` context.
    pub fn start(&'static self) -> ! {
        self.delay_thread.start(
            self as *const TaskScheduler<N> as ThreadArg,
            delay_loop_entry::<N>,
            "kennel-delay",
            Priority::BELOW_NORMAL,
        );
        debug!("dispatch loop running");
        if self.counters.immediate() == 0 {
            self.dispatch.wait_forever();
        }
        loop {
            if self.counters.immediate() != 0 {
                self.process_immediate(ThreadContext::Application);
            }
            self.dispatch.wait_forever();
        }
    }

    /// Serve immediate tasks for the `Frame` context.
    ///
    /// Unlike [`TaskScheduler::start`] this neither owns a thread nor
    /// blocks; an external periodic driver (a display refresh loop, say)
    /// calls it once per frame.
    pub fn frame_tick(&self) {
        if self.counters.immediate() == 0 {
            return;
        }
        self.process_immediate(ThreadContext::Frame);
    }

    /// Cancel an active task. Always zeroes `id`.
    ///
    /// Thread and interrupt safe; idempotent - a stale or zero identifier
    /// cancels nothing but is still cleared, so the handle cannot go stale.
    pub fn cancel(&self, id: &mut TaskId) {
        if id.is_none() {
            return;
        }
        for task in &self.tasks {
            if task.cancel(id, &self.counters) {
                trace!("cancelled a task");
                return;
            }
        }
        *id = TaskId::NONE;
    }

    /// Process every due task matching `context`, in pool order, waking the
    /// delay-tick thread for each task that re-armed. Without that wake a
    /// recurring task whose promotion emptied the delayed count would leave
    /// the delay thread blocked and never fire again.
    pub(crate) fn process_immediate(&self, context: ThreadContext) {
        for task in &self.tasks {
            if task.process(context, &self.counters) {
                self.delay_wake.release();
            }
        }
    }

    /// Age every delayed task one tick, waking the dispatch loop for each
    /// task that just became immediate.
    pub(crate) fn process_delayed(&self) {
        for task in &self.tasks {
            if task.delay_tick(&self.counters) {
                self.dispatch.release();
            }
        }
    }

    pub(crate) fn immediate_count(&self) -> usize {
        self.counters.immediate()
    }

    pub(crate) fn delayed_count(&self) -> usize {
        self.counters.delayed()
    }
}

impl<const N: usize> Default for TaskScheduler<N> {
    fn default() -> TaskScheduler<N> {
        TaskScheduler::new()
    }
}

/// The delay-tick thread: ages delayed tasks once per native tick while any
/// exist, and sleeps on the wake semaphore while none do.
fn delay_loop_entry<const N: usize>(arg: ThreadArg) {
    // SAFETY: `TaskScheduler::start` takes `&'static self` and passes its
    // own address, so the pointer is valid forever.
    let scheduler = unsafe { &*(arg as *const TaskScheduler<N>) };
    loop {
        if scheduler.delayed_count() != 0 {
            scheduler.process_delayed();
        }
        if scheduler.delayed_count() != 0 {
            kernel::delay(1);
        } else {
            scheduler.delay_wake.wait_forever();
        }
    }
}


// End of File
