//! Contains the [`Task`] type and its control block

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::kernel::{ThreadArg, TickCount};

/// A named logical owner of scheduled work.
///
/// Which native thread actually executes the work is an implementation
/// detail; tasks target a context, and a context is pumped either by the
/// scheduler's own dispatch loop (`Application`) or by an external periodic
/// caller (`Frame`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThreadContext {
    /// No context - the value of an empty task slot. As a query argument it
    /// means "any thread, as long as it is not an interrupt handler".
    None,
    /// The thread that runs the scheduler's dispatch loop.
    Application,
    /// The thread that calls the periodic frame tick, typically a display
    /// refresh loop.
    Frame,
}

/// A scheduled task identifier. Identifiers are unique and never reused
/// while live; zero is reserved for "no task".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TaskId(u32);

impl TaskId {
    /// The reserved "no task" identifier.
    pub const NONE: TaskId = TaskId(0);

    /// Is this the reserved "no task" identifier?
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for TaskId {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_none() {
            write!(fmt, "T---")
        } else {
            write!(fmt, "T{:03}", self.0)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskId {
    fn format(&self, fmt: defmt::Formatter) {
        if self.is_none() {
            defmt::write!(fmt, "T---");
        } else {
            defmt::write!(fmt, "T{=u32:03}", self.0);
        }
    }
}

/// The process-wide identifier counter. Pre-incremented on claim, shared by
/// every scheduler instance, skips zero on wrap.
static NEXT_TASK_ID: AtomicU32 = AtomicU32::new(0);

fn next_task_id() -> TaskId {
    loop {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if id != 0 {
            return TaskId(id);
        }
    }
}

/// A scheduled callback: a plain function, or a function with one captured
/// binding argument.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    /// Call a function with no argument.
    Plain(fn()),
    /// Call a function with the stored binding argument.
    Bound(fn(ThreadArg), ThreadArg),
}

impl Action {
    /// An action calling `f` with no argument.
    pub const fn plain(f: fn()) -> Action {
        Action::Plain(f)
    }

    /// An action calling `f` with `arg`.
    pub const fn bound(f: fn(ThreadArg), arg: ThreadArg) -> Action {
        Action::Bound(f, arg)
    }

    pub(crate) fn invoke(self) {
        match self {
            Action::Plain(f) => f(),
            Action::Bound(f, arg) => f(arg),
        }
    }
}

/// The bookkeeping for one scheduled call.
///
/// A zero `id` means the slot is free and every other field is at its empty
/// value. A `None` action in an occupied slot is legal: that task is a
/// no-op completion marker.
#[derive(Clone, Copy)]
pub(crate) struct TaskControlBlock {
    /// Identifier; [`TaskId::NONE`] while the slot is free.
    id: TaskId,
    /// What to call.
    action: Option<Action>,
    /// Where to call it.
    context: ThreadContext,
    /// Kernel ticks left before the call may fire.
    delay_ticks: TickCount,
    /// The value `delay_ticks` is re-armed to after firing; zero for
    /// one-shot tasks.
    reset_ticks: TickCount,
}

impl TaskControlBlock {
    const fn empty() -> TaskControlBlock {
        TaskControlBlock {
            id: TaskId::NONE,
            action: None,
            context: ThreadContext::None,
            delay_ticks: 0,
            reset_ticks: 0,
        }
    }

    fn clear(&mut self) {
        *self = TaskControlBlock::empty();
    }
}

/// Occupancy counters for a task pool, used by the dispatch and delay loops
/// to avoid scanning an empty pool.
///
/// Advisory accelerators only, but kept exactly consistent with the per-task
/// state on every transition. Decrements saturate at zero.
pub(crate) struct Counters {
    immediate: AtomicUsize,
    delayed: AtomicUsize,
}

impl Counters {
    pub(crate) const fn new() -> Counters {
        Counters {
            immediate: AtomicUsize::new(0),
            delayed: AtomicUsize::new(0),
        }
    }

    pub(crate) fn immediate(&self) -> usize {
        self.immediate.load(Ordering::Acquire)
    }

    pub(crate) fn delayed(&self) -> usize {
        self.delayed.load(Ordering::Acquire)
    }

    fn inc(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::AcqRel);
    }

    fn dec(counter: &AtomicUsize) {
        let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1));
    }
}

/// One fixed slot in the task pool: a control block and the private lock
/// that guards every read, modify and clear of it.
///
/// Tasks are created empty and live for the whole process; a slot returns to
/// the pool purely by having its identifier zeroed. The lock is a spin lock,
/// so claiming, cancelling and ticking are all safe from interrupt context -
/// every critical section here is a few field writes, never a wait.
pub struct Task {
    tcb: spin::Mutex<TaskControlBlock>,
}

impl Task {
    /// Create an empty task slot.
    pub(crate) const fn new() -> Task {
        Task {
            tcb: spin::Mutex::new(TaskControlBlock::empty()),
        }
    }

    /// Is the slot occupied? Thread safe, but only a snapshot.
    pub fn is_occupied(&self) -> bool {
        !self.tcb.lock().id.is_none()
    }

    /// Claim the slot if it is free and fill in the control block, updating
    /// the matching occupancy counter. Returns the new identifier, or `None`
    /// if the slot was already taken.
    pub(crate) fn try_schedule(
        &self,
        action: Option<Action>,
        context: ThreadContext,
        delay_ticks: TickCount,
        reset_ticks: TickCount,
        counters: &Counters,
    ) -> Option<TaskId> {
        let mut tcb = self.tcb.lock();
        if !tcb.id.is_none() {
            return None;
        }
        let id = next_task_id();
        *tcb = TaskControlBlock {
            id,
            action,
            context,
            delay_ticks,
            reset_ticks,
        };
        if delay_ticks != 0 {
            Counters::inc(&counters.delayed);
        } else {
            Counters::inc(&counters.immediate);
        }
        Some(id)
    }

    /// Run the task if it is occupied, due (zero delay) and targeted at
    /// `context`; otherwise do nothing.
    ///
    /// The action is invoked on a snapshot taken under the lock, with the
    /// lock released - an action may schedule or cancel tasks itself. On
    /// completion the slot either re-arms (recurring) or clears (one-shot).
    /// If the task was cancelled while its action ran, the losing side's
    /// bookkeeping is skipped here.
    ///
    /// Returns true exactly when the task re-armed, i.e. it just became
    /// delayed again and the delay-tick thread must be woken.
    pub(crate) fn process(&self, context: ThreadContext, counters: &Counters) -> bool {
        let snapshot = *self.tcb.lock();
        if snapshot.id.is_none() || snapshot.delay_ticks != 0 || snapshot.context != context {
            return false;
        }
        if let Some(action) = snapshot.action {
            action.invoke();
        }
        let mut tcb = self.tcb.lock();
        if tcb.id != snapshot.id {
            // cancelled (or cancelled and re-claimed) while the action ran
            return false;
        }
        if tcb.reset_ticks != 0 {
            // the task stops being immediate and becomes delayed again
            tcb.delay_ticks = tcb.reset_ticks;
            Counters::dec(&counters.immediate);
            Counters::inc(&counters.delayed);
            trace!("re-armed recurring task");
            true
        } else {
            Counters::dec(&counters.immediate);
            tcb.clear();
            false
        }
    }

    /// Age a delayed task by one tick.
    ///
    /// Returns true exactly when this call moved the delay to zero, i.e. the
    /// task just became immediate and the dispatcher should be woken.
    pub(crate) fn delay_tick(&self, counters: &Counters) -> bool {
        let mut tcb = self.tcb.lock();
        if tcb.id.is_none() || tcb.delay_ticks == 0 {
            return false;
        }
        tcb.delay_ticks -= 1;
        let zeroed = tcb.delay_ticks == 0;
        if zeroed {
            // the task becomes immediate and stops being delayed; the
            // counters move while the slot lock is held so a concurrent
            // cancel always sees them matching the block
            Counters::inc(&counters.immediate);
            Counters::dec(&counters.delayed);
        }
        zeroed
    }

    /// Clear the slot if it currently holds `id`, zeroing the caller's
    /// handle. Returns whether this slot matched. A mismatch (stale or zero
    /// identifier) is a benign no-op.
    pub(crate) fn cancel(&self, id: &mut TaskId, counters: &Counters) -> bool {
        let mut tcb = self.tcb.lock();
        if id.is_none() || tcb.id != *id {
            return false;
        }
        if tcb.delay_ticks != 0 {
            Counters::dec(&counters.delayed);
        } else {
            Counters::dec(&counters.immediate);
        }
        tcb.clear();
        *id = TaskId::NONE;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32 as TestCounter, Ordering::SeqCst};

    static FIRED: TestCounter = TestCounter::new(0);

    fn fire() {
        FIRED.fetch_add(1, SeqCst);
    }

    #[test]
    fn identifiers_are_unique_and_nonzero() {
        let counters = Counters::new();
        let task = Task::new();
        let a = task
            .try_schedule(None, ThreadContext::Application, 0, 0, &counters)
            .unwrap();
        let mut a_copy = a;
        assert!(task.cancel(&mut a_copy, &counters));
        let b = task
            .try_schedule(None, ThreadContext::Application, 0, 0, &counters)
            .unwrap();
        assert!(!a.is_none());
        assert!(!b.is_none());
        assert_ne!(a, b);
    }

    #[test]
    fn occupied_slot_refuses_a_second_claim() {
        let counters = Counters::new();
        let task = Task::new();
        assert!(
            task.try_schedule(None, ThreadContext::Application, 0, 0, &counters)
                .is_some()
        );
        assert!(
            task.try_schedule(None, ThreadContext::Application, 0, 0, &counters)
                .is_none()
        );
    }

    #[test]
    fn one_shot_runs_once_and_frees_the_slot() {
        FIRED.store(0, SeqCst);
        let counters = Counters::new();
        let task = Task::new();
        task.try_schedule(
            Some(Action::plain(fire)),
            ThreadContext::Application,
            0,
            0,
            &counters,
        )
        .unwrap();
        assert_eq!(counters.immediate(), 1);
        // a one-shot completion is not a re-arm
        assert!(!task.process(ThreadContext::Application, &counters));
        assert_eq!(FIRED.load(SeqCst), 1);
        assert!(!task.is_occupied());
        assert_eq!(counters.immediate(), 0);
        // a second pass must not fire it again
        task.process(ThreadContext::Application, &counters);
        assert_eq!(FIRED.load(SeqCst), 1);
    }

    #[test]
    fn wrong_context_is_not_processed() {
        FIRED.store(0, SeqCst);
        let counters = Counters::new();
        let task = Task::new();
        task.try_schedule(
            Some(Action::plain(fire)),
            ThreadContext::Frame,
            0,
            0,
            &counters,
        )
        .unwrap();
        task.process(ThreadContext::Application, &counters);
        assert_eq!(FIRED.load(SeqCst), 0);
        assert!(task.is_occupied());
        task.process(ThreadContext::Frame, &counters);
        assert_eq!(FIRED.load(SeqCst), 1);
    }

    #[test]
    fn recurring_task_rearms_with_its_reset() {
        FIRED.store(0, SeqCst);
        let counters = Counters::new();
        let task = Task::new();
        let mut id = task
            .try_schedule(
                Some(Action::plain(fire)),
                ThreadContext::Application,
                2,
                2,
                &counters,
            )
            .unwrap();
        assert_eq!(counters.delayed(), 1);
        // not due yet
        task.process(ThreadContext::Application, &counters);
        assert_eq!(FIRED.load(SeqCst), 0);

        assert!(!task.delay_tick(&counters));
        assert!(task.delay_tick(&counters));
        assert_eq!(counters.immediate(), 1);
        // a re-arm must be reported, so the delay thread gets woken
        assert!(task.process(ThreadContext::Application, &counters));
        assert_eq!(FIRED.load(SeqCst), 1);
        // re-armed, occupied and delayed again with the same interval
        assert!(task.is_occupied());
        assert_eq!(counters.delayed(), 1);
        assert!(!task.delay_tick(&counters));
        assert!(task.delay_tick(&counters));
        task.process(ThreadContext::Application, &counters);
        assert_eq!(FIRED.load(SeqCst), 2);

        assert!(task.cancel(&mut id, &counters));
        assert!(id.is_none());
        assert!(!task.is_occupied());
        assert_eq!(counters.immediate() + counters.delayed(), 0);
    }

    #[test]
    fn delay_tick_promotes_on_the_exact_tick() {
        let counters = Counters::new();
        let task = Task::new();
        task.try_schedule(None, ThreadContext::Application, 3, 0, &counters)
            .unwrap();
        assert!(!task.delay_tick(&counters));
        assert!(!task.delay_tick(&counters));
        assert_eq!(counters.immediate(), 0);
        assert!(task.delay_tick(&counters));
        assert_eq!((counters.immediate(), counters.delayed()), (1, 0));
        // already immediate, further ticks do nothing
        assert!(!task.delay_tick(&counters));
    }

    #[test]
    fn counters_stay_consistent_across_promotion_and_cancel() {
        let counters = Counters::new();
        let task = Task::new();
        let mut id = task
            .try_schedule(None, ThreadContext::Application, 1, 0, &counters)
            .unwrap();
        assert_eq!((counters.immediate(), counters.delayed()), (0, 1));
        assert!(task.delay_tick(&counters));
        assert_eq!((counters.immediate(), counters.delayed()), (1, 0));
        assert!(task.cancel(&mut id, &counters));
        assert_eq!((counters.immediate(), counters.delayed()), (0, 0));
    }

    #[test]
    fn cancel_with_a_stale_identifier_is_benign() {
        let counters = Counters::new();
        let task = Task::new();
        let mut id = task
            .try_schedule(None, ThreadContext::Application, 0, 0, &counters)
            .unwrap();
        // the one-shot completes naturally
        task.process(ThreadContext::Application, &counters);
        assert!(!task.is_occupied());
        // the slot is re-used by somebody else
        let other = task
            .try_schedule(None, ThreadContext::Application, 0, 0, &counters)
            .unwrap();
        // cancelling the stale identifier must not touch the new occupant
        assert!(!task.cancel(&mut id, &counters));
        assert!(task.is_occupied());
        assert_eq!(task.tcb.lock().id, other);
    }

    #[test]
    fn cancel_none_is_a_no_op() {
        let counters = Counters::new();
        let task = Task::new();
        let mut id = TaskId::NONE;
        assert!(!task.cancel(&mut id, &counters));
    }

    #[test]
    fn task_id_formats_like_a_slot_label() {
        assert_eq!(format!("{}", TaskId::NONE), "T---");
        assert_eq!(format!("{}", TaskId(7)), "T007");
    }
}

// End of File
