//! Contains the [`Event`] type

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use core::sync::atomic::{AtomicBool, Ordering};

use crate::app_thread::AppThread;
use crate::kernel::ThreadArg;
use crate::task::ThreadContext;

/// A coalescing, single-subscriber event channel.
///
/// [`Event::call`] hands an argument to the subscriber on the event's
/// target context. Calls arriving faster than they can be delivered
/// coalesce: only the newest argument survives and the subscriber runs
/// once for the whole burst. When the caller is already on the target
/// context the handler runs inline instead of round-tripping through the
/// scheduler.
///
/// The handler runs with the event's internal lock held, so it must not
/// call back into the same event.
pub struct Event<S: Sync + 'static, A: Send + 'static> {
    app: &'static AppThread,
    context: ThreadContext,
    state: spin::Mutex<State<S, A>>,
    /// Set between a call and its delivery; a second call in that window
    /// only replaces the stored argument.
    pending: AtomicBool,
}

struct State<S: 'static, A> {
    subscriber: Option<(&'static S, fn(&S, &mut A))>,
    argument: Option<A>,
}

impl<S: Sync + 'static, A: Send + 'static> Event<S, A> {
    /// An event delivered on `context`, with no subscriber yet.
    pub const fn new(app: &'static AppThread, context: ThreadContext) -> Event<S, A> {
        Event {
            app,
            context,
            state: spin::Mutex::new(State {
                subscriber: None,
                argument: None,
            }),
            pending: AtomicBool::new(false),
        }
    }

    /// Attach the subscriber, replacing any previous one.
    pub fn subscribe(&self, instance: &'static S, handler: fn(&S, &mut A)) {
        self.state.lock().subscriber = Some((instance, handler));
    }

    /// Detach the subscriber and discard any undelivered argument.
    pub fn unsubscribe(&self) {
        let mut state = self.state.lock();
        state.subscriber = None;
        state.argument = None;
        self.pending.store(false, Ordering::Release);
    }

    /// Raise the event with `argument`.
    ///
    /// Safe from any thread and from interrupt context. If a previous call
    /// has not been delivered yet the old argument is replaced and no
    /// second delivery is queued.
    pub fn call(&'static self, argument: A) {
        self.state.lock().argument = Some(argument);
        if self.pending.swap(true, Ordering::AcqRel) {
            trace!("coalesced an event call");
            return;
        }
        if self.app.is_current_thread(self.context) {
            self.deliver();
        } else {
            // a None-context event only gets here from an interrupt
            // handler; its delivery runs on the application thread, since a
            // None-context task would never be dispatched
            let target = match self.context {
                ThreadContext::None => ThreadContext::Application,
                other => other,
            };
            self.app
                .sync_with(self as *const Event<S, A> as ThreadArg, Self::relay, target);
        }
    }

    fn deliver(&self) {
        let mut state = self.state.lock();
        let State {
            subscriber,
            argument,
        } = &mut *state;
        if let (Some((instance, handler)), Some(argument)) = (*subscriber, argument.as_mut()) {
            handler(instance, argument);
        }
        state.argument = None;
        self.pending.store(false, Ordering::Release);
    }

    fn relay(argument: ThreadArg) {
        // SAFETY: only `call` schedules this, passing a pointer derived
        // from a &'static Event of the matching S and A.
        let event = unsafe { &*(argument as *const Event<S, A>) };
        event.deliver();
    }
}


// End of File
