//! Listener and timer bookkeeping.
//!
//! Each component records every listener and timer it creates in a
//! [`Bindings`] so `destroy()` can release them all.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::host::{EventHandler, EventKind, Events, ListenTarget, ListenerId, Scheduler, TimerId};

#[derive(Debug, Default)]
pub(crate) struct Bindings {
    listeners: Vec<ListenerId>,
    timers: Vec<TimerId>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener and remember it. Returns false if the host refused.
    pub fn listen<H: Events>(
        &mut self,
        host: &H,
        target: ListenTarget<H::Node>,
        kind: EventKind,
        handler: EventHandler<H::Node>,
    ) -> bool {
        match host.listen(target, kind, handler) {
            Some(id) => {
                self.listeners.push(id);
                true
            }
            None => false,
        }
    }

    pub fn track_timer(&mut self, id: TimerId) {
        self.timers.push(id);
    }

    /// Drop a timer that finished on its own.
    pub fn forget_timer(&mut self, id: TimerId) {
        self.timers.retain(|t| *t != id);
    }

    #[cfg(test)]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.timers.is_empty()
    }

    /// Detach every listener and cancel every timer.
    pub fn release<H: Events + Scheduler>(&mut self, host: &H) {
        for id in self.listeners.drain(..) {
            host.unlisten(id);
        }
        for id in self.timers.drain(..) {
            host.clear_timer(id);
        }
    }
}

/// Component state that owns a [`Bindings`].
pub(crate) trait HasBindings: 'static {
    fn bindings(&self) -> &RefCell<Bindings>;
}

/// Run `callback` once after `delay_ms`. The timer is tracked by the owner's
/// bindings until it fires, so `release` only ever cancels pending timers.
/// Nothing runs if the owner has been dropped by then.
pub(crate) fn track_timeout<H, T>(
    host: &H,
    owner: &Rc<T>,
    delay_ms: u32,
    callback: impl FnOnce(&Rc<T>) + 'static,
) -> TimerId
where
    H: Scheduler,
    T: HasBindings,
{
    let weak = Rc::downgrade(owner);
    let slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
    let fired = slot.clone();
    let id = host.set_timeout(
        delay_ms,
        Box::new(move || {
            let Some(owner) = weak.upgrade() else { return };
            if let Some(id) = fired.get() {
                owner.bindings().borrow_mut().forget_timer(id);
            }
            callback(&owner);
        }),
    );
    slot.set(Some(id));
    owner.bindings().borrow_mut().track_timer(id);
    id
}

/// Trailing-edge debounce: only the last call within the window runs.
#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    pending: Cell<Option<TimerId>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback`, cancelling any call still waiting.
    pub fn schedule<H: Scheduler>(
        &self,
        host: &H,
        delay_ms: u32,
        callback: Box<dyn FnOnce()>,
    ) -> TimerId {
        if let Some(previous) = self.pending.take() {
            host.clear_timer(previous);
        }
        let id = host.set_timeout(delay_ms, callback);
        self.pending.set(Some(id));
        id
    }

    pub fn cancel<H: Scheduler>(&self, host: &H) {
        if let Some(id) = self.pending.take() {
            host.clear_timer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Propagation;
    use crate::testing::FakeHost;

    #[test]
    fn test_release_clears_listeners_and_timers() {
        let host = FakeHost::new();
        let mut bindings = Bindings::new();
        assert!(bindings.listen(
            &*host,
            ListenTarget::Window,
            EventKind::Scroll,
            Box::new(|_| Propagation::Continue),
        ));
        bindings.track_timer(host.set_interval(16, Box::new(|| {})));
        assert_eq!(host.active_listeners(), 1);
        assert_eq!(host.active_timers(), 1);

        bindings.release(&*host);
        assert!(bindings.is_empty());
        assert_eq!(host.active_listeners(), 0);
        assert_eq!(host.active_timers(), 0);
    }

    struct Owner {
        bindings: RefCell<Bindings>,
    }

    impl HasBindings for Owner {
        fn bindings(&self) -> &RefCell<Bindings> {
            &self.bindings
        }
    }

    #[test]
    fn test_fired_timeout_is_forgotten() {
        let host = FakeHost::new();
        let owner = Rc::new(Owner {
            bindings: RefCell::new(Bindings::new()),
        });
        let calls = Rc::new(Cell::new(0));

        for delay in [0, 100, 200] {
            let calls = calls.clone();
            track_timeout(&*host, &owner, delay, move |_| calls.set(calls.get() + 1));
        }
        assert_eq!(owner.bindings.borrow().timer_count(), 3);

        host.advance(100);
        assert_eq!(calls.get(), 2);
        assert_eq!(owner.bindings.borrow().timer_count(), 1);

        owner.bindings.borrow_mut().release(&*host);
        host.advance(500);
        assert_eq!(calls.get(), 2);
        assert!(owner.bindings.borrow().is_empty());
    }

    #[test]
    fn test_debouncer_runs_last_call_only() {
        let host = FakeHost::new();
        let debouncer = Debouncer::new();
        let calls = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            debouncer.schedule(&*host, 250, Box::new(move || calls.set(calls.get() + 1)));
            host.advance(100);
        }
        assert_eq!(calls.get(), 0);

        host.advance(250);
        assert_eq!(calls.get(), 1);
        assert_eq!(host.active_timers(), 0);
    }
}
