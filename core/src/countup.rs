//! Number count-up effect.
//!
//! A counter element such as `120+` is read once, then redrawn from 0 up to
//! its value on a fixed 16 ms tick when it first becomes visible.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::formatting::format_count;
use dreamjob_types::{CountUpConfig, NumberGrouping};
use tracing::debug;

use crate::bindings::Bindings;
use crate::error::EffectError;
use crate::host::{Host, TimerId};
use crate::viewport::{ViewportWatcher, Watch, WatchOptions};

/// One frame at 60 Hz.
pub const TICK_INTERVAL_MS: u32 = 16;

/// Target value and suffix read from a counter's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTarget {
    pub value: u64,
    pub suffix: String,
}

/// Read a counter's target from its text: every non-digit is dropped and a
/// `+` anywhere in the text becomes the suffix. Zero or digit-free text has
/// no target.
pub fn parse_count_target(text: &str) -> Option<CountTarget> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let value: u64 = digits.parse().ok()?;
    if value == 0 {
        return None;
    }
    let suffix = if text.contains('+') { "+" } else { "" };
    Some(CountTarget {
        value,
        suffix: suffix.to_string(),
    })
}

/// Progress of one running counter.
///
/// `current` only grows and is clamped to `target`; once it gets there the
/// state is done and further ticks change nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CountUpState {
    current: f64,
    target: u64,
    step: f64,
    suffix: String,
    started_at: f64,
    done: bool,
}

impl CountUpState {
    pub fn new(target: u64, duration_ms: u32, suffix: &str, started_at: f64) -> Self {
        let ticks = duration_ms as f64 / TICK_INTERVAL_MS as f64;
        let step = if ticks > 0.0 {
            target as f64 / ticks
        } else {
            target as f64
        };
        Self {
            current: 0.0,
            target,
            step,
            suffix: suffix.to_string(),
            started_at,
            done: false,
        }
    }

    /// Advance one tick. Returns the value to display, or `None` once done.
    pub fn tick(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        self.current += self.step;
        if self.current >= self.target as f64 {
            self.current = self.target as f64;
            self.done = true;
            Some(self.target)
        } else {
            Some(self.current.floor() as u64)
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

struct CountUpInner<H: Host> {
    host: Rc<H>,
    duration_ms: u32,
    grouping: NumberGrouping,
    watcher: ViewportWatcher<H>,
    running: RefCell<Vec<(H::Node, TimerId)>>,
    done: RefCell<Vec<H::Node>>,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> CountUpInner<H> {
    /// Stop the interval for `node` and mark it done for good.
    fn finish(&self, node: &H::Node) {
        let entry = {
            let mut running = self.running.borrow_mut();
            running
                .iter()
                .position(|(n, _)| n == node)
                .map(|pos| running.remove(pos))
        };
        if let Some((node, id)) = entry {
            self.host.clear_timer(id);
            self.bindings.borrow_mut().forget_timer(id);
            debug!(?node, "Count-up finished");
            self.done.borrow_mut().push(node);
        }
    }
}

/// Handle to the count-up animator. Clones share state.
pub struct CountUpAnimator<H: Host> {
    inner: Rc<CountUpInner<H>>,
}

impl<H: Host> Clone for CountUpAnimator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> CountUpAnimator<H> {
    pub fn new(host: &Rc<H>, config: &CountUpConfig, options: WatchOptions) -> Self {
        Self {
            inner: Rc::new(CountUpInner {
                host: host.clone(),
                duration_ms: config.duration_ms,
                grouping: config.grouping,
                watcher: ViewportWatcher::new(host, options),
                running: RefCell::new(Vec::new()),
                done: RefCell::new(Vec::new()),
                bindings: RefCell::new(Bindings::new()),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Watch every counter element; each counts up when first visible.
    pub fn mount(
        host: &Rc<H>,
        config: &CountUpConfig,
        options: WatchOptions,
    ) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled { component: "count_up" });
        }
        let counters = host.query_all(&config.selector);
        if counters.is_empty() {
            return Err(EffectError::missing(config.selector.as_str()));
        }

        let animator = Self::new(host, config, options);
        for node in &counters {
            let weak = Rc::downgrade(&animator.inner);
            let outcome = animator.inner.watcher.watch(node, move |node| {
                if let Some(inner) = weak.upgrade() {
                    CountUpAnimator { inner }.animate_from_text(node);
                }
            });
            if outcome == Watch::Unsupported {
                animator.animate_from_text(node);
            }
        }
        debug!(count = counters.len(), "Count-up animator mounted");
        Ok(animator)
    }

    /// Parse the element's own text and count up to it with the configured
    /// duration. Unparsable or zero text leaves the element untouched.
    pub fn animate_from_text(&self, node: &H::Node) {
        let text = self.inner.host.text_content(node);
        let Some(target) = parse_count_target(&text) else {
            debug!(?node, %text, "Counter has no numeric target");
            return;
        };
        self.animate(node, target.value, self.inner.duration_ms, &target.suffix);
    }

    /// Count `node` up from 0 to `target`, appending `suffix` to every frame.
    /// No-op for a zero target, a running counter or a finished one.
    pub fn animate(&self, node: &H::Node, target: u64, duration_ms: u32, suffix: &str) {
        let inner = &self.inner;
        if inner.destroyed.get() || target == 0 {
            return;
        }
        if inner.done.borrow().contains(node)
            || inner.running.borrow().iter().any(|(n, _)| n == node)
        {
            return;
        }

        let mut state = CountUpState::new(target, duration_ms, suffix, inner.host.now());
        let weak = Rc::downgrade(inner);
        let element = node.clone();
        let id = inner.host.set_interval(
            TICK_INTERVAL_MS,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else { return };
                if inner.destroyed.get() {
                    return;
                }
                let Some(value) = state.tick() else { return };
                let text = format_count(value, state.suffix(), inner.grouping);
                inner.host.set_text_content(&element, &text);
                if state.is_done() {
                    inner.finish(&element);
                }
            }),
        );
        inner.running.borrow_mut().push((node.clone(), id));
        inner.bindings.borrow_mut().track_timer(id);
    }

    pub fn is_running(&self, node: &H::Node) -> bool {
        self.inner.running.borrow().iter().any(|(n, _)| n == node)
    }

    pub fn is_done(&self, node: &H::Node) -> bool {
        self.inner.done.borrow().contains(node)
    }

    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.watcher.destroy();
        inner.running.borrow_mut().clear();
        inner.bindings.borrow_mut().release(&*inner.host);
    }
}
