//! Reveal-on-scroll animations.
//!
//! Elements start hidden and offset, then fade and slide into place the
//! first time they enter the viewport. Each element animates at most once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::RevealConfig;
use dreamjob_types::formatting::{format_css_secs, format_translate_y};
use tracing::debug;

use crate::bindings::{Bindings, HasBindings, track_timeout};
use crate::error::EffectError;
use crate::host::Host;
use crate::special::SpecialEffects;
use crate::viewport::{ViewportWatcher, Watch, WatchOptions};

/// Lifecycle of a tracked element. One-way: `Unseen` -> `Animated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Unseen,
    Animated,
}

#[derive(Debug, Clone)]
pub struct TrackedElement<N> {
    pub node: N,
    pub state: RevealState,
}

struct RevealInner<H: Host> {
    host: Rc<H>,
    offset_px: f64,
    duration_ms: u32,
    watcher: ViewportWatcher<H>,
    effects: SpecialEffects<H>,
    tracked: RefCell<Vec<TrackedElement<H::Node>>>,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> HasBindings for RevealInner<H> {
    fn bindings(&self) -> &RefCell<Bindings> {
        &self.bindings
    }
}

/// Handle to the reveal animator. Clones share state.
pub struct RevealAnimator<H: Host> {
    inner: Rc<RevealInner<H>>,
}

impl<H: Host> Clone for RevealAnimator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> RevealAnimator<H> {
    pub fn new(host: &Rc<H>, config: &RevealConfig, options: WatchOptions) -> Self {
        Self {
            inner: Rc::new(RevealInner {
                host: host.clone(),
                offset_px: config.offset_px,
                duration_ms: config.duration_ms(),
                watcher: ViewportWatcher::new(host, options),
                effects: SpecialEffects::new(host, &config.special_effects),
                tracked: RefCell::new(Vec::new()),
                bindings: RefCell::new(Bindings::new()),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Find every element matching the configured selectors, hide them and
    /// start watching.
    pub fn mount(
        host: &Rc<H>,
        config: &RevealConfig,
        options: WatchOptions,
    ) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled { component: "reveal" });
        }

        let mut elements: Vec<H::Node> = Vec::new();
        for selector in &config.selectors {
            for node in host.query_all(selector) {
                if !elements.contains(&node) {
                    elements.push(node);
                }
            }
        }
        if elements.is_empty() {
            return Err(EffectError::missing(config.selectors.join(", ")));
        }

        let animator = Self::new(host, config, options);
        animator.prepare(&elements);
        animator.observe(&elements);
        debug!(count = elements.len(), "Reveal animator mounted");
        Ok(animator)
    }

    /// Put elements in their hidden, offset starting state and track them.
    pub fn prepare(&self, elements: &[H::Node]) {
        if self.inner.destroyed.get() {
            return;
        }
        let host = &self.inner.host;
        let secs = format_css_secs(self.inner.duration_ms);
        let transition = format!("opacity {secs} ease, transform {secs} ease");
        let offset = format_translate_y(self.inner.offset_px);

        let mut tracked = self.inner.tracked.borrow_mut();
        for node in elements {
            if tracked.iter().any(|t| &t.node == node) {
                continue;
            }
            host.set_style(node, "opacity", "0");
            host.set_style(node, "transform", &offset);
            host.set_style(node, "transition", &transition);
            tracked.push(TrackedElement {
                node: node.clone(),
                state: RevealState::Unseen,
            });
        }
    }

    /// Watch elements; ones that cannot be watched are revealed right away.
    pub fn observe(&self, elements: &[H::Node]) {
        for node in elements {
            let weak = Rc::downgrade(&self.inner);
            let outcome = self.inner.watcher.watch(node, move |node| {
                if let Some(inner) = weak.upgrade() {
                    RevealAnimator { inner }.on_visible(node);
                }
            });
            if outcome == Watch::Unsupported {
                self.on_visible(node);
            }
        }
    }

    /// Move `node` to its final visible state and start any special effects
    /// matching it. Calling it again for the same element does nothing.
    pub fn on_visible(&self, node: &H::Node) {
        if self.inner.destroyed.get() {
            return;
        }
        {
            let mut tracked = self.inner.tracked.borrow_mut();
            match tracked.iter_mut().find(|t| &t.node == node) {
                Some(t) if t.state == RevealState::Animated => return,
                Some(t) => t.state = RevealState::Animated,
                None => tracked.push(TrackedElement {
                    node: node.clone(),
                    state: RevealState::Animated,
                }),
            }
        }

        let host = &self.inner.host;
        host.set_style(node, "opacity", "1");
        host.set_style(node, "transform", &format_translate_y(0.0));
        self.inner.watcher.unwatch(node);
        self.inner.effects.apply(node);
        debug!(?node, "Revealed element");
    }

    pub fn state_of(&self, node: &H::Node) -> Option<RevealState> {
        self.inner
            .tracked
            .borrow()
            .iter()
            .find(|t| &t.node == node)
            .map(|t| t.state)
    }

    /// Register an element added after mount.
    pub fn observe_new_element(&self, node: &H::Node) {
        self.prepare(std::slice::from_ref(node));
        self.observe(std::slice::from_ref(node));
    }

    /// Reveal `node`, special effects included, after `delay_ms` regardless
    /// of scroll position.
    pub fn animate_element(&self, node: &H::Node, delay_ms: u32) {
        if self.inner.destroyed.get() {
            return;
        }
        let target = node.clone();
        track_timeout(&*self.inner.host, &self.inner, delay_ms, move |inner| {
            RevealAnimator {
                inner: inner.clone(),
            }
            .on_visible(&target);
        });
    }

    /// Reveal elements one after another, `interval_ms` apart.
    pub fn animate_sequence(&self, elements: &[H::Node], interval_ms: u32) {
        for (index, node) in elements.iter().enumerate() {
            self.animate_element(node, index as u32 * interval_ms);
        }
    }

    /// Layout may have changed: watch elements that are still hidden again.
    pub fn handle_resize(&self) {
        if self.inner.destroyed.get() {
            return;
        }
        let unseen: Vec<H::Node> = self
            .inner
            .tracked
            .borrow()
            .iter()
            .filter(|t| t.state == RevealState::Unseen)
            .map(|t| t.node.clone())
            .collect();
        self.observe(&unseen);
    }

    pub fn pause(&self) {
        self.set_play_state("paused");
    }

    pub fn resume(&self) {
        self.set_play_state("running");
    }

    fn set_play_state(&self, state: &str) {
        if self.inner.destroyed.get() {
            return;
        }
        if let Some(body) = self.inner.host.body() {
            self.inner
                .host
                .set_style(&body, "--animation-play-state", state);
        }
    }

    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.watcher.destroy();
        self.inner.effects.destroy();
        self.inner.bindings.borrow_mut().release(&*self.inner.host);
        self.inner.tracked.borrow_mut().clear();
    }
}
