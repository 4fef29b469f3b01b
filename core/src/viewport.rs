//! Viewport watcher
//!
//! Reports once when a watched element scrolls into view, then forgets it.
//! The detection backend is picked when the watcher is built:
//!
//! 1. the host's native intersection observer, when the browser has one;
//! 2. otherwise a polling backend that checks element rectangles on
//!    `scroll`/`resize` (fallback `polling`);
//! 3. otherwise nothing: [`ViewportWatcher::watch`] returns
//!    [`Watch::Unsupported`] and the caller shows the element right away
//!    (fallback `immediate`).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::{ViewportConfig, VisibilityFallback};
use tracing::debug;

use crate::bindings::{Bindings, HasBindings, track_timeout};
use crate::host::{
    EventKind, Host, ListenTarget, Propagation, Rect, VisibilityBackend, VisibilitySink,
};

/// Intersection settings passed to visibility backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub threshold: f64,
    pub bottom_margin_px: f64,
    pub fallback: VisibilityFallback,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from(&ViewportConfig::default())
    }
}

impl From<&ViewportConfig> for WatchOptions {
    fn from(config: &ViewportConfig) -> Self {
        Self {
            threshold: config.threshold.clamp(0.0, 1.0),
            bottom_margin_px: config.bottom_margin_px,
            fallback: config.fallback,
        }
    }
}

impl WatchOptions {
    /// CSS root margin equivalent of the bottom bias.
    pub fn root_margin(&self) -> String {
        format!("0px 0px {}px 0px", -self.bottom_margin_px)
    }
}

/// Fraction of `rect` between viewport offsets `band_top` and `band_bottom`.
pub fn ratio_within(rect: Rect, band_top: f64, band_bottom: f64) -> f64 {
    let height = rect.height();
    if height <= 0.0 {
        // Zero-height elements count as fully visible while inside the band
        return if rect.top >= band_top && rect.top < band_bottom { 1.0 } else { 0.0 };
    }
    let overlap = rect.bottom.min(band_bottom) - rect.top.max(band_top);
    (overlap / height).clamp(0.0, 1.0)
}

/// Fraction of `rect` inside a viewport of `viewport_height` whose bottom
/// edge has been pulled up by `bottom_margin_px`.
pub fn intersection_ratio(rect: Rect, viewport_height: f64, bottom_margin_px: f64) -> f64 {
    ratio_within(rect, 0.0, viewport_height - bottom_margin_px)
}

/// Whether an element with `rect` counts as seen under `options`.
pub fn is_in_view(rect: Rect, viewport_height: f64, options: &WatchOptions) -> bool {
    let ratio = intersection_ratio(rect, viewport_height, options.bottom_margin_px);
    ratio > 0.0 && ratio >= options.threshold
}

/// Which detection backend a watcher ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    Polling,
    /// No detection; callers treat elements as visible immediately.
    Immediate,
}

/// Result of [`ViewportWatcher::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    /// The callback fires once when the element becomes visible.
    Pending,
    /// No detection available; treat the element as visible now.
    Unsupported,
    /// The watcher was destroyed; nothing will happen.
    Closed,
}

type OnVisible<N> = Box<dyn FnOnce(&N)>;

struct Shared<N: 'static> {
    pending: RefCell<Vec<(N, OnVisible<N>)>>,
    backend: RefCell<Option<Box<dyn VisibilityBackend<N>>>>,
    closed: Cell<bool>,
}

impl<N: Clone + PartialEq + 'static> Shared<N> {
    fn deliver(&self, node: &N) {
        let entry = {
            let mut pending = self.pending.borrow_mut();
            match pending.iter().position(|(n, _)| n == node) {
                Some(pos) => pending.remove(pos),
                None => return,
            }
        };
        if let Some(backend) = self.backend.borrow().as_ref() {
            backend.unobserve(node);
        }
        let (node, on_visible) = entry;
        on_visible(&node);
    }
}

/// Fires a one-shot callback per element when it enters the viewport.
pub struct ViewportWatcher<H: Host> {
    shared: Rc<Shared<H::Node>>,
    kind: BackendKind,
}

impl<H: Host> ViewportWatcher<H> {
    pub fn new(host: &Rc<H>, options: WatchOptions) -> Self {
        let shared: Rc<Shared<H::Node>> = Rc::new(Shared {
            pending: RefCell::new(Vec::new()),
            backend: RefCell::new(None),
            closed: Cell::new(false),
        });

        let weak = Rc::downgrade(&shared);
        let sink: VisibilitySink<H::Node> = Rc::new(move |node: &H::Node| {
            if let Some(shared) = weak.upgrade() {
                shared.deliver(node);
            }
        });

        let (backend, kind) = match host.intersection_observer(&options, sink.clone()) {
            Some(native) => (Some(native), BackendKind::Native),
            None => match options.fallback {
                VisibilityFallback::Polling => {
                    let polling: Box<dyn VisibilityBackend<H::Node>> =
                        Box::new(PollingBackend::new(host.clone(), options, sink));
                    (Some(polling), BackendKind::Polling)
                }
                VisibilityFallback::Immediate => (None, BackendKind::Immediate),
            },
        };
        *shared.backend.borrow_mut() = backend;
        debug!(?kind, threshold = options.threshold, "Viewport watcher ready");

        Self { shared, kind }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// Start watching `node`. `on_visible` runs at most once. Watching a node
    /// that is already pending keeps the first callback.
    pub fn watch(&self, node: &H::Node, on_visible: impl FnOnce(&H::Node) + 'static) -> Watch {
        if self.shared.closed.get() {
            return Watch::Closed;
        }
        let backend = self.shared.backend.borrow();
        let Some(backend) = backend.as_ref() else {
            return Watch::Unsupported;
        };
        {
            let mut pending = self.shared.pending.borrow_mut();
            if pending.iter().any(|(n, _)| n == node) {
                return Watch::Pending;
            }
            pending.push((node.clone(), Box::new(on_visible)));
        }
        backend.observe(node);
        Watch::Pending
    }

    /// Stop watching `node` without firing. Unknown nodes are ignored.
    pub fn unwatch(&self, node: &H::Node) {
        self.shared.pending.borrow_mut().retain(|(n, _)| n != node);
        if let Some(backend) = self.shared.backend.borrow().as_ref() {
            backend.unobserve(node);
        }
    }

    pub fn is_watching(&self, node: &H::Node) -> bool {
        self.shared.pending.borrow().iter().any(|(n, _)| n == node)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    /// Disconnect the backend and drop every pending callback.
    pub fn destroy(&self) {
        self.shared.closed.set(true);
        let pending = std::mem::take(&mut *self.shared.pending.borrow_mut());
        drop(pending);
        let backend = self.shared.backend.borrow_mut().take();
        if let Some(backend) = backend {
            backend.disconnect();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Polling fallback
// ─────────────────────────────────────────────────────────────────────────────

struct PollState<H: Host> {
    host: Rc<H>,
    options: WatchOptions,
    sink: VisibilitySink<H::Node>,
    nodes: RefCell<Vec<H::Node>>,
    bindings: RefCell<Bindings>,
    check_scheduled: Cell<bool>,
}

impl<H: Host> HasBindings for PollState<H> {
    fn bindings(&self) -> &RefCell<Bindings> {
        &self.bindings
    }
}

impl<H: Host> PollState<H> {
    fn check(&self) {
        let viewport_height = self.host.geometry().viewport_height;
        let visible: Vec<H::Node> = self
            .nodes
            .borrow()
            .iter()
            .filter(|n| is_in_view(self.host.bounding_rect(n), viewport_height, &self.options))
            .cloned()
            .collect();
        for node in visible {
            (self.sink)(&node);
        }
    }
}

/// Rectangle checks on scroll/resize for browsers without a native observer.
struct PollingBackend<H: Host> {
    state: Rc<PollState<H>>,
}

impl<H: Host> PollingBackend<H> {
    fn new(host: Rc<H>, options: WatchOptions, sink: VisibilitySink<H::Node>) -> Self {
        let state = Rc::new(PollState {
            host,
            options,
            sink,
            nodes: RefCell::new(Vec::new()),
            bindings: RefCell::new(Bindings::new()),
            check_scheduled: Cell::new(false),
        });

        for kind in [EventKind::Scroll, EventKind::Resize] {
            let weak = Rc::downgrade(&state);
            state.bindings.borrow_mut().listen(
                &*state.host,
                ListenTarget::Window,
                kind,
                Box::new(move |_| {
                    if let Some(state) = weak.upgrade() {
                        state.check();
                    }
                    Propagation::Continue
                }),
            );
        }

        Self { state }
    }

    /// Elements already on screen are reported on the next turn of the
    /// event loop rather than from inside `observe`.
    fn schedule_check(&self) {
        if self.state.check_scheduled.replace(true) {
            return;
        }
        track_timeout(&*self.state.host, &self.state, 0, |state| {
            state.check_scheduled.set(false);
            state.check();
        });
    }
}

impl<H: Host> VisibilityBackend<H::Node> for PollingBackend<H> {
    fn observe(&self, node: &H::Node) {
        {
            let mut nodes = self.state.nodes.borrow_mut();
            if nodes.contains(node) {
                return;
            }
            nodes.push(node.clone());
        }
        self.schedule_check();
    }

    fn unobserve(&self, node: &H::Node) {
        self.state.nodes.borrow_mut().retain(|n| n != node);
    }

    fn disconnect(&self) {
        self.state.nodes.borrow_mut().clear();
        self.state.bindings.borrow_mut().release(&*self.state.host);
    }
}
