//! Host abstraction
//!
//! Everything the effects need from the browser goes through these traits:
//! DOM queries and mutation ([`Dom`]), event subscription ([`Events`]),
//! timers ([`Scheduler`]) and the visibility capability ([`Host`]).
//!
//! The web crate implements them over `web-sys`; unit tests use an in-memory
//! fake. All methods take `&self` and are expected to use interior
//! mutability, matching the single-threaded browser event loop.

use std::fmt;
use std::rc::Rc;

use crate::viewport::WatchOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Handles and geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Handle for a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Handle for a pending timeout or interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Vertical extent of an element relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Current scroll position and page/viewport sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageGeometry {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
    pub viewport_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    Click,
    KeyDown,
    MouseDown,
    MouseEnter,
    MouseLeave,
    Focus,
    Blur,
    AnimationEnd,
    /// Resource load failure; listened for in the capture phase.
    Error,
}

impl EventKind {
    /// DOM event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Scroll => "scroll",
            EventKind::Resize => "resize",
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::AnimationEnd => "animationend",
            EventKind::Error => "error",
        }
    }

    /// Whether the event reaches ancestors and the document.
    pub fn bubbles(&self) -> bool {
        matches!(
            self,
            EventKind::Click | EventKind::KeyDown | EventKind::MouseDown | EventKind::AnimationEnd
        )
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    Window,
    Document,
    Element(N),
}

/// The parts of a DOM event the effects care about.
#[derive(Debug, Clone)]
pub struct DomEvent<N> {
    pub kind: EventKind,
    /// Element the event was dispatched to, if it was an element.
    pub target: Option<N>,
    /// `KeyboardEvent.key` for key events.
    pub key: Option<String>,
}

/// Returned by handlers to request `preventDefault()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    PreventDefault,
}

pub type EventHandler<N> = Box<dyn FnMut(&DomEvent<N>) -> Propagation>;

// ─────────────────────────────────────────────────────────────────────────────
// Visibility capability
// ─────────────────────────────────────────────────────────────────────────────

/// Receives elements that became visible.
pub type VisibilitySink<N> = Rc<dyn Fn(&N)>;

/// A running visibility detector (native observer or polling fallback).
pub trait VisibilityBackend<N> {
    fn observe(&self, node: &N);
    fn unobserve(&self, node: &N);
    /// Stop observing everything and release listeners/timers.
    fn disconnect(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// Host traits
// ─────────────────────────────────────────────────────────────────────────────

pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// All elements matching `selector` in document order. Invalid selectors
    /// match nothing.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    fn query(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    /// Descendants of `root` matching `selector`.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn append_to_body(&self, node: &Self::Node);
    fn prepend_to_body(&self, node: &Self::Node);
    fn remove(&self, node: &Self::Node);

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&self, node: &Self::Node, text: &str);

    /// Inline style property; empty when unset.
    fn style(&self, node: &Self::Node, property: &str) -> String;
    /// Set an inline style property. An empty value clears it.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Bounding box relative to the viewport.
    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn geometry(&self) -> PageGeometry;
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    fn is_touch_device(&self) -> bool;
}

pub trait Events: Dom {
    /// Attach a listener. `None` when the target cannot take listeners.
    fn listen(
        &self,
        target: ListenTarget<Self::Node>,
        kind: EventKind,
        handler: EventHandler<Self::Node>,
    ) -> Option<ListenerId>;

    /// Detach a listener. Unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);
}

pub trait Scheduler {
    /// Monotonic milliseconds.
    fn now(&self) -> f64;
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId;
    fn set_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TimerId;
    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn clear_timer(&self, id: TimerId);
}

/// The full browser surface used by the effects.
pub trait Host: Events + Scheduler + 'static {
    /// Native intersection observer, or `None` when the browser lacks one.
    fn intersection_observer(
        &self,
        options: &WatchOptions,
        sink: VisibilitySink<Self::Node>,
    ) -> Option<Box<dyn VisibilityBackend<Self::Node>>>;
}
