//! In-memory host for unit tests.
//!
//! Models a small element tree with classes, attributes, inline styles and
//! rectangles, plus listeners, a manual clock for timers and a scripted
//! native visibility observer. Selector support covers what the tests use:
//! tag, `#id`, `.class`, `[attr]` (`[class]` included), `[attr="v"]`, `[attr^="v"]`, comma lists
//! and descendant combinators.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::host::{
    Dom, DomEvent, EventHandler, EventKind, Events, Host, ListenTarget, ListenerId, PageGeometry,
    Propagation, Rect, ScrollBehavior, Scheduler, TimerId, VisibilityBackend, VisibilitySink,
};
use crate::viewport::WatchOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FakeNode(pub usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    style: BTreeMap<String, String>,
    rect: Rect,
    parent: Option<FakeNode>,
    attached: bool,
}

struct FakeListener {
    target: ListenTarget<FakeNode>,
    kind: EventKind,
    handler: Rc<RefCell<EventHandler<FakeNode>>>,
}

enum TimerCallback {
    Once(Box<dyn FnOnce()>),
    Repeat(Rc<RefCell<Box<dyn FnMut()>>>),
}

struct FakeTimer {
    due: f64,
    period: Option<f64>,
    callback: Option<TimerCallback>,
}

struct FakeObserver {
    observed: RefCell<Vec<FakeNode>>,
    sink: VisibilitySink<FakeNode>,
    disconnected: Cell<bool>,
}

struct FakeObserverHandle(Rc<FakeObserver>);

impl VisibilityBackend<FakeNode> for FakeObserverHandle {
    fn observe(&self, node: &FakeNode) {
        let mut observed = self.0.observed.borrow_mut();
        if !observed.contains(node) {
            observed.push(*node);
        }
    }

    fn unobserve(&self, node: &FakeNode) {
        self.0.observed.borrow_mut().retain(|n| n != node);
    }

    fn disconnect(&self) {
        self.0.observed.borrow_mut().clear();
        self.0.disconnected.set(true);
    }
}

pub struct FakeHost {
    nodes: RefCell<Vec<NodeData>>,
    body: FakeNode,
    geometry: Cell<PageGeometry>,
    listeners: RefCell<BTreeMap<u64, FakeListener>>,
    timers: RefCell<BTreeMap<u64, FakeTimer>>,
    next_id: Cell<u64>,
    clock: Cell<f64>,
    scrolls: RefCell<Vec<(f64, ScrollBehavior)>>,
    native_observer: Cell<bool>,
    observers: RefCell<Vec<Rc<FakeObserver>>>,
    touch: Cell<bool>,
}

impl FakeHost {
    /// Host with an empty body, a 1280x800 viewport over a 3000px page and
    /// no native observer.
    pub fn new() -> Rc<Self> {
        let body = NodeData {
            tag: "body".to_string(),
            attached: true,
            ..Default::default()
        };
        Rc::new(Self {
            nodes: RefCell::new(vec![body]),
            body: FakeNode(0),
            geometry: Cell::new(PageGeometry {
                scroll_y: 0.0,
                document_height: 3000.0,
                viewport_height: 800.0,
                viewport_width: 1280.0,
            }),
            listeners: RefCell::new(BTreeMap::new()),
            timers: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            clock: Cell::new(0.0),
            scrolls: RefCell::new(Vec::new()),
            native_observer: Cell::new(false),
            observers: RefCell::new(Vec::new()),
            touch: Cell::new(false),
        })
    }

    /// Host whose browser supports a native intersection observer.
    pub fn with_native_observer() -> Rc<Self> {
        let host = Self::new();
        host.native_observer.set(true);
        host
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    // ── Tree building ───────────────────────────────────────────────────────

    /// Append an element under `parent` (the body when `None`).
    pub fn add(&self, parent: Option<FakeNode>, tag: &str, classes: &[&str]) -> FakeNode {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent: Some(parent.unwrap_or(self.body)),
            attached: true,
            ..Default::default()
        });
        FakeNode(nodes.len() - 1)
    }

    /// Element under the body with the given rectangle.
    pub fn add_at(&self, tag: &str, classes: &[&str], top: f64, height: f64) -> FakeNode {
        let node = self.add(None, tag, classes);
        self.set_rect(node, top, height);
        node
    }

    pub fn set_rect(&self, node: FakeNode, top: f64, height: f64) {
        self.nodes.borrow_mut()[node.0].rect = Rect::new(top, height);
    }

    pub fn set_touch(&self, touch: bool) {
        self.touch.set(touch);
    }

    pub fn body_node(&self) -> FakeNode {
        self.body
    }

    pub fn is_attached(&self, node: FakeNode) -> bool {
        self.nodes.borrow()[node.0].attached
    }

    // ── Events ──────────────────────────────────────────────────────────────

    /// Dispatch an event. With a target, element listeners run first
    /// (ancestors too for bubbling kinds), then document listeners for
    /// bubbling kinds and `error`. Without a target, window and document
    /// listeners run.
    pub fn fire(&self, kind: EventKind, target: Option<FakeNode>, key: Option<&str>) -> Propagation {
        let mut path: Vec<ListenTarget<FakeNode>> = Vec::new();
        match target {
            Some(node) => {
                path.push(ListenTarget::Element(node));
                if kind.bubbles() {
                    let mut current = self.parent_of(node);
                    while let Some(parent) = current {
                        path.push(ListenTarget::Element(parent));
                        current = self.parent_of(parent);
                    }
                }
                if kind.bubbles() || kind == EventKind::Error {
                    path.push(ListenTarget::Document);
                }
            }
            None => {
                path.push(ListenTarget::Window);
                path.push(ListenTarget::Document);
            }
        }

        let event = DomEvent {
            kind,
            target,
            key: key.map(str::to_string),
        };
        let mut outcome = Propagation::Continue;
        for stop in path {
            let handlers: Vec<_> = self
                .listeners
                .borrow()
                .values()
                .filter(|l| l.kind == kind && l.target == stop)
                .map(|l| l.handler.clone())
                .collect();
            for handler in handlers {
                if (handler.borrow_mut())(&event) == Propagation::PreventDefault {
                    outcome = Propagation::PreventDefault;
                }
            }
        }
        outcome
    }

    pub fn click(&self, node: FakeNode) -> Propagation {
        self.fire(EventKind::Click, Some(node), None)
    }

    /// Move the page and dispatch `scroll` on the window.
    pub fn scroll_window(&self, scroll_y: f64) {
        let mut geometry = self.geometry.get();
        geometry.scroll_y = scroll_y;
        self.geometry.set(geometry);
        self.fire(EventKind::Scroll, None, None);
    }

    /// Resize the viewport and dispatch `resize` on the window.
    pub fn resize_window(&self, width: f64, height: f64) {
        let mut geometry = self.geometry.get();
        geometry.viewport_width = width;
        geometry.viewport_height = height;
        self.geometry.set(geometry);
        self.fire(EventKind::Resize, None, None);
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn scroll_requests(&self) -> Vec<(f64, ScrollBehavior)> {
        self.scrolls.borrow().clone()
    }

    // ── Timers ──────────────────────────────────────────────────────────────

    pub fn active_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Run the clock forward, firing due timers in order.
    pub fn advance(&self, ms: u32) {
        let end = self.clock.get() + ms as f64;
        loop {
            let next = self
                .timers
                .borrow()
                .iter()
                .filter(|(_, t)| t.due <= end)
                .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.0.cmp(b.0)))
                .map(|(id, _)| *id);
            let Some(id) = next else { break };

            let callback = {
                let mut timers = self.timers.borrow_mut();
                let Some(timer) = timers.get_mut(&id) else { continue };
                self.clock.set(timer.due);
                if let Some(period) = timer.period {
                    timer.due += period;
                    match &timer.callback {
                        Some(TimerCallback::Repeat(cb)) => Some(TimerCallback::Repeat(cb.clone())),
                        _ => None,
                    }
                } else {
                    timers.remove(&id).and_then(|t| t.callback)
                }
            };

            match callback {
                Some(TimerCallback::Once(cb)) => cb(),
                Some(TimerCallback::Repeat(cb)) => (cb.borrow_mut())(),
                None => {}
            }
        }
        self.clock.set(end);
    }

    // ── Native observer ─────────────────────────────────────────────────────

    /// Report `node` as intersecting to every live observer watching it.
    pub fn intersect(&self, node: FakeNode) {
        let sinks: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .filter(|o| !o.disconnected.get() && o.observed.borrow().contains(&node))
            .map(|o| o.sink.clone())
            .collect();
        for sink in sinks {
            sink(&node);
        }
    }

    /// Nodes currently observed by live native observers.
    pub fn observed_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| !o.disconnected.get())
            .map(|o| o.observed.borrow().len())
            .sum()
    }

    // ── Selectors ───────────────────────────────────────────────────────────

    fn parent_of(&self, node: FakeNode) -> Option<FakeNode> {
        self.nodes.borrow()[node.0].parent
    }

    fn is_descendant(&self, node: FakeNode, root: FakeNode) -> bool {
        let mut current = self.parent_of(node);
        while let Some(parent) = current {
            if parent == root {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }

    fn in_document(&self, node: FakeNode) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.body {
                return true;
            }
            if !self.nodes.borrow()[n.0].attached {
                return false;
            }
            current = self.parent_of(n);
        }
        false
    }

    fn matches(&self, node: FakeNode, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|complex| self.matches_complex(node, complex))
    }

    fn matches_complex(&self, node: FakeNode, complex: &str) -> bool {
        let parts: Vec<&str> = complex.split_whitespace().collect();
        let Some((last, ancestors)) = parts.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }
        let mut current = self.parent_of(node);
        for part in ancestors.iter().rev() {
            loop {
                let Some(candidate) = current else { return false };
                current = self.parent_of(candidate);
                if self.matches_compound(candidate, part) {
                    break;
                }
            }
        }
        true
    }

    fn matches_compound(&self, node: FakeNode, compound: &str) -> bool {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        let mut rest = compound;

        let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" && tag != data.tag {
            return false;
        }
        rest = &rest[tag_end..];

        while !rest.is_empty() {
            if let Some(attr) = rest.strip_prefix('[') {
                let Some(close) = attr.find(']') else { return false };
                if !Self::matches_attribute(data, &attr[..close]) {
                    return false;
                }
                rest = &attr[close + 1..];
            } else {
                let marker = &rest[..1];
                let body = &rest[1..];
                let end = body.find(['.', '#', '[']).unwrap_or(body.len());
                let name = &body[..end];
                let ok = match marker {
                    "." => data.classes.iter().any(|c| c == name),
                    "#" => data.attributes.get("id").map(String::as_str) == Some(name),
                    _ => false,
                };
                if !ok {
                    return false;
                }
                rest = &body[end..];
            }
        }
        true
    }

    fn matches_attribute(data: &NodeData, expr: &str) -> bool {
        let unquote = |v: &str| v.trim_matches('"').trim_matches('\'').to_string();
        if let Some((name, value)) = expr.split_once("^=") {
            data.attributes
                .get(name)
                .is_some_and(|v| v.starts_with(&unquote(value)))
        } else if let Some((name, value)) = expr.split_once('=') {
            data.attributes.get(name) == Some(&unquote(value))
        } else if expr == "class" {
            !data.classes.is_empty()
        } else {
            data.attributes.contains_key(expr)
        }
    }
}

impl Dom for FakeHost {
    type Node = FakeNode;

    fn query_all(&self, selector: &str) -> Vec<FakeNode> {
        let count = self.nodes.borrow().len();
        (1..count)
            .map(FakeNode)
            .filter(|n| self.in_document(*n) && self.matches(*n, selector))
            .collect()
    }

    fn query_within(&self, root: &FakeNode, selector: &str) -> Vec<FakeNode> {
        self.query_all(selector)
            .into_iter()
            .filter(|n| self.is_descendant(*n, *root))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<FakeNode> {
        let count = self.nodes.borrow().len();
        (1..count).map(FakeNode).find(|n| {
            self.in_document(*n)
                && self.nodes.borrow()[n.0].attributes.get("id").map(String::as_str) == Some(id)
        })
    }

    fn closest(&self, node: &FakeNode, selector: &str) -> Option<FakeNode> {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n != self.body && self.matches(n, selector) {
                return Some(n);
            }
            current = self.parent_of(n);
        }
        None
    }

    fn body(&self) -> Option<FakeNode> {
        Some(self.body)
    }

    fn create_element(&self, tag: &str) -> Option<FakeNode> {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_string(),
            ..Default::default()
        });
        Some(FakeNode(nodes.len() - 1))
    }

    fn append_to_body(&self, node: &FakeNode) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[node.0].parent = Some(self.body);
        nodes[node.0].attached = true;
    }

    fn prepend_to_body(&self, node: &FakeNode) {
        self.append_to_body(node);
    }

    fn remove(&self, node: &FakeNode) {
        self.nodes.borrow_mut()[node.0].attached = false;
    }

    fn tag_name(&self, node: &FakeNode) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    fn attribute(&self, node: &FakeNode, name: &str) -> Option<String> {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &FakeNode, name: &str, value: &str) {
        self.nodes.borrow_mut()[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, node: &FakeNode, name: &str) {
        self.nodes.borrow_mut()[node.0].attributes.remove(name);
    }

    fn text_content(&self, node: &FakeNode) -> String {
        self.nodes.borrow()[node.0].text.clone()
    }

    fn set_text_content(&self, node: &FakeNode, text: &str) {
        self.nodes.borrow_mut()[node.0].text = text.to_string();
    }

    fn style(&self, node: &FakeNode, property: &str) -> String {
        self.nodes.borrow()[node.0]
            .style
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&self, node: &FakeNode, property: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let style = &mut nodes[node.0].style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    fn add_class(&self, node: &FakeNode, class: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: &FakeNode, class: &str) {
        self.nodes.borrow_mut()[node.0].classes.retain(|c| c != class);
    }

    fn has_class(&self, node: &FakeNode, class: &str) -> bool {
        self.nodes.borrow()[node.0].classes.iter().any(|c| c == class)
    }

    fn bounding_rect(&self, node: &FakeNode) -> Rect {
        self.nodes.borrow()[node.0].rect
    }

    fn geometry(&self) -> PageGeometry {
        self.geometry.get()
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        self.scrolls.borrow_mut().push((top, behavior));
    }

    fn is_touch_device(&self) -> bool {
        self.touch.get()
    }
}

impl Events for FakeHost {
    fn listen(
        &self,
        target: ListenTarget<FakeNode>,
        kind: EventKind,
        handler: EventHandler<FakeNode>,
    ) -> Option<ListenerId> {
        let id = self.next_id();
        self.listeners.borrow_mut().insert(
            id,
            FakeListener {
                target,
                kind,
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        Some(ListenerId(id))
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id.0);
    }
}

impl Scheduler for FakeHost {
    fn now(&self) -> f64 {
        self.clock.get()
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        self.timers.borrow_mut().insert(
            id,
            FakeTimer {
                due: self.clock.get() + delay_ms as f64,
                period: None,
                callback: Some(TimerCallback::Once(callback)),
            },
        );
        TimerId(id)
    }

    fn set_interval(&self, period_ms: u32, callback: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let period = period_ms.max(1) as f64;
        self.timers.borrow_mut().insert(
            id,
            FakeTimer {
                due: self.clock.get() + period,
                period: Some(period),
                callback: Some(TimerCallback::Repeat(Rc::new(RefCell::new(callback)))),
            },
        );
        TimerId(id)
    }

    fn clear_timer(&self, id: TimerId) {
        self.timers.borrow_mut().remove(&id.0);
    }
}

impl Host for FakeHost {
    fn intersection_observer(
        &self,
        _options: &WatchOptions,
        sink: VisibilitySink<FakeNode>,
    ) -> Option<Box<dyn VisibilityBackend<FakeNode>>> {
        if !self.native_observer.get() {
            return None;
        }
        let observer = Rc::new(FakeObserver {
            observed: RefCell::new(Vec::new()),
            sink,
            disconnected: Cell::new(false),
        });
        self.observers.borrow_mut().push(observer.clone());
        Some(Box::new(FakeObserverHandle(observer)))
    }
}

/// Install a test subscriber so `tracing` output shows up on failures.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
