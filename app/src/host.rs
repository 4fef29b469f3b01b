//! Browser implementation of the effect host traits over `web-sys`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use dreamjob_core::{
    Dom, DomEvent, EventHandler, EventKind, Events, Host, ListenTarget, ListenerId, PageGeometry,
    Propagation, Rect, ScrollBehavior, Scheduler, TimerId, VisibilityBackend, VisibilitySink,
    WatchOptions,
};
use gloo_timers::callback::{Interval, Timeout};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, EventTarget, HtmlElement, KeyboardEvent, NodeList, ScrollToOptions, Window,
};

use crate::observer::NativeObserver;
use crate::utils::{defer_drop, js_has};

struct ListenerSlot {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

enum TimerSlot {
    Timeout(Timeout),
    Interval(Interval),
}

impl TimerSlot {
    fn cancel(self) {
        match self {
            TimerSlot::Timeout(timeout) => defer_drop(timeout.cancel()),
            TimerSlot::Interval(interval) => defer_drop(interval.cancel()),
        }
    }
}

type Timers = Rc<RefCell<HashMap<u64, TimerSlot>>>;

pub struct WebHost {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<u64, ListenerSlot>>,
    timers: Timers,
    next_id: Cell<u64>,
}

impl WebHost {
    /// `None` outside a browser window.
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            timers: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn event_target(&self, target: ListenTarget<Element>) -> EventTarget {
        match target {
            ListenTarget::Window => self.window.clone().into(),
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Element(element) => element.into(),
        }
    }
}

fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Dom for WebHost {
    type Node = Element;

    fn query_all(&self, selector: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(selector))
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        elements(root.query_selector_all(selector))
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_to_body(&self, node: &Element) {
        if let Some(body) = self.document.body() {
            let _ = body.append_child(node);
        }
    }

    fn prepend_to_body(&self, node: &Element) {
        if let Some(body) = self.document.body() {
            let _ = body.insert_before(node, body.first_child().as_ref());
        }
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn style(&self, node: &Element, property: &str) -> String {
        node.dyn_ref::<HtmlElement>()
            .and_then(|el| el.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        let Some(el) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = el.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.top(), rect.height())
    }

    fn geometry(&self) -> PageGeometry {
        let root = self.document.document_element();
        let (document_height, viewport_height) = root
            .as_ref()
            .map(|el| (el.scroll_height() as f64, el.client_height() as f64))
            .unwrap_or_default();
        PageGeometry {
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            document_height,
            viewport_height,
            viewport_width: self
                .window
                .inner_width()
                .ok()
                .and_then(|w| w.as_f64())
                .unwrap_or(0.0),
        }
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn is_touch_device(&self) -> bool {
        js_has(&self.window, "ontouchstart") || self.window.navigator().max_touch_points() > 0
    }
}

impl Events for WebHost {
    fn listen(
        &self,
        target: ListenTarget<Element>,
        kind: EventKind,
        mut handler: EventHandler<Element>,
    ) -> Option<ListenerId> {
        let target = self.event_target(target);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let dom_event = DomEvent {
                kind,
                target: event.target().and_then(|t| t.dyn_into::<Element>().ok()),
                key: event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key),
            };
            if handler(&dom_event) == Propagation::PreventDefault {
                event.prevent_default();
            }
        });

        // Load errors do not bubble; catch them on the way down
        let capture = kind == EventKind::Error;
        if let Err(err) = target.add_event_listener_with_callback_and_bool(
            kind.as_str(),
            closure.as_ref().unchecked_ref(),
            capture,
        ) {
            warn!(event = kind.as_str(), ?err, "addEventListener failed");
            return None;
        }

        let id = self.next_id();
        self.listeners.borrow_mut().insert(
            id,
            ListenerSlot {
                target,
                kind,
                closure,
            },
        );
        Some(ListenerId(id))
    }

    fn unlisten(&self, id: ListenerId) {
        let Some(slot) = self.listeners.borrow_mut().remove(&id.0) else {
            return;
        };
        let _ = slot.target.remove_event_listener_with_callback_and_bool(
            slot.kind.as_str(),
            slot.closure.as_ref().unchecked_ref(),
            slot.kind == EventKind::Error,
        );
        defer_drop(slot.closure);
    }
}

impl Scheduler for WebHost {
    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        let timers = Rc::downgrade(&self.timers);
        let timeout = Timeout::new(delay_ms, move || {
            // Fired timeouts leave the table; the handle is freed after this turn
            if let Some(timers) = timers.upgrade() {
                let slot = timers.borrow_mut().remove(&id);
                defer_drop(slot);
            }
            callback();
        });
        self.timers
            .borrow_mut()
            .insert(id, TimerSlot::Timeout(timeout));
        TimerId(id)
    }

    fn set_interval(&self, period_ms: u32, mut callback: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let interval = Interval::new(period_ms, move || callback());
        self.timers
            .borrow_mut()
            .insert(id, TimerSlot::Interval(interval));
        TimerId(id)
    }

    fn clear_timer(&self, id: TimerId) {
        let slot = self.timers.borrow_mut().remove(&id.0);
        if let Some(slot) = slot {
            slot.cancel();
        }
    }
}

impl Host for WebHost {
    fn intersection_observer(
        &self,
        options: &WatchOptions,
        sink: VisibilitySink<Element>,
    ) -> Option<Box<dyn VisibilityBackend<Element>>> {
        if !js_has(&self.window, "IntersectionObserver") {
            debug!("IntersectionObserver unavailable");
            return None;
        }
        match NativeObserver::new(options, sink) {
            Ok(observer) => Some(Box::new(observer)),
            Err(err) => {
                warn!(?err, "IntersectionObserver construction failed");
                None
            }
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        let ids: Vec<u64> = self.listeners.borrow().keys().copied().collect();
        for id in ids {
            self.unlisten(ListenerId(id));
        }
        let timers: Vec<TimerSlot> = self.timers.borrow_mut().drain().map(|(_, t)| t).collect();
        for slot in timers {
            slot.cancel();
        }
    }
}
