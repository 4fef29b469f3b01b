//! In-page anchor navigation with a fixed-header offset, plus tracking of
//! the section currently in the middle of the viewport.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::{ActiveSectionConfig, NavigationConfig};
use tracing::debug;

use crate::bindings::Bindings;
use crate::error::EffectError;
use crate::host::{DomEvent, EventKind, Host, ListenTarget, Propagation, ScrollBehavior};
use crate::viewport::ratio_within;

struct NavigatorInner<H: Host> {
    host: Rc<H>,
    anchor_selector: String,
    header_offset_px: f64,
    /// `None` when active-section tracking is off.
    active_config: Option<ActiveSectionConfig>,
    active: RefCell<Option<H::Node>>,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

/// Turns clicks on `#fragment` links into smooth scrolls that stop short of
/// the sticky header.
pub struct SmoothNavigator<H: Host> {
    inner: Rc<NavigatorInner<H>>,
}

impl<H: Host> Clone for SmoothNavigator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> SmoothNavigator<H> {
    pub fn new(host: &Rc<H>, config: &NavigationConfig) -> Self {
        Self {
            inner: Rc::new(NavigatorInner {
                host: host.clone(),
                anchor_selector: config.anchor_selector.clone(),
                header_offset_px: config.header_offset_px,
                active_config: config
                    .active_section
                    .enabled
                    .then(|| config.active_section.clone()),
                active: RefCell::new(None),
                bindings: RefCell::new(Bindings::new()),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Listen for anchor clicks on the document, wire the call-to-action
    /// buttons to their sections and start following the active section.
    pub fn mount(host: &Rc<H>, config: &NavigationConfig) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled {
                component: "navigation",
            });
        }

        let navigator = Self::new(host, config);
        let weak = Rc::downgrade(&navigator.inner);
        let attached = navigator.inner.bindings.borrow_mut().listen(
            &**host,
            ListenTarget::Document,
            EventKind::Click,
            Box::new(move |event: &DomEvent<H::Node>| match weak.upgrade() {
                Some(inner) => SmoothNavigator { inner }.on_anchor_click(event),
                None => Propagation::Continue,
            }),
        );
        if !attached {
            return Err(EffectError::Unsupported {
                capability: "addEventListener",
            });
        }

        let mut buttons = 0;
        for binding in &config.call_to_action {
            let matched: Vec<H::Node> = host
                .query_all(&binding.button)
                .into_iter()
                .skip(binding.skip)
                .take(binding.limit.unwrap_or(usize::MAX))
                .collect();
            if matched.is_empty() {
                debug!(button = %binding.button, "Call-to-action button not found");
            }
            for button in matched {
                let weak = Rc::downgrade(&navigator.inner);
                let section = binding.section.clone();
                let bound = navigator.inner.bindings.borrow_mut().listen(
                    &**host,
                    ListenTarget::Element(button),
                    EventKind::Click,
                    Box::new(move |_| {
                        if let Some(inner) = weak.upgrade() {
                            SmoothNavigator { inner }.scroll_to_section(&section);
                        }
                        Propagation::Continue
                    }),
                );
                if bound {
                    buttons += 1;
                }
            }
        }

        if navigator.inner.active_config.is_some() {
            let weak = Rc::downgrade(&navigator.inner);
            navigator.inner.bindings.borrow_mut().listen(
                &**host,
                ListenTarget::Window,
                EventKind::Scroll,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        SmoothNavigator { inner }.update_active_section();
                    }
                    Propagation::Continue
                }),
            );
            navigator.update_active_section();
        }

        debug!(buttons, "Smooth navigation mounted");
        Ok(navigator)
    }

    /// Handle a click anywhere in the document. Clicks inside a fragment
    /// link always have their default prevented; the page scrolls only when
    /// the fragment names an existing element.
    pub fn on_anchor_click(&self, event: &DomEvent<H::Node>) -> Propagation {
        let inner = &self.inner;
        if inner.destroyed.get() {
            return Propagation::Continue;
        }
        let Some(target) = &event.target else {
            return Propagation::Continue;
        };
        let Some(anchor) = inner.host.closest(target, &inner.anchor_selector) else {
            return Propagation::Continue;
        };

        let href = inner.host.attribute(&anchor, "href").unwrap_or_default();
        let id = href.strip_prefix('#').unwrap_or(&href);
        let section = if id.is_empty() {
            None
        } else {
            inner.host.element_by_id(id)
        };
        match section {
            Some(section) => self.smooth_scroll_to(&section),
            None => debug!(%href, "Anchor target not found"),
        }
        Propagation::PreventDefault
    }

    /// Scroll to the first element matching `selector`. Returns false when
    /// nothing matches.
    pub fn scroll_to_section(&self, selector: &str) -> bool {
        if self.inner.destroyed.get() {
            return false;
        }
        match self.inner.host.query(selector) {
            Some(section) => {
                self.smooth_scroll_to(&section);
                true
            }
            None => {
                debug!(selector, "Section not found");
                false
            }
        }
    }

    /// Document offset that puts `node` just below the header.
    pub fn scroll_target(&self, node: &H::Node) -> f64 {
        let host = &self.inner.host;
        let top = host.bounding_rect(node).top + host.geometry().scroll_y;
        top - self.inner.header_offset_px
    }

    pub fn smooth_scroll_to(&self, node: &H::Node) {
        let top = self.scroll_target(node);
        self.inner.host.scroll_to(top, ScrollBehavior::Smooth);
    }

    /// Make the first section that fills enough of the viewport band the
    /// active one. With nothing qualifying the previous section stays active.
    pub fn update_active_section(&self) {
        let inner = &self.inner;
        let Some(config) = &inner.active_config else {
            return;
        };
        if inner.destroyed.get() {
            return;
        }
        let host = &inner.host;
        let band_bottom = host.geometry().viewport_height - config.margin_px;
        let Some(current) = host.query_all(&config.selector).into_iter().find(|section| {
            let ratio = ratio_within(host.bounding_rect(section), config.margin_px, band_bottom);
            ratio > 0.0 && ratio >= config.threshold
        }) else {
            return;
        };

        let previous = inner.active.replace(Some(current.clone()));
        if previous.as_ref() == Some(&current) {
            return;
        }
        if !config.class_name.is_empty() {
            if let Some(previous) = &previous {
                host.remove_class(previous, &config.class_name);
            }
            host.add_class(&current, &config.class_name);
        }
        let class = host.attribute(&current, "class").unwrap_or_default();
        let name = class.split_whitespace().next().unwrap_or_default();
        debug!(section = name, "Active section changed");
    }

    pub fn active_section(&self) -> Option<H::Node> {
        self.inner.active.borrow().clone()
    }

    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.bindings.borrow_mut().release(&*inner.host);
        let active = inner.active.borrow_mut().take();
        if let (Some(active), Some(config)) = (active, &inner.active_config)
            && !config.class_name.is_empty()
        {
            inner.host.remove_class(&active, &config.class_name);
        }
    }
}
