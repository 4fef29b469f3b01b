//! Page-wide behaviour: device classes, debounced resize, keyboard focus
//! styling, the skip link and broken image hiding.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::ShellConfig;
use tracing::{debug, warn};

use crate::bindings::{Bindings, Debouncer};
use crate::error::EffectError;
use crate::host::{DomEvent, EventKind, Host, ListenTarget, Propagation};

pub const KEYBOARD_NAVIGATION_CLASS: &str = "keyboard-navigation";
pub const SKIP_LINK_CLASS: &str = "skip-link";

const SKIP_LINK_STYLE: [(&str, &str); 10] = [
    ("position", "absolute"),
    ("top", "-40px"),
    ("left", "6px"),
    ("background", "var(--primary-blue)"),
    ("color", "var(--dark)"),
    ("padding", "8px"),
    ("border-radius", "4px"),
    ("text-decoration", "none"),
    ("z-index", "10000"),
    ("transition", "top 0.3s"),
];

/// Layout bucket for the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    const ALL: [DeviceClass; 3] = [DeviceClass::Mobile, DeviceClass::Tablet, DeviceClass::Desktop];

    pub fn for_width(width: f64, config: &ShellConfig) -> Self {
        if width <= config.mobile_max_width {
            DeviceClass::Mobile
        } else if width <= config.tablet_max_width {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

type ResizeHook = Box<dyn FnMut()>;

struct ShellInner<H: Host> {
    host: Rc<H>,
    config: ShellConfig,
    body: H::Node,
    skip_link: RefCell<Option<H::Node>>,
    resize_hooks: RefCell<Vec<ResizeHook>>,
    debouncer: Debouncer,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> ShellInner<H> {
    fn apply_device_classes(&self) {
        let host = &self.host;
        let touch = host.is_touch_device();
        host.remove_class(&self.body, if touch { "no-touch" } else { "touch-device" });
        host.add_class(&self.body, if touch { "touch-device" } else { "no-touch" });

        let device = DeviceClass::for_width(host.geometry().viewport_width, &self.config);
        for class in DeviceClass::ALL {
            host.remove_class(&self.body, class.class_name());
        }
        host.add_class(&self.body, device.class_name());
    }

    fn handle_resize(&self) {
        if self.destroyed.get() {
            return;
        }
        self.apply_device_classes();

        // Hooks may call back into the shell, so run them without the borrow
        let mut hooks = self.resize_hooks.take();
        for hook in hooks.iter_mut() {
            hook();
        }
        let mut slot = self.resize_hooks.borrow_mut();
        hooks.append(&mut slot);
        *slot = hooks;
    }

    fn on_error(&self, event: &DomEvent<H::Node>) {
        if self.destroyed.get() || !self.config.hide_broken_images {
            return;
        }
        let Some(target) = &event.target else { return };
        if self.host.tag_name(target) == "img" {
            self.host.set_style(target, "display", "none");
            let src = self.host.attribute(target, "src").unwrap_or_default();
            warn!(%src, "Image failed to load");
        }
    }
}

pub struct PageShell<H: Host> {
    inner: Rc<ShellInner<H>>,
}

impl<H: Host> PageShell<H> {
    pub fn mount(host: &Rc<H>, config: &ShellConfig) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled { component: "shell" });
        }
        let body = host.body().ok_or_else(|| EffectError::missing("body"))?;

        let inner = Rc::new(ShellInner {
            host: host.clone(),
            config: config.clone(),
            body,
            skip_link: RefCell::new(None),
            resize_hooks: RefCell::new(Vec::new()),
            debouncer: Debouncer::new(),
            bindings: RefCell::new(Bindings::new()),
            destroyed: Cell::new(false),
        });
        inner.apply_device_classes();

        let shell = Self { inner };
        shell.listen_resize();
        shell.listen_keyboard();
        shell.insert_skip_link();
        if config.hide_broken_images {
            let weak = Rc::downgrade(&shell.inner);
            shell.inner.bindings.borrow_mut().listen(
                &**host,
                ListenTarget::Document,
                EventKind::Error,
                Box::new(move |event: &DomEvent<H::Node>| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_error(event);
                    }
                    Propagation::Continue
                }),
            );
        }

        debug!(touch = host.is_touch_device(), "Page shell mounted");
        Ok(shell)
    }

    fn listen_resize(&self) {
        let inner = &self.inner;
        let weak = Rc::downgrade(inner);
        let delay = inner.config.resize_debounce_ms;
        inner.bindings.borrow_mut().listen(
            &*inner.host,
            ListenTarget::Window,
            EventKind::Resize,
            Box::new(move |_| {
                let Some(inner) = weak.upgrade() else {
                    return Propagation::Continue;
                };
                if inner.destroyed.get() {
                    return Propagation::Continue;
                }
                let later = Rc::downgrade(&inner);
                inner.debouncer.schedule(
                    &*inner.host,
                    delay,
                    Box::new(move || {
                        if let Some(inner) = later.upgrade() {
                            inner.handle_resize();
                        }
                    }),
                );
                Propagation::Continue
            }),
        );
    }

    fn listen_keyboard(&self) {
        let inner = &self.inner;
        let mut bindings = inner.bindings.borrow_mut();

        let weak = Rc::downgrade(inner);
        bindings.listen(
            &*inner.host,
            ListenTarget::Document,
            EventKind::KeyDown,
            Box::new(move |event: &DomEvent<H::Node>| {
                if let Some(inner) = weak.upgrade()
                    && !inner.destroyed.get()
                    && event.key.as_deref() == Some("Tab")
                {
                    inner.host.add_class(&inner.body, KEYBOARD_NAVIGATION_CLASS);
                }
                Propagation::Continue
            }),
        );

        let weak = Rc::downgrade(inner);
        bindings.listen(
            &*inner.host,
            ListenTarget::Document,
            EventKind::MouseDown,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade()
                    && !inner.destroyed.get()
                {
                    inner.host.remove_class(&inner.body, KEYBOARD_NAVIGATION_CLASS);
                }
                Propagation::Continue
            }),
        );
    }

    fn insert_skip_link(&self) {
        let inner = &self.inner;
        if inner.config.skip_link_target.is_empty() {
            return;
        }
        let host = &inner.host;
        let Some(link) = host.create_element("a") else {
            debug!("Could not create skip link");
            return;
        };
        host.set_attribute(&link, "href", &inner.config.skip_link_target);
        host.set_text_content(&link, &inner.config.skip_link_text);
        host.add_class(&link, SKIP_LINK_CLASS);
        for (property, value) in SKIP_LINK_STYLE {
            host.set_style(&link, property, value);
        }

        let mut bindings = inner.bindings.borrow_mut();
        for (kind, top) in [(EventKind::Focus, "6px"), (EventKind::Blur, "-40px")] {
            let weak = Rc::downgrade(inner);
            let node = link.clone();
            bindings.listen(
                &**host,
                ListenTarget::Element(link.clone()),
                kind,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade()
                        && !inner.destroyed.get()
                    {
                        inner.host.set_style(&node, "top", top);
                    }
                    Propagation::Continue
                }),
            );
        }

        host.prepend_to_body(&link);
        *inner.skip_link.borrow_mut() = Some(link);
    }

    /// Register a callback for settled resizes.
    pub fn on_resize(&self, hook: impl FnMut() + 'static) {
        self.inner.resize_hooks.borrow_mut().push(Box::new(hook));
    }

    /// Recompute device classes and notify resize hooks now.
    pub fn handle_resize(&self) {
        self.inner.handle_resize();
    }

    pub fn skip_link(&self) -> Option<H::Node> {
        self.inner.skip_link.borrow().clone()
    }

    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.debouncer.cancel(&*inner.host);
        inner.bindings.borrow_mut().release(&*inner.host);
        inner.resize_hooks.borrow_mut().clear();
        if let Some(link) = inner.skip_link.borrow_mut().take() {
            inner.host.remove(&link);
        }
    }
}
