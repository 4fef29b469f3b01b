//! Scroll progress bar.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::ProgressConfig;
use dreamjob_types::formatting::format_width_pct;
use tracing::debug;

use crate::bindings::Bindings;
use crate::error::EffectError;
use crate::host::{EventKind, Host, ListenTarget, PageGeometry, Propagation};

/// How far the page has been scrolled. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_offset: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn from_geometry(geometry: &PageGeometry) -> Self {
        Self {
            scroll_offset: geometry.scroll_y,
            document_height: geometry.document_height,
            viewport_height: geometry.viewport_height,
        }
    }

    pub fn max_scroll_offset(&self) -> f64 {
        self.document_height - self.viewport_height
    }

    /// Scrolled fraction as a percentage in `[0, 100]`. A page that cannot
    /// scroll reports 0.
    pub fn percentage(&self) -> f64 {
        let max = self.max_scroll_offset();
        if max.is_nan() || max <= 0.0 {
            return 0.0;
        }
        let pct = self.scroll_offset / max * 100.0;
        if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
    }
}

struct ProgressInner<H: Host> {
    host: Rc<H>,
    bar: H::Node,
    /// The bar was created by us and is removed on destroy.
    owned: bool,
    percentage: Cell<f64>,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> ProgressInner<H> {
    fn update(&self) {
        if self.destroyed.get() {
            return;
        }
        let pct = ScrollMetrics::from_geometry(&self.host.geometry()).percentage();
        self.percentage.set(pct);
        self.host.set_style(&self.bar, "width", &format_width_pct(pct));
    }
}

/// Fills a bar's width with the scrolled percentage on every scroll.
pub struct ScrollProgressIndicator<H: Host> {
    inner: Rc<ProgressInner<H>>,
}

impl<H: Host> ScrollProgressIndicator<H> {
    /// Reuse an existing bar with the configured class or create one at the
    /// end of the body, then follow window scrolling.
    pub fn mount(host: &Rc<H>, config: &ProgressConfig) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled { component: "progress" });
        }

        let existing = host.query(&format!(".{}", config.class_name));
        let (bar, owned) = match existing {
            Some(bar) => (bar, false),
            None => {
                let bar = host
                    .create_element("div")
                    .ok_or(EffectError::Unsupported { capability: "createElement" })?;
                host.add_class(&bar, &config.class_name);
                host.append_to_body(&bar);
                (bar, true)
            }
        };

        let inner = Rc::new(ProgressInner {
            host: host.clone(),
            bar,
            owned,
            percentage: Cell::new(0.0),
            bindings: RefCell::new(Bindings::new()),
            destroyed: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        inner.bindings.borrow_mut().listen(
            &**host,
            ListenTarget::Window,
            EventKind::Scroll,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade() {
                    inner.update();
                }
                Propagation::Continue
            }),
        );
        inner.update();
        debug!(owned, "Scroll progress mounted");

        Ok(Self { inner })
    }

    /// Recompute from the current scroll position.
    pub fn update(&self) {
        self.inner.update();
    }

    /// Last percentage written to the bar.
    pub fn percentage(&self) -> f64 {
        self.inner.percentage.get()
    }

    pub fn bar(&self) -> &H::Node {
        &self.inner.bar
    }

    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.bindings.borrow_mut().release(&*inner.host);
        if inner.owned {
            inner.host.remove(&inner.bar);
        }
    }
}
