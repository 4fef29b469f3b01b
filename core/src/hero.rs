//! Hero section: staggered intro, button lift and background parallax.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::HeroConfig;
use dreamjob_types::formatting::{format_css_secs, format_translate_y};
use tracing::debug;

use crate::bindings::{Bindings, HasBindings, track_timeout};
use crate::error::EffectError;
use crate::host::{EventKind, Host, ListenTarget, Propagation};

const HOVER_TRANSFORM: &str = "translateY(-3px) scale(1.05)";

/// Background shift for a scroll position. Parallax only runs while the
/// hero is still within the first screen.
pub fn parallax_offset(scroll_y: f64, viewport_height: f64, rate: f64) -> Option<f64> {
    (scroll_y < viewport_height).then(|| scroll_y * rate)
}

struct HeroInner<H: Host> {
    host: Rc<H>,
    background: Option<H::Node>,
    parallax_rate: f64,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> HasBindings for HeroInner<H> {
    fn bindings(&self) -> &RefCell<Bindings> {
        &self.bindings
    }
}

impl<H: Host> HeroInner<H> {
    fn on_scroll(&self) {
        if self.destroyed.get() {
            return;
        }
        let Some(background) = &self.background else {
            return;
        };
        let geometry = self.host.geometry();
        if let Some(offset) =
            parallax_offset(geometry.scroll_y, geometry.viewport_height, self.parallax_rate)
        {
            self.host
                .set_style(background, "transform", &format_translate_y(offset));
        }
    }
}

pub struct HeroEffects<H: Host> {
    inner: Rc<HeroInner<H>>,
}

impl<H: Host> HeroEffects<H> {
    pub fn mount(host: &Rc<H>, config: &HeroConfig) -> Result<Self, EffectError> {
        if !config.enabled {
            return Err(EffectError::Disabled { component: "hero" });
        }
        let root = host
            .query(&config.root)
            .ok_or_else(|| EffectError::missing(&config.root))?;

        let inner = Rc::new(HeroInner {
            host: host.clone(),
            background: host
                .query_within(&root, &config.background_selector)
                .into_iter()
                .next(),
            parallax_rate: config.parallax_rate,
            bindings: RefCell::new(Bindings::new()),
            destroyed: Cell::new(false),
        });

        let intro = Self::start_intro(&inner, &root, config);
        let buttons = Self::bind_buttons(&inner, &root, &config.button_selector);

        if inner.background.is_some() {
            let weak = Rc::downgrade(&inner);
            inner.bindings.borrow_mut().listen(
                &**host,
                ListenTarget::Window,
                EventKind::Scroll,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_scroll();
                    }
                    Propagation::Continue
                }),
            );
        }

        debug!(
            intro,
            buttons,
            parallax = inner.background.is_some(),
            "Hero effects mounted"
        );
        Ok(Self { inner })
    }

    /// Hide every intro part now and schedule its reveal. Returns how many
    /// parts were found.
    fn start_intro(inner: &Rc<HeroInner<H>>, root: &H::Node, config: &HeroConfig) -> usize {
        let host = &inner.host;
        let secs = format_css_secs(config.intro_duration_ms);
        let transition = format!("opacity {secs} ease, transform {secs} ease");
        let offset = format_translate_y(config.intro_offset_px);

        let mut found = 0;
        for step in &config.intro {
            let Some(node) = host.query_within(root, &step.selector).into_iter().next() else {
                continue;
            };
            found += 1;
            host.set_style(&node, "opacity", "0");
            host.set_style(&node, "transform", &offset);

            let transition = transition.clone();
            track_timeout(&**host, inner, step.delay_ms, move |inner| {
                if inner.destroyed.get() {
                    return;
                }
                inner.host.set_style(&node, "transition", &transition);
                inner.host.set_style(&node, "opacity", "1");
                inner
                    .host
                    .set_style(&node, "transform", &format_translate_y(0.0));
            });
        }
        found
    }

    fn bind_buttons(inner: &Rc<HeroInner<H>>, root: &H::Node, selector: &str) -> usize {
        let buttons = inner.host.query_within(root, selector);
        let mut bindings = inner.bindings.borrow_mut();
        for button in &buttons {
            for (kind, transform) in [
                (EventKind::MouseEnter, HOVER_TRANSFORM),
                (EventKind::MouseLeave, ""),
            ] {
                let weak = Rc::downgrade(inner);
                let node = button.clone();
                bindings.listen(
                    &*inner.host,
                    ListenTarget::Element(button.clone()),
                    kind,
                    Box::new(move |_| {
                        if let Some(inner) = weak.upgrade()
                            && !inner.destroyed.get()
                        {
                            inner.host.set_style(&node, "transform", transform);
                        }
                        Propagation::Continue
                    }),
                );
            }
        }
        buttons.len()
    }

    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.bindings.borrow_mut().release(&*self.inner.host);
    }
}
