//! Per-type effects played on elements once they have been revealed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dreamjob_types::{SpecialEffect, SpecialEffectRule};
use tracing::debug;

use crate::bindings::{Bindings, HasBindings, track_timeout};
use crate::host::{EventKind, Host, ListenTarget, Propagation};

const HIGHLIGHT: &str = "rgba(162, 203, 244, 0.15)";
const HIGHLIGHT_SETTLED: &str = "rgba(162, 203, 244, 0.1)";
const RESULT_SHADOW: &str = "0 10px 30px rgba(162, 203, 244, 0.2)";

/// `(element, property, value)` writes applied together.
type StyleSet<N> = Vec<(N, &'static str, &'static str)>;

struct SpecialInner<H: Host> {
    host: Rc<H>,
    rules: Vec<SpecialEffectRule>,
    /// Elements that already had their effects applied.
    applied: RefCell<Vec<H::Node>>,
    bindings: RefCell<Bindings>,
    destroyed: Cell<bool>,
}

impl<H: Host> HasBindings for SpecialInner<H> {
    fn bindings(&self) -> &RefCell<Bindings> {
        &self.bindings
    }
}

/// Applies the configured [`SpecialEffect`]s. Every listener and timer it
/// creates is released by [`SpecialEffects::destroy`].
pub struct SpecialEffects<H: Host> {
    inner: Rc<SpecialInner<H>>,
}

impl<H: Host> SpecialEffects<H> {
    pub fn new(host: &Rc<H>, rules: &[SpecialEffectRule]) -> Self {
        Self {
            inner: Rc::new(SpecialInner {
                host: host.clone(),
                rules: rules.to_vec(),
                applied: RefCell::new(Vec::new()),
                bindings: RefCell::new(Bindings::new()),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Play every effect whose selector matches `node`. Each element gets
    /// its effects once; returns how many were started.
    pub fn apply(&self, node: &H::Node) -> usize {
        let inner = &self.inner;
        if inner.destroyed.get() || inner.rules.is_empty() {
            return 0;
        }
        {
            let mut applied = inner.applied.borrow_mut();
            if applied.contains(node) {
                return 0;
            }
            applied.push(node.clone());
        }

        let effects: Vec<SpecialEffect> = inner
            .rules
            .iter()
            .filter(|rule| inner.host.closest(node, &rule.selector).as_ref() == Some(node))
            .map(|rule| rule.effect)
            .collect();
        for effect in &effects {
            match effect {
                SpecialEffect::HoverLift => self.hover_lift(node),
                SpecialEffect::TimelineHighlight => self.timeline_highlight(node),
                SpecialEffect::LogoLift => self.logo_lift(node),
                SpecialEffect::Pulse => self.pulse(node),
            }
        }
        if !effects.is_empty() {
            debug!(?node, ?effects, "Special effects started");
        }
        effects.len()
    }

    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        inner.bindings.borrow_mut().release(&*inner.host);
        inner.applied.borrow_mut().clear();
    }

    fn first_within(&self, root: &H::Node, selector: &str) -> Option<H::Node> {
        self.inner.host.query_within(root, selector).into_iter().next()
    }

    fn hover_lift(&self, card: &H::Node) {
        let number = self.first_within(card, ".card-number");

        let mut enter = vec![(card.clone(), "transform", "translateY(-10px)")];
        let mut leave = vec![(card.clone(), "transform", "translateY(0)")];
        if let Some(number) = &number {
            enter.push((number.clone(), "animation", "rotate 0.5s ease"));
            leave.push((number.clone(), "animation", ""));
        }
        self.on(card, EventKind::MouseEnter, enter);
        self.on(card, EventKind::MouseLeave, leave);
        if let Some(number) = number {
            self.clear_animation_on_end(&number);
        }
    }

    fn timeline_highlight(&self, item: &H::Node) {
        if let Some(dot) = self.first_within(item, ".timeline-dot") {
            self.after(
                300,
                vec![
                    (dot.clone(), "transform", "scale(1.2)"),
                    (dot.clone(), "background-color", "var(--primary-blue)"),
                ],
            );
            self.after(500, vec![(dot, "transform", "scale(1)")]);
        }
        if let Some(content) = self.first_within(item, ".timeline-content") {
            self.after(500, vec![(content.clone(), "background", HIGHLIGHT)]);
            self.after(1500, vec![(content, "background", HIGHLIGHT_SETTLED)]);
        }
    }

    fn logo_lift(&self, partner: &H::Node) {
        if let Some(logo) = self.first_within(partner, ".partner-logo") {
            self.after(
                200,
                vec![
                    (logo.clone(), "transform", "translateY(-5px)"),
                    (logo.clone(), "transition", "transform 0.3s ease"),
                ],
            );
            self.after(500, vec![(logo, "transform", "translateY(0)")]);
        }
        self.on(
            partner,
            EventKind::MouseEnter,
            vec![(partner.clone(), "transform", "translateY(-5px) scale(1.02)")],
        );
        self.on(
            partner,
            EventKind::MouseLeave,
            vec![(partner.clone(), "transform", "translateY(0) scale(1)")],
        );
    }

    fn pulse(&self, result: &H::Node) {
        if let Some(icon) = self.first_within(result, ".result-icon, .result-number") {
            self.after(300, vec![(icon.clone(), "animation", "pulse 1s ease")]);
            self.clear_animation_on_end(&icon);
        }
        self.on(
            result,
            EventKind::MouseEnter,
            vec![
                (result.clone(), "transform", "scale(1.05)"),
                (result.clone(), "box-shadow", RESULT_SHADOW),
            ],
        );
        self.on(
            result,
            EventKind::MouseLeave,
            vec![
                (result.clone(), "transform", "scale(1)"),
                (result.clone(), "box-shadow", ""),
            ],
        );
    }

    fn clear_animation_on_end(&self, node: &H::Node) {
        self.on(
            node,
            EventKind::AnimationEnd,
            vec![(node.clone(), "animation", "")],
        );
    }

    /// Apply `styles` whenever `kind` fires on `target`.
    fn on(&self, target: &H::Node, kind: EventKind, styles: StyleSet<H::Node>) {
        let inner = &self.inner;
        let weak = Rc::downgrade(inner);
        inner.bindings.borrow_mut().listen(
            &*inner.host,
            ListenTarget::Element(target.clone()),
            kind,
            Box::new(move |_| {
                if let Some(inner) = weak.upgrade()
                    && !inner.destroyed.get()
                {
                    write_styles(&*inner.host, &styles);
                }
                Propagation::Continue
            }),
        );
    }

    /// Apply `styles` once, `delay_ms` from now.
    fn after(&self, delay_ms: u32, styles: StyleSet<H::Node>) {
        let inner = &self.inner;
        track_timeout(&*inner.host, inner, delay_ms, move |inner| {
            if !inner.destroyed.get() {
                write_styles(&*inner.host, &styles);
            }
        });
    }
}

fn write_styles<H: Host>(host: &H, styles: &StyleSet<H::Node>) {
    for (node, property, value) in styles {
        host.set_style(node, property, value);
    }
}
