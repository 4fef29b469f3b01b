//! `IntersectionObserver` as a visibility backend.

use dreamjob_core::{VisibilityBackend, VisibilitySink, WatchOptions};
use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::utils::defer_drop;

type EntriesCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

pub struct NativeObserver {
    observer: IntersectionObserver,
    callback: Option<EntriesCallback>,
}

impl NativeObserver {
    /// Create an observer reporting intersecting elements to `sink`.
    pub fn new(options: &WatchOptions, sink: VisibilitySink<Element>) -> Result<Self, JsValue> {
        let callback: EntriesCallback = Closure::new(move |entries: Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if entry.is_intersecting() {
                    sink(&entry.target());
                }
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin());
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;

        Ok(Self {
            observer,
            callback: Some(callback),
        })
    }
}

impl VisibilityBackend<Element> for NativeObserver {
    fn observe(&self, node: &Element) {
        self.observer.observe(node);
    }

    fn unobserve(&self, node: &Element) {
        self.observer.unobserve(node);
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for NativeObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
        if let Some(callback) = self.callback.take() {
            defer_drop(callback);
        }
    }
}
