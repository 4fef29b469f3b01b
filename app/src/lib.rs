//! Landing page effects for the browser.
//!
//! ```js
//! import init, { startLandingPage } from "./dreamjob_web.js";
//! await init();
//! const page = await startLandingPage();
//! page.scrollToSection(".target-audience");
//! ```

mod config;
mod host;
mod observer;
mod utils;

use std::rc::Rc;
use std::sync::Once;

use dioxus_logger::tracing::Level;
use dreamjob_core::Landing;
use dreamjob_types::EffectsConfig;
use tracing::info;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::AddEventListenerOptions;

pub use host::WebHost;

static LOGGING: Once = Once::new();

fn init_logging(level: Level) {
    LOGGING.call_once(|| {
        // The page may already have installed a subscriber
        let _ = dioxus_logger::init(level);
    });
}

/// Handle the page script holds on to.
#[wasm_bindgen]
#[derive(Default)]
pub struct LandingPage {
    landing: Option<Landing<WebHost>>,
}

#[wasm_bindgen]
impl LandingPage {
    #[wasm_bindgen(constructor)]
    pub fn new() -> LandingPage {
        Self::default()
    }

    /// Mount with `window.__LANDING_CONFIG__`, falling back to defaults.
    pub fn mount(&mut self) -> Result<(), JsValue> {
        let parsed = config::from_page();
        init_logging(
            parsed
                .as_ref()
                .map(config::log_level)
                .unwrap_or(Level::INFO),
        );
        self.start(config::or_default(parsed))
    }

    /// Mount with an explicit config object. A malformed config is an error.
    #[wasm_bindgen(js_name = mountWithConfig)]
    pub fn mount_with_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config = config::from_js(config)?;
        init_logging(config::log_level(&config));
        self.start(config)
    }

    fn start(&mut self, config: EffectsConfig) -> Result<(), JsValue> {
        let host = WebHost::new().ok_or_else(|| JsValue::from_str("no browser window"))?;
        if let Some(previous) = self.landing.take() {
            previous.destroy();
        }
        self.landing = Some(Landing::mount(Rc::new(host), &config));
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.landing.is_some()
    }

    #[wasm_bindgen(js_name = scrollToSection)]
    pub fn scroll_to_section(&self, selector: &str) -> bool {
        self.landing
            .as_ref()
            .is_some_and(|landing| landing.scroll_to_section(selector))
    }

    #[wasm_bindgen(js_name = handleResize)]
    pub fn handle_resize(&self) {
        if let Some(landing) = &self.landing {
            landing.handle_resize();
        }
    }

    pub fn destroy(&mut self) {
        if let Some(landing) = self.landing.take() {
            landing.destroy();
            info!("Landing page unmounted");
        }
    }
}

impl Drop for LandingPage {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Wait for the DOM, then mount with the page config.
#[wasm_bindgen(js_name = startLandingPage)]
pub async fn start_landing_page() -> Result<LandingPage, JsValue> {
    dom_ready().await?;
    let mut page = LandingPage::new();
    page.mount()?;
    Ok(page)
}

async fn dom_ready() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.ready_state() != "loading" {
        return Ok(());
    }

    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        let _ = document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            &resolve,
            &options,
        );
    });
    JsFuture::from(promise).await?;
    Ok(())
}
