use dioxus_logger::tracing::Level;
use dreamjob_types::EffectsConfig;
use tracing::warn;
use wasm_bindgen::JsValue;

use crate::utils::js_get;

/// Global the page can set before the module loads.
pub const PAGE_CONFIG_KEY: &str = "__LANDING_CONFIG__";

/// Deserialize a config object. `undefined`/`null` mean defaults; missing
/// fields fall back to their defaults.
pub fn from_js(value: JsValue) -> Result<EffectsConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(EffectsConfig::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| JsValue::from_str(&format!("invalid landing config: {err}")))
}

/// Config from `window.__LANDING_CONFIG__`; defaults when it is absent.
pub fn from_page() -> Result<EffectsConfig, JsValue> {
    match web_sys::window().and_then(|window| js_get(&window, PAGE_CONFIG_KEY)) {
        Some(value) => from_js(value),
        None => Ok(EffectsConfig::default()),
    }
}

/// Fall back to defaults on a malformed config. Call after logging is up.
pub fn or_default(config: Result<EffectsConfig, JsValue>) -> EffectsConfig {
    config.unwrap_or_else(|err| {
        warn!(?err, "Ignoring landing config");
        EffectsConfig::default()
    })
}

pub fn log_level(config: &EffectsConfig) -> Level {
    match config.log_level.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
