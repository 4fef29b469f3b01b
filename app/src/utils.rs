use wasm_bindgen::JsValue;

/// Read `obj[key]`, treating `undefined` and `null` as absent.
pub fn js_get(obj: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// Whether `key in obj`.
pub fn js_has(obj: &JsValue, key: &str) -> bool {
    js_sys::Reflect::has(obj, &JsValue::from_str(key)).unwrap_or(false)
}

/// Drop `value` on a later turn of the event loop.
///
/// Closures handed to JS must not be freed while they are running, and a
/// listener or timer can be cancelled from inside its own callback.
pub fn defer_drop<T: 'static>(value: T) {
    wasm_bindgen_futures::spawn_local(async move {
        drop(value);
    });
}
