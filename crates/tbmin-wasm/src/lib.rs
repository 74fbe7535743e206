//! WASM bindings for the tbminifier engine.
//!
//! Exposes `minifyHtml()`, `minifyJs()`, `minifyCss()` and `report()` to
//! JavaScript via wasm-bindgen. Options are plain JS objects in the shape
//! of `MinifyConfig` (camelCase keys, every key optional); the embedded
//! policy is an array such as `["cssMinifier", "jsMinifier"]`.

use tbmin_minify::{Capability, EmbeddedPolicy, Language, Minified, MinifyConfig};
use wasm_bindgen::prelude::*;

/// Minify an HTML document.
///
/// `policy` defaults to every embedded minifier; `config` to the defaults.
/// Throws a JS error if either option cannot be read.
#[wasm_bindgen(js_name = minifyHtml)]
pub fn minify_html(source: &str, policy: JsValue, config: JsValue) -> Result<String, JsError> {
    let policy = read_policy(policy)?;
    let config = read_config(config)?;
    Ok(tbmin_minify::minify_html_with(source, policy, &config))
}

#[wasm_bindgen(js_name = minifyJs)]
pub fn minify_js(source: &str, config: JsValue) -> Result<String, JsError> {
    let config = read_config(config)?;
    Ok(tbmin_minify::minify_js_with(source, &config))
}

#[wasm_bindgen(js_name = minifyCss)]
pub fn minify_css(source: &str, config: JsValue) -> Result<String, JsError> {
    let config = read_config(config)?;
    Ok(tbmin_minify::minify_css_with(source, &config))
}

/// Minify and report what had to be passed through verbatim.
///
/// Returns a JS object `{ output: string, diagnostics: string[] }`.
/// Throws if `language` is unknown or the minifier itself failed.
#[wasm_bindgen]
pub fn report(language: &str, source: &str, config: JsValue) -> Result<JsValue, JsError> {
    let config = read_config(config)?;
    let minified = native_report(language, source, &config)?;

    let diagnostics = js_sys::Array::new();
    for message in diagnostic_messages(&minified) {
        diagnostics.push(&message.into());
    }

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"output".into(), &minified.output.into())
        .map_err(|_| JsError::new("Failed to set output property"))?;
    js_sys::Reflect::set(&js_obj, &"diagnostics".into(), &diagnostics.into())
        .map_err(|_| JsError::new("Failed to set diagnostics property"))?;

    Ok(js_obj.into())
}

/// Get the engine version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

fn read_config(value: JsValue) -> Result<MinifyConfig, JsError> {
    if is_absent(&value) {
        return Ok(MinifyConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid config: {e}")))
}

fn read_policy(value: JsValue) -> Result<EmbeddedPolicy, JsError> {
    if is_absent(&value) {
        return Ok(EmbeddedPolicy::ALL);
    }
    let capabilities: Vec<Capability> = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Invalid policy: {e}")))?;
    Ok(capabilities.into_iter().collect())
}

/// Everything `report` does that does not touch JS values.
fn native_report(language: &str, source: &str, config: &MinifyConfig) -> Result<Minified, JsError> {
    let language: Language = language.parse().map_err(|e: String| JsError::new(&e))?;
    tbmin_minify::try_minify(language, source, EmbeddedPolicy::ALL, config)
        .map_err(|e| JsError::new(&e.to_string()))
}

fn diagnostic_messages(minified: &Minified) -> Vec<String> {
    minified
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect()
}
