//! Schema API
//!
//! Fetches the model attribute tree for a content type.

use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Readable message for a rejected promise or thrown JS value
pub fn js_error(value: JsValue) -> String {
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => format!("{:?}", value),
    }
}

/// GET the attribute tree; non-2xx, bad JSON and non-object bodies are errors
pub async fn fetch_model_attrs(url: &str) -> Result<Map<String, Value>, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response = JsFuture::from(window.fetch_with_str(url)).await.map_err(js_error)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(format!("GET {} returned {}", url, response.status()));
    }
    let json = JsFuture::from(response.json().map_err(js_error)?).await.map_err(js_error)?;
    let value: Value = serde_wasm_bindgen::from_value(json).map_err(|e| e.to_string())?;
    into_attrs(value)
}

/// The response body must be an object at the top level
pub fn into_attrs(value: Value) -> Result<Map<String, Value>, String> {
    match value {
        Value::Object(attrs) => Ok(attrs),
        other => Err(format!("expected an attribute object, got {}", kind(&other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
