//! Attribute Flattening
//!
//! Turns the nested model-attribute tree returned by the backend into the
//! dotted paths offered as suggestions.

use serde_json::{Map, Value};

/// Flatten an attribute tree into dotted paths using recursive DFS
///
/// Each key is emitted before its descendants, siblings keep their order.
/// Any non-empty object is descended into, including one-key metadata
/// objects like `{"type": "string"}`.
pub fn flatten_attributes(attrs: &Map<String, Value>, prefix: Option<&str>) -> Vec<String> {
    fn collect(attrs: &Map<String, Value>, prefix: Option<&str>, result: &mut Vec<String>) {
        for (key, value) in attrs {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, key),
                None => key.clone(),
            };
            result.push(path.clone());
            if let Some(children) = value.as_object().filter(|m| !m.is_empty()) {
                collect(children, Some(&path), result);
            }
        }
    }

    let mut result = Vec::new();
    collect(attrs, prefix.filter(|p| !p.is_empty()), &mut result);
    result
}
