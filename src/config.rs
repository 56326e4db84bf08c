//! Page Configuration
//!
//! Element ids, selectors and the schema endpoint, read once at boot.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use wasm_bindgen::JsCast;

use crate::console;
use crate::registry::ParamField;

/// Id of an optional `<script type="application/json">` block overriding defaults
pub const CONFIG_SCRIPT_ID: &str = "signal-form-config";

/// Which inputs receive suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Every param input of the repeatable section, tracked by the registry
    #[default]
    Formset,
    /// Only the first row's `param_1` input, refreshed on content type change
    SingleInput,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Schema endpoint template; empty disables the feature
    pub model_attrs_url: String,
    /// Hidden field holding the endpoint template
    pub model_attrs_url_field_id: String,
    /// Token in the template replaced by the selected content type id
    pub content_type_placeholder: String,
    pub content_type_select_id: String,
    /// Formset prefix used in row field names (`{prefix}-{row}-param_1`)
    pub formset_prefix: String,
    pub add_row_selector: String,
    pub delete_button_selector: String,
    /// Wait before scanning, the admin inlines render after load
    pub boot_delay_ms: u32,
    pub mode: InputMode,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            model_attrs_url: String::new(),
            model_attrs_url_field_id: "model_attrs_api_url".to_string(),
            content_type_placeholder: "<content_type_id>".to_string(),
            content_type_select_id: "id_content_type".to_string(),
            formset_prefix: "constraints".to_string(),
            add_row_selector: ".add-row a".to_string(),
            delete_button_selector: ".inline-deletelink".to_string(),
            boot_delay_ms: 500,
            mode: InputMode::Formset,
        }
    }
}

impl PageConfig {
    /// Parse overrides from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Read the config block (if any) and the endpoint field from the page
    pub fn from_document(document: &web_sys::Document) -> Self {
        let mut config = document
            .get_element_by_id(CONFIG_SCRIPT_ID)
            .and_then(|el| el.text_content())
            .map(|json| {
                Self::from_json(&json).unwrap_or_else(|e| {
                    console::warn(&format!("[Config] Ignoring {}: {}", CONFIG_SCRIPT_ID, e));
                    Self::default()
                })
            })
            .unwrap_or_default();

        if let Some(url) = document
            .get_element_by_id(&config.model_attrs_url_field_id)
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
            .map(|field| field.value())
        {
            config.model_attrs_url = url;
        }
        config
    }

    pub fn is_enabled(&self) -> bool {
        !self.model_attrs_url.is_empty()
    }

    pub fn total_forms_id(&self) -> String {
        format!("id_{}-TOTAL_FORMS", self.formset_prefix)
    }

    pub fn param_input_id(&self, row: usize, field: ParamField) -> String {
        format!("id_{}", self.param_input_name(row, field))
    }

    pub fn param_input_name(&self, row: usize, field: ParamField) -> String {
        format!("{}-{}-{}", self.formset_prefix, row, field.as_str())
    }

    /// Schema URL for a content type; only the first placeholder is replaced
    pub fn attrs_url(&self, content_type_id: &str) -> String {
        let encoded = utf8_percent_encode(content_type_id, NON_ALPHANUMERIC).to_string();
        self.model_attrs_url
            .replacen(&self.content_type_placeholder, &encoded, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_admin_page() {
        let config = PageConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.total_forms_id(), "id_constraints-TOTAL_FORMS");
        assert_eq!(config.param_input_id(2, ParamField::Second), "id_constraints-2-param_2");
        assert_eq!(config.param_input_name(0, ParamField::First), "constraints-0-param_1");
    }

    #[test]
    fn test_attrs_url_replaces_first_placeholder() {
        let config = PageConfig {
            model_attrs_url: "/signals/<content_type_id>/attrs/<content_type_id>".to_string(),
            ..Default::default()
        };
        assert!(config.is_enabled());
        assert_eq!(config.attrs_url("12"), "/signals/12/attrs/<content_type_id>");
    }

    #[test]
    fn test_attrs_url_encodes_id() {
        let config = PageConfig {
            model_attrs_url: "/attrs/<content_type_id>/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.attrs_url("a b/c"), "/attrs/a%20b%2Fc/");
        assert_eq!(config.attrs_url(""), "/attrs//");
    }

    #[test]
    fn test_from_json_overrides() {
        let config = PageConfig::from_json(r#"{"formset_prefix": "rules", "mode": "single_input"}"#).unwrap();
        assert_eq!(config.formset_prefix, "rules");
        assert_eq!(config.mode, InputMode::SingleInput);
        assert_eq!(config.boot_delay_ms, 500);
        assert_eq!(config.total_forms_id(), "id_rules-TOTAL_FORMS");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(PageConfig::from_json("{not json").is_err());
        assert!(PageConfig::from_json(r#"{"mode": "grid"}"#).is_err());
    }
}
