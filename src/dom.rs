//! Web Form Access
//!
//! `FormDom` over the real admin page.

use std::rc::Rc;

use leptos_autocomplete::{AutocompleteSet, EventListener};
use wasm_bindgen::JsCast;

use crate::config::PageConfig;
use crate::controller::OptionSink;
use crate::registry::{FormDom, ParamField};

pub struct WebForm {
    document: web_sys::Document,
    config: Rc<PageConfig>,
}

impl WebForm {
    pub fn new(document: web_sys::Document, config: Rc<PageConfig>) -> Self {
        Self { document, config }
    }

    fn element<T: JsCast>(&self, id: &str) -> Option<T> {
        self.document.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn select_one(&self, selector: &str) -> Option<web_sys::Element> {
        self.document.query_selector(selector).ok().flatten()
    }
}

/// Run `handler` in a microtask queued by this listener
///
/// The microtask runs as soon as this callback returns, before any listener
/// bound after ours. The formset's add/delete handlers are bound by the admin
/// script before the boot delay ends, so they have already run by then.
fn deferred(handler: Rc<dyn Fn()>) -> impl FnMut(web_sys::Event) + 'static {
    move |_: web_sys::Event| {
        let handler = handler.clone();
        wasm_bindgen_futures::spawn_local(async move { handler() });
    }
}

impl FormDom for WebForm {
    type Input = web_sys::HtmlInputElement;
    type Button = web_sys::HtmlElement;
    type Listener = EventListener;

    fn row_count(&self) -> Option<usize> {
        let field: web_sys::HtmlInputElement = self.element(&self.config.total_forms_id())?;
        field.value().trim().parse().ok()
    }

    fn param_input(&self, row: usize, field: ParamField) -> Option<Self::Input> {
        self.element(&self.config.param_input_id(row, field))
    }

    fn input_name(&self, input: &Self::Input) -> String {
        input.name()
    }

    fn delete_buttons(&self) -> Vec<Self::Button> {
        let Ok(nodes) = self.document.query_selector_all(&self.config.delete_button_selector) else {
            return vec![];
        };
        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
            .collect()
    }

    fn on_delete_click(&self, button: &Self::Button, handler: Rc<dyn Fn()>) -> Self::Listener {
        EventListener::new(button, "click", deferred(handler))
    }

    fn on_add_row(&self, handler: Rc<dyn Fn()>) -> Option<Self::Listener> {
        let control = self.select_one(&self.config.add_row_selector)?;
        Some(EventListener::new(&control, "click", deferred(handler)))
    }

    fn on_content_type_change(&self, handler: Rc<dyn Fn()>) -> Option<Self::Listener> {
        let select: web_sys::HtmlSelectElement = self.element(&self.config.content_type_select_id)?;
        Some(EventListener::new(&select, "change", deferred(handler)))
    }

    fn content_type_id(&self) -> Option<String> {
        let select: web_sys::HtmlSelectElement = self.element(&self.config.content_type_select_id)?;
        Some(select.value())
    }
}

impl OptionSink<web_sys::HtmlInputElement> for AutocompleteSet {
    fn install(&mut self, input: &web_sys::HtmlInputElement, options: &[String]) -> Result<(), String> {
        AutocompleteSet::install(self, input, options)
    }

    fn retain(&mut self, live: &[web_sys::HtmlInputElement]) {
        let dropped = self.retain_inputs(live);
        if dropped > 0 {
            crate::console::log(&format!("[Autocomplete] Released {} widgets", dropped));
        }
    }
}
